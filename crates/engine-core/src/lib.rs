pub mod config;
pub mod decode;
pub mod error;
pub mod mapping;
pub mod planner;
pub mod progress;
pub mod retry;
pub mod scanner;
