pub mod error;
pub mod export;
pub mod sink;
pub mod source;
