pub mod engine;
pub mod summary;
pub mod worker;

#[cfg(test)]
mod tests;
