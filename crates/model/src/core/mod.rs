pub mod tagged;
pub mod value;
