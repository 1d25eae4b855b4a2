pub mod palette;
pub mod tools;
