pub mod interpreter;
pub mod value;
