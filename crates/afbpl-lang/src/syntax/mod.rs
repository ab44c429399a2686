pub mod line;
pub mod literal;
