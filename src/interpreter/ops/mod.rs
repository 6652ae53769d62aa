pub mod binary;
pub mod compare;
pub mod unary;

// Operators are free functions over values; they never touch interpreter state
