pub mod builtin;
pub mod types;
