pub mod condition;
pub mod dispatch;
pub mod engine;
pub mod patterns;
pub mod query;
pub mod value;
pub mod weighted;
