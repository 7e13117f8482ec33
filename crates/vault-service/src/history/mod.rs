//! Version history engine and its request/result types.

pub mod engine;
pub mod types;
