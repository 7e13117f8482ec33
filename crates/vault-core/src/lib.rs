//! # vault-core
//!
//! Core crate for FileVault. Contains the adapter traits, configuration
//! schemas, typed identifiers, content digest helpers, pagination/sorting/
//! search-filter types, and the unified error system.
//!
//! This crate has **no** internal dependencies on other FileVault crates.

pub mod config;
pub mod digest;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
