//! Core traits defined in `vault-core` and implemented by adapter crates.

pub mod content_store;

pub use content_store::{ContentStore, StoredObject};
