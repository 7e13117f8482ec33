//! # vault-storage
//!
//! Content-addressed storage providers for FileVault. The address of every
//! blob is derived from the SHA-256 digest of its bytes, which makes writes
//! idempotent: storing the same payload twice yields the same address and
//! touches the backend at most once.

pub mod providers;

pub use providers::local::LocalContentStore;
pub use providers::memory::MemoryContentStore;
