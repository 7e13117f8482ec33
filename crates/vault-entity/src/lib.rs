//! # vault-entity
//!
//! Domain entity records for FileVault. Every struct in this crate is plain
//! data with `Debug`, `Clone`, `Serialize`, and `Deserialize` derives.
//! Records carry read-only accessors only; all mutation goes through the
//! version history engine in `vault-service`.

pub mod file;

pub use file::{FileVersion, LogicalFile};
