//! # vault-service
//!
//! The version history engine: the single owner of all `LogicalFile`
//! mutation. Everything else — the stores below, the CLI above — either
//! persists documents verbatim or translates requests into the operations
//! defined here.

pub mod history;

pub use history::engine::VersionHistoryEngine;
pub use history::types::{CreateFileRequest, VerificationResult, VersionSelector};
