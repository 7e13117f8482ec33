//! # vault-database
//!
//! Metadata store adapters for FileVault. A [`store::MetadataStore`] persists
//! whole [`vault_entity::LogicalFile`] documents behind a narrow interface:
//! generic CRUD, hash/owner/filter queries, and the compare-and-swap
//! primitive the version history engine relies on for per-file ordering.
//!
//! Two implementations are provided: PostgreSQL (JSONB document column with
//! denormalized query columns) and an in-memory store with identical
//! semantics for tests and embedded use.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod postgres;
pub mod store;

pub use connection::DatabasePool;
pub use memory::MemoryMetadataStore;
pub use postgres::PgMetadataStore;
pub use store::MetadataStore;
