//! Content store trait for pluggable content-addressed backends.

use async_trait::async_trait;
use bytes::Bytes;

use crate::result::AppResult;

/// The receipt for a stored payload: the content-derived address under which
/// the backend pinned it, and the size the backend reports for it.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StoredObject {
    /// Content-addressed handle used to retrieve the exact bytes later.
    pub address: String,
    /// Size in bytes as reported by the backend.
    pub size: u64,
}

/// Trait for content-addressed storage backends.
///
/// `put` is idempotent: storing byte-identical payloads returns the same
/// address, so retries and concurrent writers never duplicate data, and an
/// orphaned blob from an abandoned upload is reused by the next upload of
/// the same bytes. The trait is defined here in `vault-core` and implemented
/// in `vault-storage`.
#[async_trait]
pub trait ContentStore: Send + Sync + std::fmt::Debug + 'static {
    /// Return the provider type name (e.g., "local", "memory").
    fn provider_type(&self) -> &str;

    /// Check whether the backend is healthy and reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Store a payload and pin it durably, returning its content address.
    async fn put(&self, data: Bytes) -> AppResult<StoredObject>;

    /// Retrieve the exact bytes previously stored under an address.
    async fn get(&self, address: &str) -> AppResult<Bytes>;

    /// Check whether a payload exists under the given address.
    async fn exists(&self, address: &str) -> AppResult<bool>;
}
