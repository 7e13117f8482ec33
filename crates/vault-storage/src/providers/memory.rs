//! In-memory content store for tests and embedded use.

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;

use vault_core::digest;
use vault_core::result::AppResult;
use vault_core::traits::content_store::{ContentStore, StoredObject};
use vault_core::AppError;

/// Content-addressed store over a concurrent in-memory map. The bare digest
/// hex is the storage address.
#[derive(Debug, Default)]
pub struct MemoryContentStore {
    blobs: DashMap<String, Bytes>,
}

impl MemoryContentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct blobs currently pinned.
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    /// Whether the store holds no blobs.
    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    /// Overwrite the bytes under an address without re-deriving it.
    ///
    /// Test hook for simulating backend corruption; a well-behaved backend
    /// can never disagree with the address it handed out.
    pub fn corrupt(&self, address: &str, data: Bytes) {
        self.blobs.insert(address.to_string(), data);
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    fn provider_type(&self) -> &str {
        "memory"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }

    async fn put(&self, data: Bytes) -> AppResult<StoredObject> {
        let address = digest::sha256_hex(&data);
        let size = data.len() as u64;
        self.blobs.entry(address.clone()).or_insert(data);
        Ok(StoredObject { address, size })
    }

    async fn get(&self, address: &str) -> AppResult<Bytes> {
        self.blobs
            .get(address)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AppError::not_found(format!("Blob not found: {address}")))
    }

    async fn exists(&self, address: &str) -> AppResult<bool> {
        Ok(self.blobs.contains_key(address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vault_core::error::ErrorKind;

    #[tokio::test]
    async fn test_roundtrip_and_idempotence() {
        let store = MemoryContentStore::new();

        let a = store.put(Bytes::from("payload")).await.unwrap();
        let b = store.put(Bytes::from("payload")).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(store.len(), 1);

        assert_eq!(store.get(&a.address).await.unwrap(), "payload");
    }

    #[tokio::test]
    async fn test_missing_blob() {
        let store = MemoryContentStore::new();
        let err = store.get("deadbeef").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert!(!store.exists("deadbeef").await.unwrap());
    }
}
