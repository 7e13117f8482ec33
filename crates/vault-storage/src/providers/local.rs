//! Local filesystem content store.
//!
//! Blobs live in a sharded directory tree under the configured root:
//! `<root>/ab/cd/<full hash>` for a payload whose SHA-256 hex digest starts
//! with `abcd`. The relative sharded path is the storage address.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tracing::debug;

use vault_core::digest;
use vault_core::error::{AppError, ErrorKind};
use vault_core::result::AppResult;
use vault_core::traits::content_store::{ContentStore, StoredObject};

/// Content-addressed store over a local directory tree.
#[derive(Debug, Clone)]
pub struct LocalContentStore {
    /// Root directory for all stored blobs.
    root: PathBuf,
}

impl LocalContentStore {
    /// Create a new local content store rooted at the given path.
    pub async fn new(root_path: &str) -> AppResult<Self> {
        let root = PathBuf::from(root_path);
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create blob root: {}", root.display()),
                e,
            )
        })?;
        Ok(Self { root })
    }

    /// Sharded relative path for a digest, used as the storage address.
    fn address_for(hash: &str) -> String {
        format!("{}/{}/{}", &hash[..2], &hash[2..4], hash)
    }

    /// Resolve an address to an absolute path, refusing traversal segments.
    fn resolve(&self, address: &str) -> AppResult<PathBuf> {
        let clean = address.trim_start_matches('/');
        if clean.split('/').any(|seg| seg == ".." || seg.is_empty()) {
            return Err(AppError::validation(format!(
                "malformed storage address: {address}"
            )));
        }
        Ok(self.root.join(clean))
    }

    /// Ensure the parent directory of a path exists.
    async fn ensure_parent(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to create shard directory: {}", parent.display()),
                    e,
                )
            })?;
        }
        Ok(())
    }
}

#[async_trait]
impl ContentStore for LocalContentStore {
    fn provider_type(&self) -> &str {
        "local"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(self.root.exists() && self.root.is_dir())
    }

    async fn put(&self, data: Bytes) -> AppResult<StoredObject> {
        let hash = digest::sha256_hex(&data);
        let address = Self::address_for(&hash);
        let full_path = self.resolve(&address)?;

        // Identical bytes hash to the same path; an existing blob is the
        // same blob, so the write can be skipped entirely.
        if fs::try_exists(&full_path).await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, "Failed to probe blob path", e)
        })? {
            let meta = fs::metadata(&full_path).await.map_err(|e| {
                AppError::with_source(ErrorKind::Storage, "Failed to stat existing blob", e)
            })?;
            debug!(address, size = meta.len(), "Blob already pinned");
            return Ok(StoredObject {
                address,
                size: meta.len(),
            });
        }

        self.ensure_parent(&full_path).await?;

        // Write through a uniquely named temp file and rename, so a
        // concurrent put of the same bytes never exposes a partial blob.
        let tmp = full_path.with_extension(format!("tmp-{}", uuid::Uuid::new_v4()));
        fs::write(&tmp, &data).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to write blob: {address}"),
                e,
            )
        })?;
        fs::rename(&tmp, &full_path).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to pin blob: {address}"),
                e,
            )
        })?;

        debug!(address, size = data.len(), "Blob pinned");
        Ok(StoredObject {
            address,
            size: data.len() as u64,
        })
    }

    async fn get(&self, address: &str) -> AppResult<Bytes> {
        let full_path = self.resolve(address)?;
        let data = fs::read(&full_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found(format!("Blob not found: {address}"))
            } else {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to read blob: {address}"),
                    e,
                )
            }
        })?;
        Ok(Bytes::from(data))
    }

    async fn exists(&self, address: &str) -> AppResult<bool> {
        let full_path = self.resolve(address)?;
        fs::try_exists(&full_path)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Storage, "Failed to probe blob path", e))
    }
}
