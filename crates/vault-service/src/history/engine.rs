//! The version history engine.
//!
//! Orchestrates the content store and the metadata store to provide the
//! logical-file model: content-hash dedup, contiguous version numbering,
//! integrity verification, soft deletion, and search. Adapters are injected
//! at construction; their lifecycle belongs to the process entry point.
//!
//! Per-file ordering comes from optimistic compare-and-swap on the record's
//! revision token, retried a bounded number of times. There are no locks:
//! different files never contend, and a lost race on one file is re-run
//! against a fresh read so version numbers stay contiguous.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use vault_core::config::content_store::ContentStoreConfig;
use vault_core::config::EngineConfig;
use vault_core::digest;
use vault_core::error::{AppError, ErrorKind};
use vault_core::result::AppResult;
use vault_core::traits::content_store::{ContentStore, StoredObject};
use vault_core::types::filter::SearchFilter;
use vault_core::types::pagination::{PageRequest, PageResponse};
use vault_core::types::sorting::SortField;
use vault_core::types::FileId;
use vault_database::MetadataStore;
use vault_entity::{FileVersion, LogicalFile};

use crate::history::types::{CreateFileRequest, VerificationResult, VersionSelector};

/// Manages logical files and their append-only version histories.
#[derive(Debug, Clone)]
pub struct VersionHistoryEngine {
    /// Metadata store adapter.
    metadata: Arc<dyn MetadataStore>,
    /// Content store adapter.
    content: Arc<dyn ContentStore>,
    /// Engine tuning (retry bounds).
    config: EngineConfig,
    /// Bounded wait for any single content-store call.
    content_timeout: Duration,
}

impl VersionHistoryEngine {
    /// Create a new engine over injected store adapters.
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        content: Arc<dyn ContentStore>,
        config: EngineConfig,
        content_store: &ContentStoreConfig,
    ) -> Self {
        Self {
            metadata,
            content,
            config,
            content_timeout: content_store.operation_timeout(),
        }
    }

    /// Create a logical file from its first payload.
    ///
    /// Fails with `DuplicateContent` (carrying the conflicting file id) when
    /// any active file anywhere already holds a version with this payload's
    /// hash — checked before the content store is touched, so a rejected
    /// upload stores nothing.
    pub async fn create_file(&self, req: CreateFileRequest) -> AppResult<LogicalFile> {
        let owner = non_blank(&req.owner, "owner")?;
        let file_name = non_blank(&req.original_file_name, "original_file_name")?;

        let content_hash = digest::sha256_hex(&req.payload);
        if let Some(existing) = self.metadata.find_active_by_hash(&content_hash).await? {
            return Err(AppError::duplicate_content(existing.id.into_uuid()));
        }

        let stored = self.put_content(&req.payload).await?;
        let now = Utc::now();
        let version = FileVersion {
            version_number: 1,
            content_hash,
            storage_address: stored.address,
            file_size: stored.size,
            mime_type: req.mime_type,
            uploaded_by: owner.clone(),
            uploaded_at: now,
        };

        let tags: BTreeSet<String> = req
            .tags
            .iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        for attempt in 1..=self.config.id_generation_attempts {
            let file = LogicalFile {
                id: FileId::new(),
                original_file_name: file_name.clone(),
                owner: owner.clone(),
                description: req.description.trim().to_string(),
                tags: tags.clone(),
                is_active: true,
                versions: vec![version.clone()],
                revision: 1,
                created_at: now,
                updated_at: now,
            };

            match self.metadata.insert(&file).await {
                Ok(()) => {
                    info!(
                        file_id = %file.id,
                        owner = %file.owner,
                        size = version.file_size,
                        "File created"
                    );
                    return Ok(file);
                }
                Err(e) if e.kind == ErrorKind::DuplicateKey => {
                    warn!(attempt, "File id collided, regenerating");
                    continue;
                }
                // The blob is already pinned; content addressing makes the
                // orphan harmless and reusable, so no compensating delete.
                Err(e) => return Err(e),
            }
        }

        Err(AppError::id_generation_exhausted(format!(
            "gave up after {} id generation attempts",
            self.config.id_generation_attempts
        )))
    }

    /// Append a new version to an active logical file.
    ///
    /// Fails `DuplicateVersion` (carrying the existing version number) when
    /// the payload is byte-identical to any version already in this file.
    /// Lost compare-and-swap races are retried internally against a fresh
    /// read; after the bounded attempts the conflict surfaces as
    /// `ConcurrentModification`, which the caller may retry.
    pub async fn append_version(
        &self,
        file_id: FileId,
        uploaded_by: &str,
        payload: Bytes,
        mime_type: Option<String>,
    ) -> AppResult<FileVersion> {
        let uploaded_by = non_blank(uploaded_by, "uploaded_by")?;
        let content_hash = digest::sha256_hex(&payload);
        let mut stored: Option<StoredObject> = None;

        for attempt in 1..=self.config.persist_retry_attempts {
            let mut file = self.active_file(file_id).await?;

            if let Some(existing) = file.version_with_hash(&content_hash) {
                return Err(AppError::duplicate_version(existing.version_number));
            }

            // Push the payload once; retries of a lost race reuse the
            // address since identical bytes pin to the same blob.
            let object = match &stored {
                Some(object) => object.clone(),
                None => {
                    let object = self.put_content(&payload).await?;
                    stored = Some(object.clone());
                    object
                }
            };

            let version = FileVersion {
                version_number: file.next_version_number(),
                content_hash: content_hash.clone(),
                storage_address: object.address,
                file_size: object.size,
                mime_type: mime_type.clone(),
                uploaded_by: uploaded_by.clone(),
                uploaded_at: Utc::now(),
            };

            let expected = file.revision;
            file.versions.push(version.clone());
            file.updated_at = version.uploaded_at;
            file.revision = expected + 1;

            if self.metadata.compare_and_swap(expected, &file).await? {
                info!(
                    file_id = %file_id,
                    version = version.version_number,
                    uploaded_by = %version.uploaded_by,
                    "Version appended"
                );
                return Ok(version);
            }

            debug!(file_id = %file_id, attempt, "Lost append race, refetching");
        }

        Err(AppError::concurrent_modification(format!(
            "append to file {file_id} kept losing the persist race after {} attempts",
            self.config.persist_retry_attempts
        )))
    }

    /// Resolve a version of a file by number or `latest`.
    pub fn resolve_version<'a>(
        &self,
        file: &'a LogicalFile,
        selector: VersionSelector,
    ) -> AppResult<&'a FileVersion> {
        let version = match selector {
            VersionSelector::Latest => file.latest_version(),
            VersionSelector::Number(n) => file.version(n),
        };
        // An empty version list violates the data model, but resolution
        // still answers it with a plain not-found.
        version.ok_or_else(|| {
            AppError::not_found(format!("file {} has no version {selector}", file.id))
        })
    }

    /// Re-fetch a version's payload and check it against the recorded
    /// digest and size. Mismatches are results; only a failed fetch errors.
    pub async fn verify_integrity(&self, version: &FileVersion) -> AppResult<VerificationResult> {
        let payload = self.get_content(&version.storage_address).await?;
        let recomputed_hash = digest::sha256_hex(&payload);

        Ok(VerificationResult {
            matches: digest::digests_match(&recomputed_hash, &version.content_hash),
            sizes_match: payload.len() as u64 == version.file_size,
            recomputed_hash,
        })
    }

    /// Soft-delete a file owned by `claimed_owner`.
    ///
    /// Ownership mismatch, absence, and prior deletion are deliberately
    /// indistinguishable: all answer `NotFound`, so callers cannot probe for
    /// files they do not own, and retry loops treat the second delete as
    /// nothing to do.
    pub async fn soft_delete(&self, file_id: FileId, claimed_owner: &str) -> AppResult<()> {
        // Owners are stored trimmed, so the claimed identity must be
        // compared the same way.
        let claimed_owner = claimed_owner.trim();
        for attempt in 1..=self.config.persist_retry_attempts {
            let mut file = match self.metadata.find_by_id(file_id).await? {
                Some(f) if f.is_active && f.owner == claimed_owner => f,
                _ => return Err(AppError::not_found(format!("file {file_id} not found"))),
            };

            let expected = file.revision;
            file.is_active = false;
            file.updated_at = Utc::now();
            file.revision = expected + 1;

            if self.metadata.compare_and_swap(expected, &file).await? {
                info!(file_id = %file_id, owner = %claimed_owner, "File soft-deleted");
                return Ok(());
            }

            debug!(file_id = %file_id, attempt, "Lost delete race, refetching");
        }

        Err(AppError::concurrent_modification(format!(
            "delete of file {file_id} kept losing the persist race after {} attempts",
            self.config.persist_retry_attempts
        )))
    }

    /// Search active files. At least one filter must be populated.
    pub async fn search_files(
        &self,
        filter: &SearchFilter,
        page: &PageRequest,
        sort: &SortField,
    ) -> AppResult<PageResponse<LogicalFile>> {
        filter.validate()?;
        self.metadata.search(filter, page, sort).await
    }

    /// List an owner's active files.
    pub async fn list_by_owner(
        &self,
        owner: &str,
        page: &PageRequest,
        sort: &SortField,
    ) -> AppResult<PageResponse<LogicalFile>> {
        let owner = non_blank(owner, "owner")?;
        self.metadata.find_by_owner(&owner, page, sort).await
    }

    /// Fetch an active file by id.
    pub async fn get_file(&self, file_id: FileId) -> AppResult<LogicalFile> {
        self.active_file(file_id).await
    }

    /// Fetch a version's payload from the content store.
    pub async fn download(
        &self,
        file_id: FileId,
        selector: VersionSelector,
    ) -> AppResult<(FileVersion, Bytes)> {
        let file = self.active_file(file_id).await?;
        let version = self.resolve_version(&file, selector)?.clone();
        let payload = self.get_content(&version.storage_address).await?;
        Ok((version, payload))
    }

    /// Check both store adapters.
    pub async fn health_check(&self) -> AppResult<bool> {
        let metadata_ok = self.metadata.health_check().await?;
        let content_ok = self.content.health_check().await?;
        Ok(metadata_ok && content_ok)
    }

    async fn active_file(&self, file_id: FileId) -> AppResult<LogicalFile> {
        self.metadata
            .find_by_id(file_id)
            .await?
            .filter(|f| f.is_active)
            .ok_or_else(|| AppError::not_found(format!("file {file_id} not found")))
    }

    /// Store a payload within the bounded wait, validating the size the
    /// store reports against the payload we handed it.
    async fn put_content(&self, payload: &Bytes) -> AppResult<StoredObject> {
        let stored = match timeout(self.content_timeout, self.content.put(payload.clone())).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(AppError::store_timeout(format!(
                    "content store put exceeded {}s",
                    self.content_timeout.as_secs()
                )));
            }
        };

        if stored.size != payload.len() as u64 {
            return Err(AppError::storage_integrity(format!(
                "content store reported {} bytes for a {}-byte payload at {}",
                stored.size,
                payload.len(),
                stored.address
            )));
        }

        Ok(stored)
    }

    /// Fetch a payload within the bounded wait. Any fetch failure is
    /// `ContentUnavailable`; the timeout stays distinct and retryable.
    async fn get_content(&self, address: &str) -> AppResult<Bytes> {
        match timeout(self.content_timeout, self.content.get(address)).await {
            Ok(Ok(payload)) => Ok(payload),
            Ok(Err(e)) => Err(AppError::content_unavailable(format!(
                "content store fetch failed for {address}: {e}"
            ))),
            Err(_) => Err(AppError::store_timeout(format!(
                "content store get exceeded {}s for {address}",
                self.content_timeout.as_secs()
            ))),
        }
    }
}

fn non_blank(value: &str, field: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}
