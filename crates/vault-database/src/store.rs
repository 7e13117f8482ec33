//! The metadata store contract consumed by the version history engine.

use async_trait::async_trait;

use vault_core::result::AppResult;
use vault_core::types::filter::SearchFilter;
use vault_core::types::pagination::{PageRequest, PageResponse};
use vault_core::types::sorting::SortField;
use vault_core::types::FileId;
use vault_core::AppError;
use vault_entity::LogicalFile;

/// Narrow document-store interface over persisted [`LogicalFile`] records.
///
/// The store never mutates records on its own; it persists whatever document
/// the engine hands it, guarded by the `revision` token. For
/// [`compare_and_swap`](MetadataStore::compare_and_swap) the engine
/// pre-increments `file.revision`; the store persists the document only if
/// the stored revision still equals `expected_revision` and reports whether
/// it did. That is the whole ordering primitive — no per-file locks exist
/// anywhere.
#[async_trait]
pub trait MetadataStore: Send + Sync + std::fmt::Debug + 'static {
    /// Check whether the store is reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Insert a brand-new record. Fails with a duplicate-key error if the
    /// file id collides with an existing record.
    async fn insert(&self, file: &LogicalFile) -> AppResult<()>;

    /// Fetch a record by id, active or not.
    async fn find_by_id(&self, id: FileId) -> AppResult<Option<LogicalFile>>;

    /// Find the active file (if any) whose version list contains the given
    /// content hash. Inactive files never match.
    async fn find_active_by_hash(&self, content_hash: &str) -> AppResult<Option<LogicalFile>>;

    /// List active files for an owner, paginated.
    async fn find_by_owner(
        &self,
        owner: &str,
        page: &PageRequest,
        sort: &SortField,
    ) -> AppResult<PageResponse<LogicalFile>>;

    /// Search active files by the validated filter, paginated.
    async fn search(
        &self,
        filter: &SearchFilter,
        page: &PageRequest,
        sort: &SortField,
    ) -> AppResult<PageResponse<LogicalFile>>;

    /// Persist `file` if the stored revision still equals
    /// `expected_revision`. Returns `false` when a concurrent writer got
    /// there first; the caller re-fetches and retries.
    async fn compare_and_swap(&self, expected_revision: i64, file: &LogicalFile)
        -> AppResult<bool>;
}

/// Map a logical sort field to a storable column name.
///
/// Only whitelisted fields ever reach a query; anything else is rejected
/// before SQL is built.
pub fn sort_column(field: &str) -> AppResult<&'static str> {
    match field {
        "name" | "file_name" => Ok("file_name"),
        "owner" => Ok("owner_name"),
        "created_at" => Ok("created_at"),
        "updated_at" => Ok("updated_at"),
        other => Err(AppError::validation(format!(
            "unsupported sort field: {other}"
        ))),
    }
}
