//! In-memory metadata store for tests and embedded use.
//!
//! Mirrors the PostgreSQL adapter's semantics exactly — including the
//! compare-and-swap behavior the engine's ordering guarantee depends on —
//! over a guarded map, so engine tests run without a live database.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use vault_core::digest;
use vault_core::result::AppResult;
use vault_core::types::filter::SearchFilter;
use vault_core::types::pagination::{PageRequest, PageResponse};
use vault_core::types::sorting::{SortDirection, SortField};
use vault_core::types::FileId;
use vault_core::AppError;
use vault_entity::LogicalFile;

use crate::store::{sort_column, MetadataStore};

/// Metadata store over a guarded in-memory map.
#[derive(Debug, Default)]
pub struct MemoryMetadataStore {
    files: RwLock<HashMap<Uuid, LogicalFile>>,
}

impl MemoryMetadataStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records, active or not.
    pub async fn len(&self) -> usize {
        self.files.read().await.len()
    }

    /// Whether the store holds no records.
    pub async fn is_empty(&self) -> bool {
        self.files.read().await.is_empty()
    }

    fn matches(filter: &SearchFilter, file: &LogicalFile) -> bool {
        if let Some(text) = filter.text.as_deref().filter(|t| !t.trim().is_empty()) {
            let needle = text.trim().to_lowercase();
            let in_name = file.original_file_name.to_lowercase().contains(&needle);
            let in_description = file.description.to_lowercase().contains(&needle);
            if !in_name && !in_description {
                return false;
            }
        }
        if let Some(owner) = filter.owner.as_deref().filter(|o| !o.trim().is_empty()) {
            if file.owner != owner.trim() {
                return false;
            }
        }
        let tags: Vec<&str> = filter
            .tags
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect();
        if !tags.is_empty() && !tags.iter().any(|t| file.tags.contains(*t)) {
            return false;
        }
        true
    }

    fn sort_and_page(
        mut files: Vec<LogicalFile>,
        page: &PageRequest,
        sort: &SortField,
    ) -> AppResult<PageResponse<LogicalFile>> {
        let column = sort_column(&sort.field)?;
        files.sort_by(|a, b| {
            let ordering = match column {
                "file_name" => a.original_file_name.cmp(&b.original_file_name),
                "owner_name" => a.owner.cmp(&b.owner),
                "created_at" => a.created_at.cmp(&b.created_at),
                _ => a.updated_at.cmp(&b.updated_at),
            };
            match sort.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });

        let total = files.len() as u64;
        let start = (page.offset() as usize).min(files.len());
        let end = (start + page.limit() as usize).min(files.len());
        let items = files[start..end].to_vec();

        Ok(PageResponse::new(items, page.page, page.page_size, total))
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }

    async fn insert(&self, file: &LogicalFile) -> AppResult<()> {
        let mut files = self.files.write().await;
        if files.contains_key(file.id.as_uuid()) {
            return Err(AppError::duplicate_key(format!(
                "file id {} already exists",
                file.id
            )));
        }
        files.insert(file.id.into_uuid(), file.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: FileId) -> AppResult<Option<LogicalFile>> {
        Ok(self.files.read().await.get(id.as_uuid()).cloned())
    }

    async fn find_active_by_hash(&self, content_hash: &str) -> AppResult<Option<LogicalFile>> {
        let hash = digest::normalize(content_hash);
        Ok(self
            .files
            .read()
            .await
            .values()
            .find(|f| f.is_active && f.version_with_hash(&hash).is_some())
            .cloned())
    }

    async fn find_by_owner(
        &self,
        owner: &str,
        page: &PageRequest,
        sort: &SortField,
    ) -> AppResult<PageResponse<LogicalFile>> {
        let files: Vec<LogicalFile> = self
            .files
            .read()
            .await
            .values()
            .filter(|f| f.is_active && f.owner == owner)
            .cloned()
            .collect();
        Self::sort_and_page(files, page, sort)
    }

    async fn search(
        &self,
        filter: &SearchFilter,
        page: &PageRequest,
        sort: &SortField,
    ) -> AppResult<PageResponse<LogicalFile>> {
        filter.validate()?;
        let files: Vec<LogicalFile> = self
            .files
            .read()
            .await
            .values()
            .filter(|f| f.is_active && Self::matches(filter, f))
            .cloned()
            .collect();
        Self::sort_and_page(files, page, sort)
    }

    async fn compare_and_swap(
        &self,
        expected_revision: i64,
        file: &LogicalFile,
    ) -> AppResult<bool> {
        let mut files = self.files.write().await;
        match files.get_mut(file.id.as_uuid()) {
            Some(stored) if stored.revision == expected_revision => {
                *stored = file.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
