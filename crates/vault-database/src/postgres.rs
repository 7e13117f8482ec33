//! PostgreSQL metadata store.
//!
//! Each [`LogicalFile`] is persisted whole as a JSONB `doc` column; the
//! remaining columns are denormalized copies maintained on every persist so
//! hash, owner, tag, and text queries stay indexable. The `revision` column
//! backs the compare-and-swap persist.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};

use vault_core::digest;
use vault_core::error::{AppError, ErrorKind};
use vault_core::result::AppResult;
use vault_core::types::filter::SearchFilter;
use vault_core::types::pagination::{PageRequest, PageResponse};
use vault_core::types::sorting::SortField;
use vault_core::types::FileId;
use vault_entity::LogicalFile;

use crate::store::{sort_column, MetadataStore};

/// Metadata store over a PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PgMetadataStore {
    pool: PgPool,
}

impl PgMetadataStore {
    /// Create a new store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Denormalized query columns derived from the document.
    fn columns(file: &LogicalFile) -> AppResult<(serde_json::Value, Vec<String>, Vec<String>)> {
        let doc = serde_json::to_value(file)?;
        let tags: Vec<String> = file.tags.iter().cloned().collect();
        let hashes: Vec<String> = file
            .versions
            .iter()
            .map(|v| digest::normalize(&v.content_hash))
            .collect();
        Ok((doc, tags, hashes))
    }

    fn decode(doc: serde_json::Value) -> AppResult<LogicalFile> {
        serde_json::from_value(doc).map_err(AppError::from)
    }

    async fn fetch_page(
        &self,
        mut count_qb: QueryBuilder<'_, Postgres>,
        mut select_qb: QueryBuilder<'_, Postgres>,
        page: &PageRequest,
        sort: &SortField,
    ) -> AppResult<PageResponse<LogicalFile>> {
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count files", e))?;

        let column = sort_column(&sort.field)?;
        select_qb.push(format!(" ORDER BY {column} {}", sort.direction.as_sql()));
        select_qb.push(" LIMIT ");
        select_qb.push_bind(page.limit() as i64);
        select_qb.push(" OFFSET ");
        select_qb.push_bind(page.offset() as i64);

        let rows = select_qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list files", e))?;

        let mut files = Vec::with_capacity(rows.len());
        for row in rows {
            let doc: serde_json::Value = row.try_get("doc").map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to read doc column", e)
            })?;
            files.push(Self::decode(doc)?);
        }

        Ok(PageResponse::new(
            files,
            page.page,
            page.page_size,
            total as u64,
        ))
    }

    /// Append the populated filter conditions to a WHERE clause that already
    /// restricts to active files.
    fn push_filter<'a>(qb: &mut QueryBuilder<'a, Postgres>, filter: &'a SearchFilter) {
        if let Some(text) = filter.text.as_deref().filter(|t| !t.trim().is_empty()) {
            let pattern = format!("%{}%", escape_like(text.trim()));
            qb.push(" AND (file_name ILIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" ESCAPE '\\' OR description ILIKE ");
            qb.push_bind(pattern);
            qb.push(" ESCAPE '\\')");
        }
        if let Some(owner) = filter.owner.as_deref().filter(|o| !o.trim().is_empty()) {
            qb.push(" AND owner_name = ");
            qb.push_bind(owner.trim().to_string());
        }
        let tags: Vec<String> = filter
            .tags
            .iter()
            .filter(|t| !t.trim().is_empty())
            .map(|t| t.trim().to_string())
            .collect();
        if !tags.is_empty() {
            // Array overlap: the file qualifies if it carries any of the tags.
            qb.push(" AND tags && ");
            qb.push_bind(tags);
        }
    }
}

#[async_trait]
impl MetadataStore for PgMetadataStore {
    async fn health_check(&self) -> AppResult<bool> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|v| v == 1)
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Health check failed", e))
    }

    async fn insert(&self, file: &LogicalFile) -> AppResult<()> {
        let (doc, tags, hashes) = Self::columns(file)?;

        sqlx::query(
            "INSERT INTO logical_files \
             (id, owner_name, file_name, description, tags, content_hashes, \
              is_active, revision, doc, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(file.id.into_uuid())
        .bind(&file.owner)
        .bind(&file.original_file_name)
        .bind(&file.description)
        .bind(&tags)
        .bind(&hashes)
        .bind(file.is_active)
        .bind(file.revision)
        .bind(&doc)
        .bind(file.created_at)
        .bind(file.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some("logical_files_pkey") =>
            {
                AppError::duplicate_key(format!("file id {} already exists", file.id))
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to insert file", e),
        })?;

        Ok(())
    }

    async fn find_by_id(&self, id: FileId) -> AppResult<Option<LogicalFile>> {
        let row = sqlx::query("SELECT doc FROM logical_files WHERE id = $1")
            .bind(id.into_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find file", e))?;

        match row {
            Some(row) => {
                let doc: serde_json::Value = row.try_get("doc").map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to read doc column", e)
                })?;
                Ok(Some(Self::decode(doc)?))
            }
            None => Ok(None),
        }
    }

    async fn find_active_by_hash(&self, content_hash: &str) -> AppResult<Option<LogicalFile>> {
        let row = sqlx::query(
            "SELECT doc FROM logical_files \
             WHERE is_active AND $1 = ANY(content_hashes) LIMIT 1",
        )
        .bind(digest::normalize(content_hash))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find file by hash", e)
        })?;

        match row {
            Some(row) => {
                let doc: serde_json::Value = row.try_get("doc").map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to read doc column", e)
                })?;
                Ok(Some(Self::decode(doc)?))
            }
            None => Ok(None),
        }
    }

    async fn find_by_owner(
        &self,
        owner: &str,
        page: &PageRequest,
        sort: &SortField,
    ) -> AppResult<PageResponse<LogicalFile>> {
        let mut count_qb = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM logical_files WHERE is_active AND owner_name = ",
        );
        count_qb.push_bind(owner.to_string());

        let mut select_qb = QueryBuilder::<Postgres>::new(
            "SELECT doc FROM logical_files WHERE is_active AND owner_name = ",
        );
        select_qb.push_bind(owner.to_string());

        self.fetch_page(count_qb, select_qb, page, sort).await
    }

    async fn search(
        &self,
        filter: &SearchFilter,
        page: &PageRequest,
        sort: &SortField,
    ) -> AppResult<PageResponse<LogicalFile>> {
        filter.validate()?;

        let mut count_qb =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM logical_files WHERE is_active");
        Self::push_filter(&mut count_qb, filter);

        let mut select_qb =
            QueryBuilder::<Postgres>::new("SELECT doc FROM logical_files WHERE is_active");
        Self::push_filter(&mut select_qb, filter);

        self.fetch_page(count_qb, select_qb, page, sort).await
    }

    async fn compare_and_swap(
        &self,
        expected_revision: i64,
        file: &LogicalFile,
    ) -> AppResult<bool> {
        let (doc, tags, hashes) = Self::columns(file)?;

        let result = sqlx::query(
            "UPDATE logical_files SET \
             owner_name = $3, file_name = $4, description = $5, tags = $6, \
             content_hashes = $7, is_active = $8, revision = $9, doc = $10, \
             updated_at = $11 \
             WHERE id = $1 AND revision = $2",
        )
        .bind(file.id.into_uuid())
        .bind(expected_revision)
        .bind(&file.owner)
        .bind(&file.original_file_name)
        .bind(&file.description)
        .bind(&tags)
        .bind(&hashes)
        .bind(file.is_active)
        .bind(file.revision)
        .bind(&doc)
        .bind(file.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to persist file", e))?;

        Ok(result.rows_affected() == 1)
    }
}

/// Escape `ILIKE` metacharacters in user-supplied text so a search for
/// `"50%"` matches the literal string instead of everything.
fn escape_like(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("plain"), "plain");
        assert_eq!(escape_like("50%_done"), "50\\%\\_done");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
    }
}
