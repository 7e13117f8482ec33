//! Integration tests for the version history engine against the in-memory
//! store adapters.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use vault_core::config::content_store::ContentStoreConfig;
use vault_core::config::EngineConfig;
use vault_core::digest;
use vault_core::error::ErrorKind;
use vault_core::result::AppResult;
use vault_core::traits::content_store::{ContentStore, StoredObject};
use vault_core::types::filter::SearchFilter;
use vault_core::types::pagination::{PageRequest, PageResponse};
use vault_core::types::sorting::SortField;
use vault_core::types::FileId;
use vault_core::AppError;
use vault_database::{MemoryMetadataStore, MetadataStore};
use vault_entity::LogicalFile;
use vault_service::{CreateFileRequest, VersionHistoryEngine, VersionSelector};
use vault_storage::MemoryContentStore;

struct Harness {
    engine: VersionHistoryEngine,
    metadata: Arc<MemoryMetadataStore>,
    content: Arc<MemoryContentStore>,
}

fn harness() -> Harness {
    harness_with(EngineConfig::default())
}

fn harness_with(config: EngineConfig) -> Harness {
    let metadata = Arc::new(MemoryMetadataStore::new());
    let content = Arc::new(MemoryContentStore::new());
    let engine = VersionHistoryEngine::new(
        metadata.clone(),
        content.clone(),
        config,
        &ContentStoreConfig::default(),
    );
    Harness {
        engine,
        metadata,
        content,
    }
}

fn engine_over(
    metadata: Arc<dyn MetadataStore>,
    content: Arc<dyn ContentStore>,
) -> VersionHistoryEngine {
    VersionHistoryEngine::new(
        metadata,
        content,
        EngineConfig::default(),
        &ContentStoreConfig::default(),
    )
}

/// Content store whose size report disagrees with what it was handed.
#[derive(Debug, Default)]
struct MisreportingContentStore;

#[async_trait]
impl ContentStore for MisreportingContentStore {
    fn provider_type(&self) -> &str {
        "misreporting"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }

    async fn put(&self, data: Bytes) -> AppResult<StoredObject> {
        Ok(StoredObject {
            address: digest::sha256_hex(&data),
            size: data.len() as u64 + 1,
        })
    }

    async fn get(&self, address: &str) -> AppResult<Bytes> {
        Err(AppError::not_found(format!("Blob not found: {address}")))
    }

    async fn exists(&self, _address: &str) -> AppResult<bool> {
        Ok(false)
    }
}

/// Content store that never answers within any reasonable wait.
#[derive(Debug, Default)]
struct StalledContentStore;

impl StalledContentStore {
    const STALL: Duration = Duration::from_secs(600);
}

#[async_trait]
impl ContentStore for StalledContentStore {
    fn provider_type(&self) -> &str {
        "stalled"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }

    async fn put(&self, data: Bytes) -> AppResult<StoredObject> {
        tokio::time::sleep(Self::STALL).await;
        Ok(StoredObject {
            address: digest::sha256_hex(&data),
            size: data.len() as u64,
        })
    }

    async fn get(&self, address: &str) -> AppResult<Bytes> {
        tokio::time::sleep(Self::STALL).await;
        Err(AppError::not_found(format!("Blob not found: {address}")))
    }

    async fn exists(&self, _address: &str) -> AppResult<bool> {
        Ok(false)
    }
}

/// Metadata store where every compare-and-swap loses, as if another writer
/// always got there first.
#[derive(Debug, Default)]
struct ContendedMetadataStore {
    inner: MemoryMetadataStore,
}

#[async_trait]
impl MetadataStore for ContendedMetadataStore {
    async fn health_check(&self) -> AppResult<bool> {
        self.inner.health_check().await
    }

    async fn insert(&self, file: &LogicalFile) -> AppResult<()> {
        self.inner.insert(file).await
    }

    async fn find_by_id(&self, id: FileId) -> AppResult<Option<LogicalFile>> {
        self.inner.find_by_id(id).await
    }

    async fn find_active_by_hash(&self, content_hash: &str) -> AppResult<Option<LogicalFile>> {
        self.inner.find_active_by_hash(content_hash).await
    }

    async fn find_by_owner(
        &self,
        owner: &str,
        page: &PageRequest,
        sort: &SortField,
    ) -> AppResult<PageResponse<LogicalFile>> {
        self.inner.find_by_owner(owner, page, sort).await
    }

    async fn search(
        &self,
        filter: &SearchFilter,
        page: &PageRequest,
        sort: &SortField,
    ) -> AppResult<PageResponse<LogicalFile>> {
        self.inner.search(filter, page, sort).await
    }

    async fn compare_and_swap(
        &self,
        _expected_revision: i64,
        _file: &LogicalFile,
    ) -> AppResult<bool> {
        Ok(false)
    }
}

fn upload(owner: &str, name: &str, payload: &str) -> CreateFileRequest {
    CreateFileRequest {
        owner: owner.to_string(),
        original_file_name: name.to_string(),
        payload: Bytes::from(payload.to_string()),
        mime_type: Some("text/plain".to_string()),
        description: String::new(),
        tags: BTreeSet::new(),
    }
}

fn assert_contiguous(file: &LogicalFile) {
    let numbers: Vec<u32> = file.versions.iter().map(|v| v.version_number).collect();
    let expected: Vec<u32> = (1..=file.versions.len() as u32).collect();
    assert_eq!(numbers, expected, "version numbers must be 1..=len");
}

#[tokio::test]
async fn test_create_then_verify_matches() {
    let h = harness();

    let file = h.engine.create_file(upload("alice", "a.txt", "payload")).await.unwrap();
    let version = h.engine.resolve_version(&file, VersionSelector::Latest).unwrap();

    let result = h.engine.verify_integrity(version).await.unwrap();
    assert!(result.matches);
    assert!(result.sizes_match);
    assert!(result.is_intact());
    assert_eq!(result.recomputed_hash, version.content_hash);
}

#[tokio::test]
async fn test_hello_world_scenario() {
    let h = harness();

    let file = h
        .engine
        .create_file(upload("alice", "greeting.txt", "hello world"))
        .await
        .unwrap();
    assert_eq!(file.versions.len(), 1);
    assert_eq!(file.latest_version().unwrap().file_size, 11);

    let v1 = h.engine.resolve_version(&file, VersionSelector::Number(1)).unwrap();
    assert!(digest::digests_match(&v1.content_hash, &digest::sha256_hex(b"hello world")));

    let v2 = h
        .engine
        .append_version(file.id, "alice", Bytes::from("hello world v2"), None)
        .await
        .unwrap();
    assert_eq!(v2.version_number, 2);

    let file = h.engine.get_file(file.id).await.unwrap();
    assert_eq!(file.versions.len(), 2);
    let latest = h.engine.resolve_version(&file, VersionSelector::Latest).unwrap();
    assert_eq!(latest.version_number, 2);
    assert_contiguous(&file);
}

#[tokio::test]
async fn test_latest_resolves_to_highest_numbered() {
    let h = harness();

    let file = h.engine.create_file(upload("alice", "a.txt", "v1")).await.unwrap();
    for i in 2..=5u32 {
        h.engine
            .append_version(file.id, "alice", Bytes::from(format!("v{i}")), None)
            .await
            .unwrap();
    }

    let file = h.engine.get_file(file.id).await.unwrap();
    let latest = h.engine.resolve_version(&file, VersionSelector::Latest).unwrap();
    let fifth = h.engine.resolve_version(&file, VersionSelector::Number(5)).unwrap();
    assert_eq!(latest.version_number, fifth.version_number);
    assert_eq!(latest.content_hash, fifth.content_hash);
    assert_contiguous(&file);
}

#[tokio::test]
async fn test_resolve_missing_version() {
    let h = harness();
    let file = h.engine.create_file(upload("alice", "a.txt", "v1")).await.unwrap();

    let err = h
        .engine
        .resolve_version(&file, VersionSelector::Number(9))
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_duplicate_content_rejected_globally() {
    let h = harness();

    let first = h.engine.create_file(upload("alice", "a.txt", "same bytes")).await.unwrap();

    // Different owner and filename; identical bytes.
    let err = h
        .engine
        .create_file(upload("bob", "b.txt", "same bytes"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::DuplicateContent);
    assert_eq!(
        err.details.unwrap()["conflicting_file_id"].as_str().unwrap(),
        first.id.to_string()
    );

    // No second record was created.
    assert_eq!(h.metadata.len().await, 1);
}

#[tokio::test]
async fn test_duplicate_version_rejected_per_file() {
    let h = harness();

    let file = h.engine.create_file(upload("alice", "a.txt", "v1")).await.unwrap();
    h.engine
        .append_version(file.id, "alice", Bytes::from("v2"), None)
        .await
        .unwrap();

    let err = h
        .engine
        .append_version(file.id, "alice", Bytes::from("v2"), None)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::DuplicateVersion);
    assert_eq!(err.details.unwrap()["existing_version"], 2);

    let file = h.engine.get_file(file.id).await.unwrap();
    assert_eq!(file.versions.len(), 2);

    // The rejected payload pinned no new blob.
    assert_eq!(h.content.len(), 2);
}

#[tokio::test]
async fn test_concurrent_appends_stay_contiguous() {
    // With N writers, each compare-and-swap loss implies another writer
    // won, so a writer can lose at most N-1 rounds before succeeding.
    let h = harness_with(EngineConfig {
        id_generation_attempts: 3,
        persist_retry_attempts: 16,
    });

    let file = h.engine.create_file(upload("alice", "a.txt", "base")).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..8 {
        let engine = h.engine.clone();
        let file_id = file.id;
        handles.push(tokio::spawn(async move {
            engine
                .append_version(file_id, "alice", Bytes::from(format!("payload-{i}")), None)
                .await
        }));
    }

    for handle in handles {
        handle.await.unwrap().expect("every append must succeed");
    }

    let file = h.engine.get_file(file.id).await.unwrap();
    assert_eq!(file.versions.len(), 9);
    assert_contiguous(&file);
}

#[tokio::test]
async fn test_soft_delete_owner_mismatch_is_not_found() {
    let h = harness();
    let file = h.engine.create_file(upload("alice", "a.txt", "data")).await.unwrap();

    let err = h.engine.soft_delete(file.id, "bob").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    // The file is untouched and still active.
    assert!(h.engine.get_file(file.id).await.is_ok());
}

#[tokio::test]
async fn test_soft_delete_is_idempotent_via_not_found() {
    let h = harness();
    let file = h.engine.create_file(upload("alice", "a.txt", "data")).await.unwrap();

    h.engine.soft_delete(file.id, "alice").await.unwrap();

    let err = h.engine.soft_delete(file.id, "alice").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    // Deleted files drop out of every read path.
    assert_eq!(h.engine.get_file(file.id).await.unwrap_err().kind, ErrorKind::NotFound);
    let err = h
        .engine
        .append_version(file.id, "alice", Bytes::from("more"), None)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_deleted_file_frees_its_hash() {
    let h = harness();
    let file = h.engine.create_file(upload("alice", "a.txt", "data")).await.unwrap();
    h.engine.soft_delete(file.id, "alice").await.unwrap();

    // Global dedup only consults active files.
    let again = h.engine.create_file(upload("bob", "b.txt", "data")).await.unwrap();
    assert_ne!(again.id, file.id);
}

#[tokio::test]
async fn test_verify_detects_corruption() {
    let h = harness();
    let file = h.engine.create_file(upload("alice", "a.txt", "original")).await.unwrap();
    let version = file.latest_version().unwrap();

    h.content
        .corrupt(&version.storage_address, Bytes::from("tampered!"));

    let result = h.engine.verify_integrity(version).await.unwrap();
    assert!(!result.matches);
    assert!(!result.sizes_match);
    assert!(!result.is_intact());
}

#[tokio::test]
async fn test_verify_unreachable_blob_is_an_error() {
    let h = harness();
    let file = h.engine.create_file(upload("alice", "a.txt", "original")).await.unwrap();
    let mut version = file.latest_version().unwrap().clone();
    version.storage_address = "0000000000000000".to_string();

    let err = h.engine.verify_integrity(&version).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::ContentUnavailable);
}

#[tokio::test]
async fn test_download_roundtrip() {
    let h = harness();
    let file = h.engine.create_file(upload("alice", "a.txt", "contents")).await.unwrap();

    let (version, payload) = h
        .engine
        .download(file.id, VersionSelector::Latest)
        .await
        .unwrap();
    assert_eq!(version.version_number, 1);
    assert_eq!(payload, Bytes::from("contents"));
}

#[tokio::test]
async fn test_search_requires_a_filter() {
    let h = harness();

    let err = h
        .engine
        .search_files(
            &SearchFilter::default(),
            &PageRequest::default(),
            &SortField::default(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[tokio::test]
async fn test_search_excludes_deleted_files() {
    let h = harness();
    let kept = h.engine.create_file(upload("alice", "kept.txt", "one")).await.unwrap();
    let removed = h.engine.create_file(upload("alice", "gone.txt", "two")).await.unwrap();
    h.engine.soft_delete(removed.id, "alice").await.unwrap();

    let page = h
        .engine
        .search_files(
            &SearchFilter::owner("alice"),
            &PageRequest::default(),
            &SortField::default(),
        )
        .await
        .unwrap();
    assert_eq!(page.total_items, 1);
    assert_eq!(page.items[0].id, kept.id);
}

#[tokio::test]
async fn test_misreported_store_size_is_integrity_error() {
    let metadata = Arc::new(MemoryMetadataStore::new());
    let engine = engine_over(metadata.clone(), Arc::new(MisreportingContentStore));

    let err = engine
        .create_file(upload("alice", "a.txt", "payload"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::StorageIntegrity);

    // The upload failed before any record was persisted.
    assert!(metadata.is_empty().await);
}

#[tokio::test(start_paused = true)]
async fn test_stalled_content_store_put_times_out() {
    let engine = engine_over(
        Arc::new(MemoryMetadataStore::new()),
        Arc::new(StalledContentStore),
    );

    let err = engine
        .create_file(upload("alice", "a.txt", "payload"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::StoreTimeout);
    assert!(err.kind.is_retryable());
}

#[tokio::test(start_paused = true)]
async fn test_stalled_content_store_get_times_out() {
    let metadata = Arc::new(MemoryMetadataStore::new());
    let content = Arc::new(MemoryContentStore::new());
    let working = engine_over(metadata.clone(), content);
    let file = working
        .create_file(upload("alice", "a.txt", "payload"))
        .await
        .unwrap();

    // Same records, but every fetch now hangs.
    let stalled = engine_over(metadata, Arc::new(StalledContentStore));
    let err = stalled
        .download(file.id, VersionSelector::Latest)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::StoreTimeout);
}

#[tokio::test]
async fn test_exhausted_persist_retries_surface_conflict() {
    let metadata = Arc::new(ContendedMetadataStore::default());
    let engine = engine_over(metadata.clone(), Arc::new(MemoryContentStore::new()));

    // Creation goes through insert, which is not contended here.
    let file = engine.create_file(upload("alice", "a.txt", "v1")).await.unwrap();

    let err = engine
        .append_version(file.id, "alice", Bytes::from("v2"), None)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::ConcurrentModification);
    assert!(err.kind.is_retryable());

    // The stored record never advanced past version 1.
    let stored = metadata.inner.find_by_id(file.id).await.unwrap().unwrap();
    assert_eq!(stored.versions.len(), 1);
    assert_eq!(stored.revision, 1);
}

#[tokio::test]
async fn test_soft_delete_accepts_padded_owner() {
    let h = harness();
    let file = h
        .engine
        .create_file(upload("  alice  ", "a.txt", "data"))
        .await
        .unwrap();
    assert_eq!(file.owner, "alice");

    h.engine.soft_delete(file.id, " alice ").await.unwrap();
    assert_eq!(
        h.engine.get_file(file.id).await.unwrap_err().kind,
        ErrorKind::NotFound
    );
}

#[tokio::test]
async fn test_blank_owner_rejected() {
    let h = harness();

    let err = h
        .engine
        .create_file(upload("   ", "a.txt", "data"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let err = h
        .engine
        .create_file(upload("alice", "", "data"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}
