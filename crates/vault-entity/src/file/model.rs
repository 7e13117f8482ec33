//! Logical file entity record.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vault_core::digest;
use vault_core::types::FileId;

use crate::file::version::FileVersion;

/// The durable identity a user refers to, decoupled from any single byte
/// payload. A logical file always carries at least one version; the version
/// list is append-only and ordered by ascending version number.
///
/// This is a plain persisted record. The version history engine is the only
/// component that mutates it; stores treat it as an opaque document guarded
/// by the `revision` token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogicalFile {
    /// Opaque unique identifier, immutable once assigned.
    pub id: FileId,
    /// File name as supplied on first upload.
    pub original_file_name: String,
    /// Owning identity (access-control surrogate supplied by the caller).
    pub owner: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Unordered set of tags.
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Soft-delete flag. Inactive files are excluded from all read, search,
    /// and download paths and accept no further versions.
    pub is_active: bool,
    /// Append-only version history, ascending by version number.
    pub versions: Vec<FileVersion>,
    /// Optimistic concurrency token, incremented on every persist.
    pub revision: i64,
    /// When the file was created.
    pub created_at: DateTime<Utc>,
    /// When the file was last updated.
    pub updated_at: DateTime<Utc>,
}

impl LogicalFile {
    /// The highest-numbered version, if any.
    pub fn latest_version(&self) -> Option<&FileVersion> {
        self.versions.last()
    }

    /// Look up a version by its number.
    pub fn version(&self, version_number: u32) -> Option<&FileVersion> {
        self.versions
            .iter()
            .find(|v| v.version_number == version_number)
    }

    /// Find the version whose content hash matches, case-insensitively.
    pub fn version_with_hash(&self, content_hash: &str) -> Option<&FileVersion> {
        self.versions
            .iter()
            .find(|v| digest::digests_match(&v.content_hash, content_hash))
    }

    /// The number the next appended version must receive.
    ///
    /// Numbering is contiguous from 1, so this equals `count + 1`.
    pub fn next_version_number(&self) -> u32 {
        self.versions
            .last()
            .map(|v| v.version_number + 1)
            .unwrap_or(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version(n: u32, hash: &str) -> FileVersion {
        FileVersion {
            version_number: n,
            content_hash: hash.to_string(),
            storage_address: format!("ad/dr/{hash}"),
            file_size: 11,
            mime_type: Some("text/plain".into()),
            uploaded_by: "alice".into(),
            uploaded_at: Utc::now(),
        }
    }

    fn file_with_versions(versions: Vec<FileVersion>) -> LogicalFile {
        LogicalFile {
            id: FileId::new(),
            original_file_name: "greeting.txt".into(),
            owner: "alice".into(),
            description: String::new(),
            tags: BTreeSet::new(),
            is_active: true,
            versions,
            revision: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_latest_is_highest_numbered() {
        let file = file_with_versions(vec![version(1, "aa"), version(2, "bb")]);
        assert_eq!(file.latest_version().unwrap().version_number, 2);
        assert_eq!(file.next_version_number(), 3);
    }

    #[test]
    fn test_hash_lookup_is_case_insensitive() {
        let file = file_with_versions(vec![version(1, "abcdef")]);
        assert!(file.version_with_hash("ABCDEF").is_some());
        assert!(file.version_with_hash("ffffff").is_none());
    }

    #[test]
    fn test_version_lookup() {
        let file = file_with_versions(vec![version(1, "aa"), version(2, "bb")]);
        assert_eq!(file.version(1).unwrap().content_hash, "aa");
        assert!(file.version(3).is_none());
    }
}
