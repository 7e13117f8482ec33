//! File version entity record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One immutable entry in a logical file's version history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileVersion {
    /// Sequential version number, assigned by the engine starting at 1.
    /// Never client-supplied.
    pub version_number: u32,
    /// SHA-256 digest of the exact byte payload, lowercase hex. Matched
    /// case-insensitively against older records.
    pub content_hash: String,
    /// Content-store handle returned when the payload was stored.
    pub storage_address: String,
    /// Payload size in bytes.
    pub file_size: u64,
    /// MIME type, if known.
    pub mime_type: Option<String>,
    /// Identity that uploaded this version.
    pub uploaded_by: String,
    /// When this version was uploaded.
    pub uploaded_at: DateTime<Utc>,
}
