//! Unified application error types for FileVault.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator.

use std::fmt;

use thiserror::Error;
use uuid::Uuid;

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// The requested file or version was not found (or is inactive).
    NotFound,
    /// Input validation failed.
    Validation,
    /// A record with the same primary key already exists.
    DuplicateKey,
    /// The payload's content hash already belongs to another active file.
    DuplicateContent,
    /// The payload is byte-identical to an existing version of the same file.
    DuplicateVersion,
    /// A concurrent writer won the compare-and-swap; the caller may retry.
    ConcurrentModification,
    /// The content store's own report disagreed with the payload (size/hash).
    StorageIntegrity,
    /// A content-store fetch failed.
    ContentUnavailable,
    /// A content-store operation exceeded its bounded wait.
    StoreTimeout,
    /// Identifier generation kept colliding and was abandoned.
    IdGenerationExhausted,
    /// A metadata store (database) error occurred.
    Database,
    /// A storage I/O error occurred.
    Storage,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// An internal error occurred.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::DuplicateKey => write!(f, "DUPLICATE_KEY"),
            Self::DuplicateContent => write!(f, "DUPLICATE_CONTENT"),
            Self::DuplicateVersion => write!(f, "DUPLICATE_VERSION"),
            Self::ConcurrentModification => write!(f, "CONCURRENT_MODIFICATION"),
            Self::StorageIntegrity => write!(f, "STORAGE_INTEGRITY"),
            Self::ContentUnavailable => write!(f, "CONTENT_UNAVAILABLE"),
            Self::StoreTimeout => write!(f, "STORE_TIMEOUT"),
            Self::IdGenerationExhausted => write!(f, "ID_GENERATION_EXHAUSTED"),
            Self::Database => write!(f, "DATABASE"),
            Self::Storage => write!(f, "STORAGE"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

impl ErrorKind {
    /// Whether a caller may safely retry the whole logical operation.
    ///
    /// Content-store writes are idempotent by content hash, so timeouts and
    /// lost compare-and-swap races are retryable without side effects.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification | Self::StoreTimeout)
    }
}

/// The unified application error used throughout FileVault.
///
/// All crate-specific errors are mapped into `AppError` using `From` impls
/// or explicit `.map_err()` calls. Dedup errors additionally carry structured
/// `details` (the conflicting file id or version number) so programmatic
/// callers do not have to parse messages.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional structured context (conflicting ids, version numbers).
    pub details: Option<serde_json::Value>,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
            source: Some(Box::new(source)),
        }
    }

    /// Attach structured context to this error.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a duplicate-key error.
    pub fn duplicate_key(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DuplicateKey, message)
    }

    /// Create a duplicate-content error carrying the conflicting file id.
    pub fn duplicate_content(conflicting_file_id: Uuid) -> Self {
        Self::new(
            ErrorKind::DuplicateContent,
            format!("identical content already stored as file {conflicting_file_id}"),
        )
        .with_details(serde_json::json!({ "conflicting_file_id": conflicting_file_id }))
    }

    /// Create a duplicate-version error carrying the existing version number.
    pub fn duplicate_version(existing_version: u32) -> Self {
        Self::new(
            ErrorKind::DuplicateVersion,
            format!("identical content already stored as version {existing_version}"),
        )
        .with_details(serde_json::json!({ "existing_version": existing_version }))
    }

    /// Create a concurrent-modification error.
    pub fn concurrent_modification(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConcurrentModification, message)
    }

    /// Create a storage-integrity error.
    pub fn storage_integrity(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::StorageIntegrity, message)
    }

    /// Create a content-unavailable error.
    pub fn content_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ContentUnavailable, message)
    }

    /// Create a store-timeout error.
    pub fn store_timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::StoreTimeout, message)
    }

    /// Create an id-generation-exhausted error.
    pub fn id_generation_exhausted(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::IdGenerationExhausted, message)
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    /// Create a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Storage, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            details: self.details.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorKind::Storage, format!("I/O error: {err}"), err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}
