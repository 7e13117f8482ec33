//! Content store configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Content store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentStoreConfig {
    /// Provider to use: `"local"` or `"memory"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Root directory for the local provider's blob tree.
    #[serde(default = "default_root_path")]
    pub root_path: String,
    /// Bounded wait for any single content-store operation, in seconds.
    /// A timeout surfaces as a retryable error; content-addressed writes
    /// are idempotent, so retrying the whole logical operation is safe.
    #[serde(default = "default_operation_timeout")]
    pub operation_timeout_seconds: u64,
}

impl ContentStoreConfig {
    /// Operation timeout as a [`Duration`].
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_seconds)
    }
}

impl Default for ContentStoreConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            root_path: default_root_path(),
            operation_timeout_seconds: default_operation_timeout(),
        }
    }
}

fn default_provider() -> String {
    "local".to_string()
}

fn default_root_path() -> String {
    "./data/blobs".to_string()
}

fn default_operation_timeout() -> u64 {
    30
}
