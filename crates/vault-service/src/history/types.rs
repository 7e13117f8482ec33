//! Request and result types for the version history engine.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Parameters for creating a logical file from its first payload.
#[derive(Debug, Clone)]
pub struct CreateFileRequest {
    /// Owning identity claimed by the caller.
    pub owner: String,
    /// File name as uploaded.
    pub original_file_name: String,
    /// The file content.
    pub payload: Bytes,
    /// MIME type, if known.
    pub mime_type: Option<String>,
    /// Free-form description.
    pub description: String,
    /// Tags to attach.
    pub tags: BTreeSet<String>,
}

/// Which version of a file an operation refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionSelector {
    /// The highest-numbered version.
    Latest,
    /// A specific version number.
    Number(u32),
}

impl fmt::Display for VersionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latest => write!(f, "latest"),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

impl FromStr for VersionSelector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("latest") {
            return Ok(Self::Latest);
        }
        match s.parse::<u32>() {
            Ok(n) if n >= 1 => Ok(Self::Number(n)),
            _ => Err(format!("expected \"latest\" or a positive number, got {s:?}")),
        }
    }
}

/// The outcome of re-checking a stored version against the content store.
///
/// A mismatch is a normal result, not an error; only an unreachable content
/// store turns verification into a failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationResult {
    /// Whether the recomputed digest matches the recorded content hash.
    pub matches: bool,
    /// Whether the retrieved byte length matches the recorded file size.
    pub sizes_match: bool,
    /// The digest recomputed from the retrieved bytes.
    pub recomputed_hash: String,
}

impl VerificationResult {
    /// True only when both the digest and the size check out.
    pub fn is_intact(&self) -> bool {
        self.matches && self.sizes_match
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_parsing() {
        assert_eq!("latest".parse::<VersionSelector>(), Ok(VersionSelector::Latest));
        assert_eq!("LATEST".parse::<VersionSelector>(), Ok(VersionSelector::Latest));
        assert_eq!("3".parse::<VersionSelector>(), Ok(VersionSelector::Number(3)));
        assert!("0".parse::<VersionSelector>().is_err());
        assert!("-1".parse::<VersionSelector>().is_err());
        assert!("newest".parse::<VersionSelector>().is_err());
    }

    #[test]
    fn test_selector_display() {
        assert_eq!(VersionSelector::Latest.to_string(), "latest");
        assert_eq!(VersionSelector::Number(7).to_string(), "7");
    }
}
