//! Tagged search filter for file queries.
//!
//! One variant per filter kind instead of ad hoc field/operator/value
//! triples, validated before it reaches any store adapter.

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::result::AppResult;

/// Filters for searching logical files. All populated filters are combined
/// with AND; the tag list itself uses any-of semantics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchFilter {
    /// Case-insensitive substring match against file name or description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Exact owner match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// Any-of tag match: a file qualifies if it carries at least one of these.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl SearchFilter {
    /// Filter on a text query.
    pub fn text(query: impl Into<String>) -> Self {
        Self {
            text: Some(query.into()),
            ..Self::default()
        }
    }

    /// Filter on an owner.
    pub fn owner(owner: impl Into<String>) -> Self {
        Self {
            owner: Some(owner.into()),
            ..Self::default()
        }
    }

    /// Filter on tags (any-of).
    pub fn tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tags: tags.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// True when no filter is populated. Blank strings count as empty.
    pub fn is_empty(&self) -> bool {
        self.text.as_deref().is_none_or(|t| t.trim().is_empty())
            && self.owner.as_deref().is_none_or(|o| o.trim().is_empty())
            && self.tags.iter().all(|t| t.trim().is_empty())
    }

    /// Validate that at least one filter is populated.
    pub fn validate(&self) -> AppResult<()> {
        if self.is_empty() {
            return Err(AppError::validation(
                "at least one search filter (text, owner, or tags) is required",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_empty_filter_rejected() {
        let err = SearchFilter::default().validate().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[test]
    fn test_blank_strings_count_as_empty() {
        let filter = SearchFilter {
            text: Some("   ".into()),
            owner: Some("".into()),
            tags: vec!["".into()],
        };
        assert!(filter.is_empty());
    }

    #[test]
    fn test_single_filter_is_valid() {
        assert!(SearchFilter::owner("alice").validate().is_ok());
        assert!(SearchFilter::text("report").validate().is_ok());
        assert!(SearchFilter::tags(["q3"]).validate().is_ok());
    }
}
