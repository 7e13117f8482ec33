//! Shared value types: identifiers, pagination, sorting, and search filters.

pub mod filter;
pub mod id;
pub mod pagination;
pub mod sorting;

pub use filter::SearchFilter;
pub use id::FileId;
pub use pagination::{PageRequest, PageResponse};
pub use sorting::{SortDirection, SortField};
