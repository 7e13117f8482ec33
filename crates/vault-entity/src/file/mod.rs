//! Logical file domain entities.

pub mod model;
pub mod version;

pub use model::LogicalFile;
pub use version::FileVersion;
