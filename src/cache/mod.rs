//! Cache Module
//!
//! Named, disk-persisted LRU repositories and the registry that owns them.

mod entry;
pub mod persist;
mod recency;
mod registry;
mod repository;
mod stats;
pub mod validator;


// Re-export public types
pub use entry::{Entry, ValueKind};
pub use recency::RecencyIndex;
pub use registry::Registry;
pub use repository::{
    Repository, RepositoryOptions, DEFAULT_MAX_SIZE, DEFAULT_SAVE_DELAY, FORMAT_VERSION,
};
pub use stats::CacheStats;
pub use validator::Violation;
