//! LRU Repo - named, disk-persisted LRU repositories
//!
//! Provides bounded key-value repositories with LRU eviction, throttled
//! persistence and structural self-validation, plus an HTTP surface.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{Entry, Registry, Repository, RepositoryOptions};
pub use config::Config;
pub use error::{CacheError, Result};
pub use tasks::spawn_flush_task;
