//! Response DTOs for the repository server API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;
use serde_json::Value;

use crate::cache::{CacheStats, ValueKind};

/// Response body for GET /:repo/get/:key
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    /// The requested key
    pub key: String,
    /// The stored value
    pub value: Value,
}

impl GetResponse {
    /// Creates a new GetResponse
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Response body for PUT /:repo/set
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// Success message
    pub message: String,
    /// The key that was set
    pub key: String,
    /// Kind recorded for the stored value
    pub kind: Option<ValueKind>,
}

impl SetResponse {
    /// Creates a new SetResponse
    pub fn new(key: impl Into<String>, kind: Option<ValueKind>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' set successfully", key),
            key,
            kind,
        }
    }
}

/// Response body for DELETE /:repo/del/:key
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    /// The key that was invalidated
    pub key: String,
    /// Whether the key was present
    pub removed: bool,
}

impl DeleteResponse {
    /// Creates a new DeleteResponse
    pub fn new(key: impl Into<String>, removed: bool) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' invalidated", key),
            key,
            removed,
        }
    }
}

/// Response body for GET /:repo/recent
#[derive(Debug, Clone, Serialize)]
pub struct RecentResponse {
    pub repository: String,
    pub keys: Vec<String>,
}

/// Response body for GET /:repo/validate
#[derive(Debug, Clone, Serialize)]
pub struct ValidateResponse {
    pub repository: String,
    pub valid: bool,
    /// First violated rule, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violation: Option<String>,
}

/// Response body for POST /:repo/purge
#[derive(Debug, Clone, Serialize)]
pub struct PurgeResponse {
    pub repository: String,
    pub removed: usize,
}

/// Response body for POST /:repo/save
#[derive(Debug, Clone, Serialize)]
pub struct SaveResponse {
    pub repository: String,
    pub written: bool,
    /// Time of the last save decision in ISO 8601 format
    pub saved_at: Option<String>,
}

/// Response body for DELETE /:repo and POST /:repo/clear
#[derive(Debug, Clone, Serialize)]
pub struct DestroyResponse {
    /// Success message
    pub message: String,
    pub repository: String,
}

impl DestroyResponse {
    pub fn new(repository: impl Into<String>, action: &str) -> Self {
        let repository = repository.into();
        Self {
            message: format!("Repository '{}' {}", repository, action),
            repository,
        }
    }
}

/// Response body for GET /:repo/stats
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub repository: String,
    pub evictions: u64,
    pub saves: u64,
    pub skipped_saves: u64,
    pub purged: u64,
    pub total_entries: usize,
    pub max_size: usize,
    /// Fraction of save requests that reached the disk
    pub write_ratio: f64,
}

impl StatsResponse {
    /// Creates a new StatsResponse from repository statistics
    pub fn new(repository: impl Into<String>, stats: &CacheStats, max_size: usize) -> Self {
        Self {
            repository: repository.into(),
            evictions: stats.evictions,
            saves: stats.saves,
            skipped_saves: stats.skipped_saves,
            purged: stats.purged,
            total_entries: stats.total_entries,
            max_size,
            write_ratio: stats.write_ratio(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Number of open repositories
    pub repositories: usize,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy(repositories: usize) -> Self {
        Self {
            status: "healthy".to_string(),
            repositories,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
