//! Request DTOs for the repository server API
//!
//! Defines the structure of incoming HTTP request bodies and queries.

use serde::Deserialize;
use serde_json::Value;

/// Maximum accepted key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Request body for the SET operation (PUT /:repo/set)
///
/// # Fields
/// - `key`: The key to store the value under
/// - `value`: Any JSON value; its kind is recorded for validation
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    /// The cache key
    pub key: String,
    /// The value to store
    pub value: Value,
}

impl SetRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.key.is_empty() {
            return Some("Key cannot be empty".to_string());
        }
        if self.key.len() > MAX_KEY_LENGTH {
            return Some(format!(
                "Key exceeds maximum length of {} bytes",
                MAX_KEY_LENGTH
            ));
        }
        None
    }
}

/// Ordering of the recency listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecencyOrder {
    /// Most recently used first
    #[default]
    Newest,
    /// Least recently used first
    Oldest,
}

/// Query string for GET /:repo/recent
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecentQuery {
    #[serde(default)]
    pub order: RecencyOrder,
}
