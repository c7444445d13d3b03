//! Error types for the repository engine and its HTTP surface
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for repositories, the registry and the API.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key not found in a repository (API only, the engine returns defaults)
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Repository neither registered nor persisted (API only)
    #[error("Repository not found: {0}")]
    RepositoryNotFound(String),

    /// Repository name would resolve outside the base directory
    #[error("Invalid repository name: {0:?}")]
    InvalidName(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Filesystem failure while reading or deleting persisted state
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Value or persisted file could not be (de)serialized
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// A save was attempted and the write failed; memory state is intact
    #[error("Failed to save repository '{name}': {source}")]
    SaveFailed {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) | CacheError::RepositoryNotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) | CacheError::InvalidName(_) | CacheError::Json(_) => {
                StatusCode::BAD_REQUEST
            }
            CacheError::Io(_) | CacheError::SaveFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the crate.
pub type Result<T> = std::result::Result<T, CacheError>;
