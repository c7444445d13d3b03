//! API Handlers
//!
//! HTTP request handlers exposing named repositories.

use std::sync::Arc;
use tokio::sync::RwLock;

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::cache::{validator, Registry, Repository, RepositoryOptions};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    DeleteResponse, DestroyResponse, GetResponse, HealthResponse, PurgeResponse, RecencyOrder,
    RecentQuery, RecentResponse, SaveResponse, SetRequest, SetResponse, StatsResponse,
    ValidateResponse,
};

/// Application state shared across all handlers.
///
/// Repositories are opened on first use with `options`.
#[derive(Clone)]
pub struct AppState {
    /// Registry of open repositories
    pub registry: Arc<RwLock<Registry>>,
    /// Options for repositories created by the API
    pub options: RepositoryOptions,
}

impl AppState {
    /// Creates a new AppState around a registry.
    pub fn new(registry: Registry, options: RepositoryOptions) -> Self {
        Self {
            registry: Arc::new(RwLock::new(registry)),
            options,
        }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Registry::new(config.cache_dir.clone()),
            config.repository_options(),
        )
    }
}

/// Handler for PUT /:repo/set
pub async fn set_handler(
    State(state): State<AppState>,
    Path(repo): Path<String>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let mut registry = state.registry.write().await;
    let entry = registry
        .open(&repo, state.options.clone())?
        .put(req.key.clone(), req.value)?;

    Ok(Json(SetResponse::new(req.key, entry.declared_kind)))
}

/// Handler for GET /:repo/get/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path((repo, key)): Path<(String, String)>,
) -> Result<Json<GetResponse>> {
    // Write lock: opening may load the repository
    let mut registry = state.registry.write().await;
    let value = existing(&mut registry, &repo, &state.options)?
        .value(&key)
        .cloned()
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;

    Ok(Json(GetResponse::new(key, value)))
}

/// Handler for DELETE /:repo/del/:key
///
/// An unknown repository reports `removed: false` without being created.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path((repo, key)): Path<(String, String)>,
) -> Result<Json<DeleteResponse>> {
    let mut registry = state.registry.write().await;
    let removed = registry
        .open_existing(&repo, state.options.clone())?
        .is_some_and(|repository| repository.invalidate(&key));

    Ok(Json(DeleteResponse::new(key, removed)))
}

/// Handler for POST /:repo/clear
pub async fn clear_handler(
    State(state): State<AppState>,
    Path(repo): Path<String>,
) -> Result<Json<DestroyResponse>> {
    let mut registry = state.registry.write().await;
    registry.open(&repo, state.options.clone())?.clear();

    Ok(Json(DestroyResponse::new(repo, "cleared")))
}

/// Handler for POST /:repo/purge
pub async fn purge_handler(
    State(state): State<AppState>,
    Path(repo): Path<String>,
) -> Result<Json<PurgeResponse>> {
    let mut registry = state.registry.write().await;
    let removed = registry.open(&repo, state.options.clone())?.purge_invalid();

    Ok(Json(PurgeResponse {
        repository: repo,
        removed,
    }))
}

/// Handler for POST /:repo/save
///
/// Always forces the write.
pub async fn save_handler(
    State(state): State<AppState>,
    Path(repo): Path<String>,
) -> Result<Json<SaveResponse>> {
    let mut registry = state.registry.write().await;
    let repository = registry.open(&repo, state.options.clone())?;
    let written = repository.save(true)?;

    Ok(Json(SaveResponse {
        saved_at: repository.last_saved_at().map(|t| t.to_rfc3339()),
        repository: repo,
        written,
    }))
}

/// Handler for GET /:repo/recent
pub async fn recent_handler(
    State(state): State<AppState>,
    Path(repo): Path<String>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<RecentResponse>> {
    let mut registry = state.registry.write().await;
    let repository = existing(&mut registry, &repo, &state.options)?;
    let keys = match query.order {
        RecencyOrder::Newest => repository.most_to_least_recent(),
        RecencyOrder::Oldest => repository.least_to_most_recent(),
    };

    Ok(Json(RecentResponse {
        repository: repo,
        keys,
    }))
}

/// Handler for GET /:repo/validate
pub async fn validate_handler(
    State(state): State<AppState>,
    Path(repo): Path<String>,
) -> Result<Json<ValidateResponse>> {
    let mut registry = state.registry.write().await;
    let check = validator::check_repository(existing(&mut registry, &repo, &state.options)?);

    Ok(Json(ValidateResponse {
        repository: repo,
        valid: check.is_ok(),
        violation: check.err().map(|v| v.to_string()),
    }))
}

/// Handler for GET /:repo/stats
pub async fn stats_handler(
    State(state): State<AppState>,
    Path(repo): Path<String>,
) -> Result<Json<StatsResponse>> {
    let mut registry = state.registry.write().await;
    let repository = existing(&mut registry, &repo, &state.options)?;

    Ok(Json(StatsResponse::new(
        repo.as_str(),
        &repository.stats(),
        repository.max_size(),
    )))
}

// Read-only endpoints never create repositories.
fn existing<'a>(
    registry: &'a mut Registry,
    repo: &str,
    options: &RepositoryOptions,
) -> Result<&'a mut Repository> {
    registry
        .open_existing(repo, options.clone())?
        .ok_or_else(|| CacheError::RepositoryNotFound(repo.to_string()))
}

/// Handler for DELETE /:repo
pub async fn destroy_handler(
    State(state): State<AppState>,
    Path(repo): Path<String>,
) -> Result<Json<DestroyResponse>> {
    let mut registry = state.registry.write().await;
    registry.destroy(&repo)?;

    Ok(Json(DestroyResponse::new(repo, "destroyed")))
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let registry = state.registry.read().await;
    Json(HealthResponse::healthy(registry.len()))
}
