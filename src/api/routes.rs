//! API Routes
//!
//! Configures the Axum router with all repository endpoints.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_handler, delete_handler, destroy_handler, get_handler, health_handler, purge_handler,
    recent_handler, save_handler, set_handler, stats_handler, validate_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/:repo", delete(destroy_handler))
        .route("/:repo/set", put(set_handler))
        .route("/:repo/get/:key", get(get_handler))
        .route("/:repo/del/:key", delete(delete_handler))
        .route("/:repo/clear", post(clear_handler))
        .route("/:repo/purge", post(purge_handler))
        .route("/:repo/save", post(save_handler))
        .route("/:repo/recent", get(recent_handler))
        .route("/:repo/validate", get(validate_handler))
        .route("/:repo/stats", get(stats_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
