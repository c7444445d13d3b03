//! API Module
//!
//! HTTP handlers and routing for the repository server REST API.
//!
//! # Endpoints
//! - `PUT /:repo/set` - Store a key-value pair
//! - `GET /:repo/get/:key` - Retrieve a value by key
//! - `DELETE /:repo/del/:key` - Invalidate a key
//! - `POST /:repo/clear` - Drop every entry
//! - `POST /:repo/purge` - Remove entries failing validation
//! - `POST /:repo/save` - Force a save
//! - `GET /:repo/recent` - List keys by recency
//! - `GET /:repo/validate` - Run the structural self-check
//! - `GET /:repo/stats` - Repository counters
//! - `DELETE /:repo` - Destroy a repository and its file
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
