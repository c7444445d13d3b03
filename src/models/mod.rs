//! Request and Response models for the repository server API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{RecencyOrder, RecentQuery, SetRequest};
pub use responses::{
    DeleteResponse, DestroyResponse, ErrorResponse, GetResponse, HealthResponse, PurgeResponse,
    RecentResponse, SaveResponse, SetResponse, StatsResponse, ValidateResponse,
};
