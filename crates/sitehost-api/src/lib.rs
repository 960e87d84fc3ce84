//! Sitehost HTTP API
//!
//! This crate provides the Axum router for Sitehost: the catch-all site
//! handler that runs the resolution pipeline, shared resource serving, and
//! the operational health and metrics endpoints.

pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::{AppState, MetricsHandle};
