//! Readiness endpoint
//!
//! Every request re-reads the project database, so the service is only
//! useful while that read succeeds. `/healthz` performs the same load and
//! answers 503 when it fails.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use tracing::warn;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projects: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

async fn healthz(State(state): State<AppState>) -> Response {
    let (status, body) = match state.sites.check_database().await {
        Ok(count) => {
            metrics::gauge!("sitehost_projects").set(count as f64);
            (
                StatusCode::OK,
                HealthResponse {
                    status: "healthy",
                    version: env!("CARGO_PKG_VERSION"),
                    projects: Some(count),
                    error: None,
                },
            )
        }
        Err(e) => {
            warn!("Health check failed: {}", e);
            metrics::counter!("sitehost_database_errors_total").increment(1);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                HealthResponse {
                    status: "unavailable",
                    version: env!("CARGO_PKG_VERSION"),
                    projects: None,
                    error: Some("database unavailable".to_string()),
                },
            )
        }
    };

    (status, Json(body)).into_response()
}

/// `/healthz` only; `/health` is left to hosted projects
pub fn routes() -> Router<AppState> {
    Router::new().route("/healthz", get(healthz))
}
