//! Catch-all site handler

use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderMap, Method, StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};
use sitehost_core::route::resource_path;
use sitehost_core::{CoreError, NotFoundKind, Outcome, SiteRequest};
use sitehost_notify::{dispatch, escape_html};
use tower::ServiceExt;
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

/// Runs the site pipeline for any request no other route claimed
pub async fn serve(State(state): State<AppState>, request: Request) -> Result<Response, ApiError> {
    if !matches!(*request.method(), Method::GET | Method::HEAD) {
        record("method_not_allowed");
        return Ok((StatusCode::METHOD_NOT_ALLOWED, [(header::ALLOW, "GET, HEAD")]).into_response());
    }

    let (parts, body) = request.into_parts();

    let outcome = match handle(&state, &parts).await {
        Ok(outcome) => outcome,
        Err(e) => {
            metrics::counter!("sitehost_requests_total", "outcome" => "error").increment(1);
            if matches!(e, CoreError::DatabaseUnavailable(_)) {
                metrics::counter!("sitehost_database_errors_total").increment(1);
            } else {
                dispatch(
                    state.notifier.clone(),
                    format!(
                        "⚠️ Error serving <code>{}</code>: <code>{}</code>",
                        escape_html(parts.uri.path()),
                        escape_html(&e.to_string())
                    ),
                );
            }
            return Err(e.into());
        }
    };

    let response = match outcome {
        Outcome::HealthRedirect { location } => {
            metrics::counter!("sitehost_health_redirects_total").increment(1);
            record("health_redirect");
            (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, location)]).into_response()
        }
        Outcome::DeviceRedirect { location } => {
            record("device_redirect");
            (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
        }
        Outcome::Content(file) => {
            record("content");
            debug!("Serving {}", file.key);
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, file.content_type)],
                file.body,
            )
                .into_response()
        }
        Outcome::NotFound(kind) => {
            not_found(&state, Request::from_parts(parts, body), kind).await
        }
    };

    Ok(response)
}

async fn handle(state: &AppState, parts: &Parts) -> Result<Outcome, CoreError> {
    let site_request = SiteRequest {
        host: host(&parts.headers).or_else(|| parts.uri.authority().map(|a| a.as_str())),
        path: parts.uri.path(),
        query: parts.uri.query(),
        user_agent: parts
            .headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(""),
    };

    state.sites.handle(&site_request).await
}

fn host(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .filter(|h| !h.is_empty())
}

/// Shared resource directories get one more chance before the 404
async fn not_found(state: &AppState, request: Request, kind: NotFoundKind) -> Response {
    if resource_path(request.uri().path()).is_some() {
        let Ok(response) = state.shared.clone().oneshot(request).await;
        if response.status() != StatusCode::NOT_FOUND {
            record("shared");
            return response.map(Body::new);
        }
    }

    record("not_found");
    (StatusCode::NOT_FOUND, kind.message()).into_response()
}

fn record(outcome: &'static str) {
    metrics::counter!("sitehost_requests_total", "outcome" => outcome).increment(1);
}
