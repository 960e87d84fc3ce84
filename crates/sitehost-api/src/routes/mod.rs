//! API routes

mod health;
mod site;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use sitehost_notify::{Notifier, dispatch, escape_html};
use std::any::Any;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tracing::error;

use crate::state::{AppState, MetricsHandle};

/// Create the main router
pub fn create_router(state: AppState, metrics_handle: Option<Arc<MetricsHandle>>) -> Router {
    let notifier = state.notifier.clone();

    let mut router = Router::new()
        .merge(health::routes())
        // Every other path belongs to the hosted sites
        .fallback(site::serve)
        .with_state(state);

    // Only reserved when enabled; otherwise `/metrics` is an ordinary site path
    if let Some(handle) = metrics_handle {
        router = router.merge(
            Router::new()
                .route("/metrics", get(render_metrics))
                .with_state(handle),
        );
    }

    router.layer(CatchPanicLayer::custom(move |panic: Box<dyn Any + Send + 'static>| {
        panic_response(&notifier, panic)
    }))
}

async fn render_metrics(State(handle): State<Arc<MetricsHandle>>) -> String {
    handle.render()
}

fn panic_response(notifier: &Arc<dyn Notifier>, panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    error!("Handler panicked: {}", detail);
    dispatch(
        notifier.clone(),
        format!("⚠️ Server error: <code>{}</code>", escape_html(&detail)),
    );

    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
}
