//! Application state

use sitehost_core::SiteService;
use sitehost_notify::Notifier;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::services::ServeDir;

/// Prometheus render handle for the `/metrics` endpoint
pub type MetricsHandle = metrics_exporter_prometheus::PrometheusHandle;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub sites: Arc<SiteService>,
    pub notifier: Arc<dyn Notifier>,
    /// Serves `/images`, `/scripts` and `/styles` for hosts without a project
    pub shared: ServeDir,
}

impl AppState {
    pub fn new(
        sites: Arc<SiteService>,
        notifier: Arc<dyn Notifier>,
        resources_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            sites,
            notifier,
            shared: ServeDir::new(resources_root.into()),
        }
    }
}
