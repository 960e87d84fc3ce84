//! Sitehost - Multi-tenant static site host with health-aware domain failover

use anyhow::Result;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;

use config::{Config, LoggingConfig};
use sitehost_api::{AppState, create_router};
use sitehost_core::{ContentResolver, JsonFileDatabase, SiteService};
use sitehost_notify::{Notifier, TelegramNotifier, dispatch};
use sitehost_storage::LocalStorage;

/// Sitehost - serves many projects' sites from one resource tree
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    /// Bind address
    #[arg(long, env = "SITEHOST_BIND")]
    bind: Option<String>,

    /// Port
    #[arg(short, long, env = "SITEHOST_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load(&args.config)?;

    init_logging(&config.logging);

    info!("Starting Sitehost v{}", env!("CARGO_PKG_VERSION"));

    let site_config = config.to_site_config();

    let storage = Arc::new(LocalStorage::new(&site_config.resources_root).await?);
    let database = Arc::new(JsonFileDatabase::new(&site_config.database_path));
    let notifier: Arc<dyn Notifier> =
        Arc::new(TelegramNotifier::new(config.to_telegram_config())?);

    if site_config.allowed_tags.is_empty() {
        warn!("No allowed tags configured, short-id routes are disabled");
    }

    let sites = Arc::new(SiteService::new(
        database,
        ContentResolver::new(storage, &site_config),
        notifier.clone(),
    ));

    let state = AppState::new(sites, notifier.clone(), &site_config.resources_root);

    let metrics_handle = if config.metrics.enabled {
        Some(Arc::new(PrometheusBuilder::new().install_recorder()?))
    } else {
        None
    };

    let app = create_router(state, metrics_handle).layer(TraceLayer::new_for_http());

    let bind_addr = args.bind.unwrap_or(config.server.bind_address);
    let port = args.port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", bind_addr, port).parse()?;

    info!("Listening on {}", addr);
    info!("Database: {}", site_config.database_path.display());
    info!("Resources: {}", site_config.resources_root.display());

    let listener = tokio::net::TcpListener::bind(addr).await?;

    dispatch(
        notifier,
        format!(
            "🚀 Server started on port {} at {}",
            port,
            chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
        ),
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Initialize logging
fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let registry = tracing_subscriber::registry().with(filter);
    if config.format == "json" {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
