//! Usage-dash Service - refreshing usage charts over HTTP
//!
//! This is the main entry point for the usage-dash service.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use usage_dash_service::{create_router, AppState, ServiceConfig};
use usage_dash_store::RecordSource;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,usage_dash=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting usage-dash service");

    // Load configuration from environment
    let config = ServiceConfig::from_env();

    tracing::info!(
        listen_addr = %config.listen_addr,
        data_dir = %config.data_dir,
        secondary_dir = %config.secondary_dir,
        refresh_interval_secs = config.refresh_interval_seconds,
        source_read_timeout_secs = config.source_read_timeout_seconds,
        "Service configuration loaded"
    );

    let source = open_source(&config)?;

    let state = AppState::new(source, config.clone());
    let refresh_task = state.refresher.spawn(config.refresh_interval());

    let app = create_router(state);
    tracing::info!("Router configured with all API endpoints");

    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    refresh_task.abort();
    tracing::info!("Service stopped");

    Ok(())
}

#[cfg(feature = "rocksdb-backend")]
fn open_source(
    config: &ServiceConfig,
) -> Result<Arc<dyn RecordSource>, Box<dyn std::error::Error>> {
    tracing::info!(
        path = %config.data_dir,
        secondary_dir = %config.secondary_dir,
        "Opening RocksDB record source as a read-only secondary"
    );
    let source =
        usage_dash_store::RocksSource::open_secondary(&config.data_dir, &config.secondary_dir)?;
    Ok(Arc::new(source))
}

#[cfg(not(feature = "rocksdb-backend"))]
fn open_source(
    config: &ServiceConfig,
) -> Result<Arc<dyn RecordSource>, Box<dyn std::error::Error>> {
    tracing::warn!(
        data_dir = %config.data_dir,
        "Built without rocksdb-backend, serving an empty in-memory collection"
    );
    Ok(Arc::new(usage_dash_store::MemorySource::default()))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
