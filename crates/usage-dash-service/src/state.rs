//! Application state.

use std::sync::Arc;

use usage_dash_store::RecordSource;

use crate::config::ServiceConfig;
use crate::engine::UsageEngine;
use crate::refresh::Refresher;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Runs aggregation passes and holds the latest snapshot.
    pub refresher: Arc<Refresher>,

    /// Service configuration.
    pub config: ServiceConfig,
}

impl AppState {
    /// Create a new application state over a record source.
    #[must_use]
    pub fn new(source: Arc<dyn RecordSource>, config: ServiceConfig) -> Self {
        tracing::info!(
            backend = source.backend(),
            read_timeout_secs = config.source_read_timeout_seconds,
            "Usage engine configured"
        );

        let engine = UsageEngine::new(source, config.source_read_timeout());

        Self {
            refresher: Arc::new(Refresher::new(engine)),
            config,
        }
    }
}
