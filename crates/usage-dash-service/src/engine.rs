//! The aggregation engine.
//!
//! Reads a full snapshot of the record source under a timeout and runs the
//! core aggregation pipeline over it. Nothing is carried between calls
//! besides the source handle.

use std::sync::Arc;
use std::time::{Duration, Instant};

use usage_dash_core::{aggregate, AggregatedUsage};
use usage_dash_store::RecordSource;

/// Errors that fail a whole aggregation pass.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    /// The record source could not be read, or the read timed out.
    #[error("source unavailable ({backend}): {reason}")]
    SourceUnavailable {
        /// Backend name of the failing source.
        backend: &'static str,
        /// What went wrong.
        reason: String,
    },
}

/// Loads usage documents and aggregates them into daily and weekly series.
#[derive(Clone)]
pub struct UsageEngine {
    source: Arc<dyn RecordSource>,
    read_timeout: Duration,
}

impl UsageEngine {
    /// Create an engine over a record source.
    #[must_use]
    pub fn new(source: Arc<dyn RecordSource>, read_timeout: Duration) -> Self {
        Self {
            source,
            read_timeout,
        }
    }

    /// Read every document and aggregate it.
    ///
    /// An empty source is not an error; it yields empty series.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::SourceUnavailable` if the read fails or exceeds
    /// the configured timeout. No partial result is returned.
    pub async fn fetch_and_aggregate(&self) -> Result<AggregatedUsage, EngineError> {
        let backend = self.source.backend();
        let started = Instant::now();

        let documents = match tokio::time::timeout(self.read_timeout, self.source.fetch_all()).await
        {
            Ok(Ok(documents)) => documents,
            Ok(Err(err)) => {
                return Err(EngineError::SourceUnavailable {
                    backend,
                    reason: err.to_string(),
                })
            }
            Err(_) => {
                return Err(EngineError::SourceUnavailable {
                    backend,
                    reason: format!("read timed out after {}ms", self.read_timeout.as_millis()),
                })
            }
        };

        let usage = aggregate(&documents);
        let report = usage.report;

        if report.unparseable_timestamps > 0 {
            tracing::warn!(
                backend,
                skipped = report.unparseable_timestamps,
                documents = report.documents_read,
                "Skipped usage documents with unparseable timestamps"
            );
        }

        tracing::debug!(
            backend,
            documents = report.documents_read,
            bucketed = report.events_bucketed,
            coerced_total_tokens = report.coerced_total_tokens,
            coerced_costs = report.coerced_costs,
            daily_buckets = usage.daily.len(),
            weekly_buckets = usage.weekly.len(),
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Aggregation pass complete"
        );

        Ok(usage)
    }
}
