//! Response types for the usage-dash client.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use usage_dash_core::{AggregatedBucket, AggregationReport, Granularity};

/// Health check response.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service name.
    pub service: String,
    /// Service version.
    pub version: String,
}

/// A failed aggregation pass reported by the service.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshFailure {
    /// Tick number of the failed pass.
    pub tick: u64,
    /// When the pass failed.
    pub failed_at: DateTime<Utc>,
    /// Error description.
    pub message: String,
}

/// Both series plus pass metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct UsageResponse {
    /// Tick of the pass that produced the data.
    pub tick: u64,
    /// When that pass completed.
    pub refreshed_at: DateTime<Utc>,
    /// Daily series.
    pub daily: Vec<AggregatedBucket>,
    /// Weekly series.
    pub weekly: Vec<AggregatedBucket>,
    /// Pass counters.
    pub report: AggregationReport,
    /// Newest failed pass after this snapshot, if any.
    #[serde(default)]
    pub last_error: Option<RefreshFailure>,
}

/// A single series.
#[derive(Debug, Clone, Deserialize)]
pub struct SeriesResponse {
    /// Series granularity.
    pub granularity: Granularity,
    /// Tick of the pass that produced the data.
    pub tick: u64,
    /// When that pass completed.
    pub refreshed_at: DateTime<Utc>,
    /// Buckets in ascending order.
    pub buckets: Vec<AggregatedBucket>,
}

/// A charted measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Measure {
    /// Summed cost.
    Cost,
    /// Summed tokens.
    TotalTokens,
    /// Request count.
    ApiRequests,
}

/// One chart point.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ChartPoint {
    /// Bucket start.
    pub x: DateTime<Utc>,
    /// Measure value.
    pub y: f64,
}

/// A line chart descriptor.
#[derive(Debug, Clone, Deserialize)]
pub struct Chart {
    /// Element ID, e.g. `daily-cost`.
    pub id: String,
    /// Chart title.
    pub title: String,
    /// Series name for the legend.
    pub series_name: String,
    /// Bucket granularity.
    pub granularity: Granularity,
    /// Charted measure.
    pub measure: Measure,
    /// X axis label.
    pub x_axis_title: String,
    /// Y axis label.
    pub y_axis_title: String,
    /// Date tick format for the x axis.
    pub x_tick_format: String,
    /// Line and marker color.
    pub color: String,
    /// Points in ascending `x` order.
    pub points: Vec<ChartPoint>,
}

/// The six dashboard charts.
#[derive(Debug, Clone, Deserialize)]
pub struct ChartsResponse {
    /// Tick of the pass that produced the data.
    pub tick: u64,
    /// When that pass completed.
    pub refreshed_at: DateTime<Utc>,
    /// How often the service refreshes.
    pub refresh_interval_seconds: u64,
    /// Chart descriptors in dashboard order.
    pub charts: Vec<Chart>,
}

impl ChartsResponse {
    /// Find a chart by ID.
    #[must_use]
    pub fn chart(&self, id: &str) -> Option<&Chart> {
        self.charts.iter().find(|chart| chart.id == id)
    }
}

/// API error response body.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

/// API error details.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}
