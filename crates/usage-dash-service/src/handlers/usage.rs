//! Aggregated usage handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use usage_dash_core::{AggregatedBucket, AggregationReport, Granularity};

use crate::charts::{build_charts, Chart};
use crate::error::ApiError;
use crate::refresh::{RefreshFailure, UsageSnapshot};
use crate::state::AppState;

/// Full usage response: both series plus pass metadata.
#[derive(Debug, Serialize)]
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
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<RefreshFailure>,
}

impl UsageResponse {
    fn new(snapshot: &UsageSnapshot, last_error: Option<RefreshFailure>) -> Self {
        Self {
            tick: snapshot.tick,
            refreshed_at: snapshot.refreshed_at,
            daily: snapshot.usage.daily.clone(),
            weekly: snapshot.usage.weekly.clone(),
            report: snapshot.usage.report,
            last_error,
        }
    }
}

/// A single series.
#[derive(Debug, Serialize)]
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

/// The six dashboard charts.
#[derive(Debug, Serialize)]
pub struct ChartsResponse {
    /// Tick of the pass that produced the data.
    pub tick: u64,
    /// When that pass completed.
    pub refreshed_at: DateTime<Utc>,
    /// How often the data is refreshed.
    pub refresh_interval_seconds: u64,
    /// Chart descriptors in dashboard order.
    pub charts: Vec<Chart>,
}

fn latest(state: &AppState) -> Result<Arc<UsageSnapshot>, ApiError> {
    state
        .refresher
        .latest()
        .ok_or_else(|| ApiError::NotReady {
            last_error: state.refresher.last_error().map(|failure| failure.message),
        })
}

/// Get the latest daily and weekly series.
pub async fn get_usage(
    State(state): State<Arc<AppState>>,
) -> Result<Json<UsageResponse>, ApiError> {
    let snapshot = latest(&state)?;
    Ok(Json(UsageResponse::new(
        &snapshot,
        state.refresher.last_error(),
    )))
}

/// Get the latest daily series.
pub async fn get_daily(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SeriesResponse>, ApiError> {
    series(&state, Granularity::Daily)
}

/// Get the latest weekly series.
pub async fn get_weekly(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SeriesResponse>, ApiError> {
    series(&state, Granularity::Weekly)
}

fn series(state: &AppState, granularity: Granularity) -> Result<Json<SeriesResponse>, ApiError> {
    let snapshot = latest(state)?;
    Ok(Json(SeriesResponse {
        granularity,
        tick: snapshot.tick,
        refreshed_at: snapshot.refreshed_at,
        buckets: snapshot.usage.series(granularity).to_vec(),
    }))
}

/// Get chart descriptors for the latest snapshot.
pub async fn get_charts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ChartsResponse>, ApiError> {
    let snapshot = latest(&state)?;
    Ok(Json(ChartsResponse {
        tick: snapshot.tick,
        refreshed_at: snapshot.refreshed_at,
        refresh_interval_seconds: state.config.refresh_interval_seconds,
        charts: build_charts(&snapshot.usage),
    }))
}

/// Run an aggregation pass now.
pub async fn refresh(
    State(state): State<Arc<AppState>>,
) -> Result<Json<UsageResponse>, ApiError> {
    tracing::debug!("Manual refresh requested");
    let snapshot = state.refresher.refresh().await?;
    Ok(Json(UsageResponse::new(&snapshot, None)))
}
