//! Periodic refresh of the aggregated usage snapshot.
//!
//! Passes are serialized: one pass holds the pass lock from the source read
//! until its result is applied. Every pass gets a tick number under that lock,
//! and the snapshot cell rejects any result older than the one it holds.
//! A failed pass leaves the previous snapshot in place.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use usage_dash_core::AggregatedUsage;

use crate::engine::{EngineError, UsageEngine};

/// Shortest accepted refresh period.
const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

/// One successful aggregation pass.
#[derive(Debug, Clone)]
pub struct UsageSnapshot {
    /// Tick number of the pass that produced this snapshot.
    pub tick: u64,
    /// When the pass completed.
    pub refreshed_at: DateTime<Utc>,
    /// Aggregated series and pass counters.
    pub usage: AggregatedUsage,
}

/// The most recent failed pass.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshFailure {
    /// Tick number of the failed pass.
    pub tick: u64,
    /// When the pass failed.
    pub failed_at: DateTime<Utc>,
    /// Error description.
    pub message: String,
}

#[derive(Debug, Default)]
struct CellState {
    latest: Option<Arc<UsageSnapshot>>,
    last_error: Option<RefreshFailure>,
}

/// Holds the newest snapshot and the newest failure.
#[derive(Debug, Default)]
pub struct SnapshotCell {
    state: RwLock<CellState>,
}

impl SnapshotCell {
    /// Apply a snapshot if it is newer than the current one.
    ///
    /// Returns `false` and leaves the cell untouched for a stale snapshot.
    pub fn apply(&self, snapshot: Arc<UsageSnapshot>) -> bool {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);

        if let Some(current) = &state.latest {
            if current.tick >= snapshot.tick {
                tracing::debug!(
                    current = current.tick,
                    stale = snapshot.tick,
                    "Discarding stale usage snapshot"
                );
                return false;
            }
        }

        if state
            .last_error
            .as_ref()
            .is_some_and(|failure| failure.tick < snapshot.tick)
        {
            state.last_error = None;
        }
        state.latest = Some(snapshot);
        true
    }

    /// Record a failed pass. The current snapshot is kept.
    pub fn record_failure(&self, failure: RefreshFailure) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let newer = state
            .last_error
            .as_ref()
            .map_or(true, |current| current.tick < failure.tick);
        if newer {
            state.last_error = Some(failure);
        }
    }

    /// The newest snapshot, if any pass has succeeded.
    #[must_use]
    pub fn latest(&self) -> Option<Arc<UsageSnapshot>> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .latest
            .clone()
    }

    /// The newest failure not yet superseded by a successful pass.
    #[must_use]
    pub fn last_error(&self) -> Option<RefreshFailure> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .last_error
            .clone()
    }
}

/// Runs aggregation passes and publishes their results.
pub struct Refresher {
    engine: UsageEngine,
    cell: SnapshotCell,
    pass_lock: tokio::sync::Mutex<()>,
    ticks: AtomicU64,
}

impl Refresher {
    /// Create a refresher with an empty snapshot cell.
    #[must_use]
    pub fn new(engine: UsageEngine) -> Self {
        Self {
            engine,
            cell: SnapshotCell::default(),
            pass_lock: tokio::sync::Mutex::new(()),
            ticks: AtomicU64::new(0),
        }
    }

    /// Run one aggregation pass now and publish its result.
    ///
    /// # Errors
    ///
    /// Returns the engine error when the pass fails; the previously
    /// published snapshot stays visible.
    pub async fn refresh(&self) -> Result<Arc<UsageSnapshot>, EngineError> {
        let _pass = self.pass_lock.lock().await;
        let tick = self.ticks.fetch_add(1, Ordering::SeqCst) + 1;

        match self.engine.fetch_and_aggregate().await {
            Ok(usage) => {
                let snapshot = Arc::new(UsageSnapshot {
                    tick,
                    refreshed_at: Utc::now(),
                    usage,
                });
                self.cell.apply(Arc::clone(&snapshot));
                tracing::info!(
                    tick,
                    daily_buckets = snapshot.usage.daily.len(),
                    weekly_buckets = snapshot.usage.weekly.len(),
                    "Usage snapshot refreshed"
                );
                Ok(snapshot)
            }
            Err(err) => {
                tracing::warn!(tick, error = %err, "Usage refresh failed, keeping previous snapshot");
                self.cell.record_failure(RefreshFailure {
                    tick,
                    failed_at: Utc::now(),
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// The newest published snapshot.
    #[must_use]
    pub fn latest(&self) -> Option<Arc<UsageSnapshot>> {
        self.cell.latest()
    }

    /// The newest unresolved failure.
    #[must_use]
    pub fn last_error(&self) -> Option<RefreshFailure> {
        self.cell.last_error()
    }

    /// Number of passes started so far.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }

    /// Spawn the periodic refresh task. The first pass runs immediately.
    pub fn spawn(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let refresher = Arc::clone(self);
        let period = period.max(MIN_REFRESH_INTERVAL);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            tracing::info!(period_secs = period.as_secs(), "Refresh loop started");
            loop {
                ticker.tick().await;
                // Failures are logged and recorded by `refresh`.
                let _ = refresher.refresh().await;
            }
        })
    }
}
