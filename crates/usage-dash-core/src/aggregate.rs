//! The aggregation pipeline.
//!
//! Raw documents go through projection, coercion and two independent
//! calendar groupings (daily and weekly). Both series are gap-filled between
//! the first and last occupied bucket.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::bucket::{AggregatedBucket, Granularity};
use crate::document::{UsageDocument, UsageEvent};

/// Counters describing one aggregation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationReport {
    /// Documents handed to the pipeline.
    pub documents_read: usize,
    /// Documents with a usable timestamp, placed in both series.
    pub events_bucketed: usize,
    /// Documents excluded because their `time` could not be coerced.
    pub unparseable_timestamps: usize,
    /// Bucketed events whose `total_tokens` fell back to `0`.
    pub coerced_total_tokens: usize,
    /// Bucketed events whose `cost` fell back to `0`.
    pub coerced_costs: usize,
}

/// The result of one aggregation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregatedUsage {
    /// One bucket per UTC day, ascending and gap-free.
    pub daily: Vec<AggregatedBucket>,
    /// One bucket per Monday-start UTC week, ascending and gap-free.
    pub weekly: Vec<AggregatedBucket>,
    /// Pass counters.
    pub report: AggregationReport,
}

impl AggregatedUsage {
    /// The series for a given granularity.
    #[must_use]
    pub fn series(&self, granularity: Granularity) -> &[AggregatedBucket] {
        match granularity {
            Granularity::Daily => &self.daily,
            Granularity::Weekly => &self.weekly,
        }
    }

    /// Whether no event could be bucketed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.daily.is_empty() && self.weekly.is_empty()
    }
}

/// Aggregate raw usage documents into daily and weekly series.
///
/// Never fails: documents without a usable `time` are skipped and counted,
/// unusable numeric fields count as `0`. An empty input, or one where no
/// document has a usable `time`, yields two empty series.
#[must_use]
pub fn aggregate(documents: &[Value]) -> AggregatedUsage {
    let mut report = AggregationReport {
        documents_read: documents.len(),
        ..AggregationReport::default()
    };

    let events: Vec<UsageEvent> = documents
        .iter()
        .map(UsageDocument::project)
        .filter_map(|document| coerce_document(&document, &mut report))
        .collect();

    report.events_bucketed = events.len();

    AggregatedUsage {
        daily: bucket_events(&events, Granularity::Daily),
        weekly: bucket_events(&events, Granularity::Weekly),
        report,
    }
}

/// Group events into gap-free buckets of the given granularity.
#[must_use]
pub fn bucket_events(events: &[UsageEvent], granularity: Granularity) -> Vec<AggregatedBucket> {
    let mut occupied: BTreeMap<DateTime<Utc>, AggregatedBucket> = BTreeMap::new();
    for event in events {
        let start = granularity.bucket_start(event.time);
        occupied
            .entry(start)
            .or_insert_with(|| AggregatedBucket::empty(start))
            .add(event);
    }

    let (Some(&first), Some(&last)) = (occupied.keys().next(), occupied.keys().next_back()) else {
        return Vec::new();
    };

    let mut series = Vec::with_capacity(occupied.len());
    let mut cursor = first;
    while cursor <= last {
        series.push(
            occupied
                .remove(&cursor)
                .unwrap_or_else(|| AggregatedBucket::empty(cursor)),
        );
        cursor = granularity.next(cursor);
    }
    series
}

fn coerce_document(document: &UsageDocument, report: &mut AggregationReport) -> Option<UsageEvent> {
    let time = match document.time() {
        Ok(time) => time,
        Err(err) => {
            tracing::debug!(error = %err, "Skipping usage document with unusable time");
            report.unparseable_timestamps += 1;
            return None;
        }
    };

    let total_tokens = document.total_tokens().unwrap_or_else(|_| {
        report.coerced_total_tokens += 1;
        0.0
    });
    let cost = document.cost().unwrap_or_else(|_| {
        report.coerced_costs += 1;
        0.0
    });

    Some(UsageEvent::new(time, total_tokens, cost))
}
