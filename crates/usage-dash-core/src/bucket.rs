//! Calendar buckets.
//!
//! Days and weeks are fixed UTC calendar periods. A week runs from Monday
//! `00:00:00Z` up to (not including) the following Monday.

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::document::UsageEvent;

/// Bucket size for a time series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    /// One UTC calendar day.
    Daily,
    /// One Monday-start UTC calendar week.
    Weekly,
}

impl Granularity {
    /// Get the granularity name as a string.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
        }
    }

    /// Length of one bucket.
    #[must_use]
    pub fn period(self) -> Duration {
        match self {
            Self::Daily => Duration::days(1),
            Self::Weekly => Duration::days(7),
        }
    }

    /// Start of the bucket containing `instant`.
    #[must_use]
    pub fn bucket_start(self, instant: DateTime<Utc>) -> DateTime<Utc> {
        let date = instant.date_naive();
        let date = match self {
            Self::Daily => date,
            Self::Weekly => {
                date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
            }
        };
        date.and_time(NaiveTime::default()).and_utc()
    }

    /// Start of the bucket following the one starting at `bucket_start`.
    #[must_use]
    pub fn next(self, bucket_start: DateTime<Utc>) -> DateTime<Utc> {
        bucket_start + self.period()
    }
}

/// Sums for one time bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregatedBucket {
    /// Inclusive start of the bucket.
    pub bucket_start: DateTime<Utc>,
    /// Sum of coerced `total_tokens`.
    pub total_tokens: f64,
    /// Sum of coerced `cost`.
    pub total_cost: f64,
    /// Number of events in the bucket.
    pub api_requests: u64,
}

impl AggregatedBucket {
    /// A bucket with no contributing events.
    #[must_use]
    pub fn empty(bucket_start: DateTime<Utc>) -> Self {
        Self {
            bucket_start,
            total_tokens: 0.0,
            total_cost: 0.0,
            api_requests: 0,
        }
    }

    /// Add one event's measures to the bucket.
    pub fn add(&mut self, event: &UsageEvent) {
        self.total_tokens += event.total_tokens;
        self.total_cost += event.cost;
        self.api_requests += event.api_requests;
    }

    /// Whether no event contributed to this bucket.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.api_requests == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn daily_bucket_is_midnight() {
        assert_eq!(
            Granularity::Daily.bucket_start(utc(2024, 1, 3, 17)),
            utc(2024, 1, 3, 0)
        );
    }

    #[test]
    fn weekly_bucket_starts_monday() {
        // 2024-01-01 is a Monday; 2024-01-07 is the Sunday closing that week.
        assert_eq!(
            Granularity::Weekly.bucket_start(utc(2024, 1, 1, 0)),
            utc(2024, 1, 1, 0)
        );
        assert_eq!(
            Granularity::Weekly.bucket_start(utc(2024, 1, 7, 23)),
            utc(2024, 1, 1, 0)
        );
        assert_eq!(
            Granularity::Weekly.bucket_start(utc(2024, 1, 8, 0)),
            utc(2024, 1, 8, 0)
        );
    }

    #[test]
    fn weekly_bucket_crosses_year_boundary() {
        // Wednesday 2025-01-01 belongs to the week starting Monday 2024-12-30.
        assert_eq!(
            Granularity::Weekly.bucket_start(utc(2025, 1, 1, 12)),
            utc(2024, 12, 30, 0)
        );
    }

    #[test]
    fn next_advances_one_period() {
        assert_eq!(Granularity::Daily.next(utc(2024, 2, 28, 0)), utc(2024, 2, 29, 0));
        assert_eq!(Granularity::Weekly.next(utc(2024, 1, 1, 0)), utc(2024, 1, 8, 0));
    }

    #[test]
    fn bucket_add_sums_measures() {
        let mut bucket = AggregatedBucket::empty(utc(2024, 1, 1, 0));
        assert!(bucket.is_empty());

        bucket.add(&UsageEvent::new(utc(2024, 1, 1, 3), 100.0, 1.0));
        bucket.add(&UsageEvent::new(utc(2024, 1, 1, 4), 50.0, 0.5));

        assert_eq!(bucket.total_tokens, 150.0);
        assert_eq!(bucket.total_cost, 1.5);
        assert_eq!(bucket.api_requests, 2);
        assert!(!bucket.is_empty());
    }

    #[test]
    fn granularity_as_str() {
        assert_eq!(Granularity::Daily.as_str(), "daily");
        assert_eq!(Granularity::Weekly.as_str(), "weekly");
    }
}
