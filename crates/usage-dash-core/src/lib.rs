//! Core types and aggregation for usage-dash.
//!
//! This crate turns raw, loosely-typed usage documents into calendar-bucketed
//! time series:
//!
//! - **Documents**: `UsageDocument` (raw projection), `UsageEvent` (coerced)
//! - **Coercion**: `coerce_timestamp`, `coerce_number`, `CoercionError`
//! - **Buckets**: `Granularity` (daily / weekly), `AggregatedBucket`
//! - **Aggregation**: `aggregate`, `AggregatedUsage`, `AggregationReport`
//!
//! # Calendar convention
//!
//! All buckets are computed in UTC. Days start at `00:00:00Z`; weeks start on
//! Monday `00:00:00Z` and end on Sunday.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use usage_dash_core::aggregate;
//!
//! let documents = vec![
//!     json!({"time": "2024-01-01T10:00:00Z", "total_tokens": 100, "cost": 1.0}),
//!     json!({"time": "2024-01-03T10:00:00Z", "total_tokens": "50", "cost": "bad"}),
//! ];
//!
//! let usage = aggregate(&documents);
//! assert_eq!(usage.daily.len(), 3);
//! assert_eq!(usage.weekly.len(), 1);
//! assert_eq!(usage.weekly[0].api_requests, 2);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod aggregate;
pub mod bucket;
pub mod coerce;
pub mod document;
pub mod error;

pub use aggregate::{aggregate, AggregatedUsage, AggregationReport};
pub use bucket::{AggregatedBucket, Granularity};
pub use coerce::{coerce_number, coerce_timestamp};
pub use document::{UsageDocument, UsageEvent};
pub use error::{CoercionError, Result};
