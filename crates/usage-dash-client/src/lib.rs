//! Usage-dash Client SDK.
//!
//! This crate provides a client library for reading aggregated usage from the
//! usage-dash service.
//!
//! # Example
//!
//! ```no_run
//! use usage_dash_client::UsageDashClient;
//!
//! # async fn example() -> Result<(), usage_dash_client::ClientError> {
//! let client = UsageDashClient::new("http://usage-dash:8080")?;
//!
//! let daily = client.daily().await?;
//! for bucket in &daily.buckets {
//!     println!(
//!         "{}: {} tokens, ${:.2}, {} requests",
//!         bucket.bucket_start.date_naive(),
//!         bucket.total_tokens,
//!         bucket.total_cost,
//!         bucket.api_requests,
//!     );
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod client;
mod error;
mod types;

pub use client::{ClientOptions, UsageDashClient};
pub use error::ClientError;
pub use types::*;
pub use usage_dash_core::{AggregatedBucket, AggregationReport, Granularity};
