//! Usage-dash HTTP service.
//!
//! This crate runs the aggregation engine on a fixed timer and serves the
//! results:
//!
//! - Daily and weekly usage series as JSON
//! - Six line chart descriptors (cost, tokens and requests per granularity)
//! - A dashboard page that renders them
//!
//! # Refresh model
//!
//! A single background task ticks every `REFRESH_INTERVAL_SECONDS` (default
//! 60). Each tick reads the whole record source, aggregates it and publishes
//! the result. A failed tick keeps the previous result visible.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Static handlers need async for routing

pub mod charts;
pub mod config;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod refresh;
pub mod routes;
pub mod state;

pub use config::ServiceConfig;
pub use engine::{EngineError, UsageEngine};
pub use error::ApiError;
pub use refresh::{Refresher, SnapshotCell, UsageSnapshot};
pub use routes::create_router;
pub use state::AppState;
