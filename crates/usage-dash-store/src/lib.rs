//! Record sources for usage-dash.
//!
//! A record source is the document collection usage events are read from.
//! The aggregation engine only ever reads a full snapshot of it; writes exist
//! so the collection can be populated by whatever records the usage.
//!
//! # Backends
//!
//! - [`RocksSource`]: persistent `RocksDB` collection (feature `rocksdb-backend`)
//! - [`MemorySource`]: in-memory collection for tests and local runs
//!
//! # Example
//!
#![cfg_attr(feature = "rocksdb-backend", doc = "```no_run")]
#![cfg_attr(not(feature = "rocksdb-backend"), doc = "```ignore")]
//! use serde_json::json;
//! use usage_dash_store::{RecordSource, RocksSource};
//!
//! # async fn example() -> usage_dash_store::Result<()> {
//! let source = RocksSource::open("/tmp/usage-dash-db")?;
//!
//! source.insert(&json!({
//!     "time": "2024-01-01T12:00:00Z",
//!     "total_tokens": 420,
//!     "cost": 0.0042,
//! }))?;
//!
//! let documents = source.fetch_all().await?;
//! assert_eq!(documents.len(), 1);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod memory;
#[cfg(feature = "rocksdb-backend")]
pub mod rocks;
pub mod schema;

pub use error::{Result, StoreError};
pub use memory::MemorySource;
#[cfg(feature = "rocksdb-backend")]
pub use rocks::RocksSource;

use async_trait::async_trait;
use serde_json::Value;

/// Read contract for a usage document collection.
///
/// Implementations return every stored document as raw JSON. Documents are
/// not validated here; coercion is the aggregation engine's job.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Load the full collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be read. Individual
    /// unreadable records are skipped, not reported as errors.
    async fn fetch_all(&self) -> Result<Vec<Value>>;

    /// Short backend name for logs.
    fn backend(&self) -> &'static str;
}
