//! Usage document types.
//!
//! A stored usage document is a free-form JSON object. Only three fields take
//! part in aggregation; everything else (identifiers, completion text, model
//! labels) is dropped by projecting the document into [`UsageDocument`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::coerce::{coerce_number, coerce_timestamp};
use crate::error::Result;

/// Field holding the event time.
pub const TIME_FIELD: &str = "time";

/// Field holding the token count.
pub const TOTAL_TOKENS_FIELD: &str = "total_tokens";

/// Field holding the event cost.
pub const COST_FIELD: &str = "cost";

/// The aggregatable projection of a raw usage document.
///
/// Each field keeps the raw JSON value, so "absent" (`None`) and "present but
/// null" (`Some(Value::Null)`) stay distinguishable until coercion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UsageDocument {
    /// Raw `time` value.
    pub time: Option<Value>,
    /// Raw `total_tokens` value.
    pub total_tokens: Option<Value>,
    /// Raw `cost` value.
    pub cost: Option<Value>,
}

impl UsageDocument {
    /// Project a raw document onto its aggregatable fields.
    ///
    /// Anything that is not a JSON object projects to an empty document,
    /// which then fails timestamp coercion.
    #[must_use]
    pub fn project(raw: &Value) -> Self {
        let Some(object) = raw.as_object() else {
            return Self::default();
        };

        Self {
            time: object.get(TIME_FIELD).cloned(),
            total_tokens: object.get(TOTAL_TOKENS_FIELD).cloned(),
            cost: object.get(COST_FIELD).cloned(),
        }
    }

    /// Coerce the `time` field.
    ///
    /// # Errors
    ///
    /// Returns the coercion failure when the document cannot be bucketed.
    pub fn time(&self) -> Result<DateTime<Utc>> {
        coerce_timestamp(self.time.as_ref())
    }

    /// Coerce the `total_tokens` field.
    ///
    /// # Errors
    ///
    /// Returns the coercion failure; aggregation treats it as `0`.
    pub fn total_tokens(&self) -> Result<f64> {
        coerce_number(self.total_tokens.as_ref())
    }

    /// Coerce the `cost` field.
    ///
    /// # Errors
    ///
    /// Returns the coercion failure; aggregation treats it as `0`.
    pub fn cost(&self) -> Result<f64> {
        coerce_number(self.cost.as_ref())
    }
}

impl From<&Value> for UsageDocument {
    fn from(raw: &Value) -> Self {
        Self::project(raw)
    }
}

/// A fully coerced usage event, ready to be bucketed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UsageEvent {
    /// When the event happened.
    pub time: DateTime<Utc>,
    /// Token count, `0` if the raw value was unusable.
    pub total_tokens: f64,
    /// Cost, `0` if the raw value was unusable.
    pub cost: f64,
    /// Always `1`: each document is one API request.
    pub api_requests: u64,
}

impl UsageEvent {
    /// Create an event for a single API request.
    #[must_use]
    pub fn new(time: DateTime<Utc>, total_tokens: f64, cost: f64) -> Self {
        Self {
            time,
            total_tokens,
            cost,
            api_requests: 1,
        }
    }
}
