//! Explicit coercion of loosely-typed document fields.
//!
//! Documents come from a schemaless store, so a field that is "a number" may
//! arrive as a JSON number, a numeric string, a boolean, or an Extended-JSON
//! wrapper such as `{"$numberLong": "42"}`. Timestamps are similarly loose.
//! Each function here returns a typed value or the reason it could not.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::{Map, Value};

use crate::error::{CoercionError, Result};

/// Extended-JSON keys that wrap a number encoded as a string.
const EXTENDED_NUMBER_KEYS: [&str; 4] = [
    "$numberInt",
    "$numberLong",
    "$numberDouble",
    "$numberDecimal",
];

/// Extended-JSON key that wraps a date.
const EXTENDED_DATE_KEY: &str = "$date";

/// Naive (offset-less) datetime layouts, interpreted as UTC.
const NAIVE_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Datetime layouts carrying an explicit offset, beyond strict RFC 3339.
const OFFSET_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"];

/// Earliest calendar year accepted for a timestamp.
const MIN_YEAR: i32 = 1;

/// Latest calendar year accepted for a timestamp.
const MAX_YEAR: i32 = 9999;

/// Coerce a document field to a finite `f64`.
///
/// Accepts JSON numbers, numeric strings (surrounding whitespace ignored),
/// booleans (`true` = 1, `false` = 0) and Extended-JSON number wrappers.
///
/// # Errors
///
/// Returns a [`CoercionError`] describing why the value is not a usable
/// number. Callers aggregating usage treat every error as `0`.
pub fn coerce_number(value: Option<&Value>) -> Result<f64> {
    let number = match value.ok_or(CoercionError::Missing)? {
        Value::Null => return Err(CoercionError::Null),
        Value::Bool(flag) => {
            if *flag {
                1.0
            } else {
                0.0
            }
        }
        Value::Number(number) => number
            .as_f64()
            .ok_or_else(|| CoercionError::Unparseable(number.to_string()))?,
        Value::String(raw) => parse_number_str(raw)?,
        Value::Object(map) => extended_number(map)?,
        other @ Value::Array(_) => return Err(CoercionError::Unparseable(other.to_string())),
    };

    if number.is_finite() {
        Ok(number)
    } else {
        Err(CoercionError::NonFinite(number.to_string()))
    }
}

/// Coerce a document field to an absolute UTC instant.
///
/// Accepts RFC 3339 strings, naive datetime strings (read as UTC), bare
/// `YYYY-MM-DD` dates (midnight UTC), JSON numbers as Unix epoch
/// milliseconds, and Extended-JSON `{"$date": ...}` wrappers.
///
/// # Errors
///
/// Returns a [`CoercionError`] when the value is absent, null, not a
/// recognised timestamp, or outside years 1 through 9999.
pub fn coerce_timestamp(value: Option<&Value>) -> Result<DateTime<Utc>> {
    let instant = match value.ok_or(CoercionError::Missing)? {
        Value::Null => return Err(CoercionError::Null),
        Value::String(raw) => parse_timestamp_str(raw)?,
        Value::Number(number) => epoch_millis(number)?,
        Value::Object(map) => extended_date(map)?,
        other => return Err(CoercionError::Unparseable(other.to_string())),
    };

    if (MIN_YEAR..=MAX_YEAR).contains(&instant.year()) {
        Ok(instant)
    } else {
        Err(CoercionError::OutOfRange(instant.to_rfc3339()))
    }
}

fn parse_number_str(raw: &str) -> Result<f64> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| CoercionError::Unparseable(raw.to_string()))
}

fn extended_number(map: &Map<String, Value>) -> Result<f64> {
    let wrapped = EXTENDED_NUMBER_KEYS
        .iter()
        .find_map(|key| map.get(*key))
        .filter(|_| map.len() == 1)
        .ok_or_else(|| CoercionError::Unparseable(Value::Object(map.clone()).to_string()))?;

    match wrapped {
        Value::String(raw) => parse_number_str(raw),
        Value::Number(number) => number
            .as_f64()
            .ok_or_else(|| CoercionError::Unparseable(number.to_string())),
        other => Err(CoercionError::Unparseable(other.to_string())),
    }
}

fn parse_timestamp_str(raw: &str) -> Result<DateTime<Utc>> {
    let trimmed = raw.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }

    for format in OFFSET_DATETIME_FORMATS {
        if let Ok(parsed) = DateTime::parse_from_str(trimmed, format) {
            return Ok(parsed.with_timezone(&Utc));
        }
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(parsed.and_utc());
        }
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map(|date| date.and_time(NaiveTime::default()).and_utc())
        .map_err(|_| CoercionError::Unparseable(raw.to_string()))
}

#[allow(clippy::cast_possible_truncation)]
fn epoch_millis(number: &serde_json::Number) -> Result<DateTime<Utc>> {
    let millis = match number.as_i64() {
        Some(millis) => millis,
        None => {
            let float = number
                .as_f64()
                .filter(|value| value.is_finite())
                .ok_or_else(|| CoercionError::Unparseable(number.to_string()))?;
            // Saturating cast; out-of-range values are rejected just below.
            float.round() as i64
        }
    };

    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| CoercionError::OutOfRange(number.to_string()))
}

fn extended_date(map: &Map<String, Value>) -> Result<DateTime<Utc>> {
    let wrapped = map
        .get(EXTENDED_DATE_KEY)
        .filter(|_| map.len() == 1)
        .ok_or_else(|| CoercionError::Unparseable(Value::Object(map.clone()).to_string()))?;

    match wrapped {
        Value::String(raw) => parse_timestamp_str(raw),
        Value::Number(number) => epoch_millis(number),
        Value::Object(inner) => {
            let raw = inner
                .get("$numberLong")
                .and_then(Value::as_str)
                .ok_or_else(|| CoercionError::Unparseable(wrapped.to_string()))?;
            let millis = raw
                .trim()
                .parse::<i64>()
                .map_err(|_| CoercionError::Unparseable(raw.to_string()))?;
            DateTime::from_timestamp_millis(millis)
                .ok_or_else(|| CoercionError::OutOfRange(raw.to_string()))
        }
        other => Err(CoercionError::Unparseable(other.to_string())),
    }
}
