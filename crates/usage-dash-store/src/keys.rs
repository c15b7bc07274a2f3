//! Key encoding utilities for `RocksDB`.
//!
//! Documents are keyed by their own `_id` when it is a string or an
//! Extended-JSON `{"$oid": "..."}`; otherwise a random UUID is assigned.

use serde_json::Value;

/// Field holding a document's identifier.
pub const ID_FIELD: &str = "_id";

/// Resolve the identifier a document is stored under.
#[must_use]
pub fn document_id(document: &Value) -> String {
    match document.get(ID_FIELD) {
        Some(Value::String(id)) if !id.is_empty() => id.clone(),
        Some(Value::Object(map)) => match map.get("$oid") {
            Some(Value::String(oid)) if !oid.is_empty() => oid.clone(),
            _ => uuid::Uuid::new_v4().to_string(),
        },
        _ => uuid::Uuid::new_v4().to_string(),
    }
}

/// Create a usage document key from a document ID.
#[must_use]
pub fn usage_event_key(document_id: &str) -> Vec<u8> {
    document_id.as_bytes().to_vec()
}
