//! Error types for usage-dash coercion.

/// Result type for coercion operations.
pub type Result<T> = std::result::Result<T, CoercionError>;

/// Reasons a single document field could not be coerced to a typed value.
///
/// These never abort an aggregation pass. Numeric failures collapse the field
/// to `0`; timestamp failures exclude the document from bucketing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoercionError {
    /// The field is absent from the document.
    #[error("field is missing")]
    Missing,

    /// The field is present but null.
    #[error("field is null")]
    Null,

    /// The value has a shape or content that cannot be parsed.
    #[error("unparseable value: {0}")]
    Unparseable(String),

    /// The value parsed to NaN or an infinity.
    #[error("non-finite number: {0}")]
    NonFinite(String),

    /// The value is a valid number but outside the representable time range.
    #[error("timestamp out of range: {0}")]
    OutOfRange(String),
}
