//! Error types for usage-dash record sources.

/// Result type for record source operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur while reading or writing usage documents.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The source could not be reached or the read did not complete.
    #[error("source unavailable: {0}")]
    Unavailable(String),

    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The document cannot be stored.
    #[error("invalid document: {0}")]
    InvalidDocument(String),
}
