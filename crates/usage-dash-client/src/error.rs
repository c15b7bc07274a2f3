//! Client error types.

/// Errors that can occur when using the usage-dash client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server returned an error response.
    #[error("API error: {code} - {message}")]
    Api {
        /// Error code.
        code: String,
        /// Error message.
        message: String,
        /// HTTP status code.
        status: u16,
    },

    /// No aggregation pass has succeeded yet.
    #[error("usage data not ready")]
    NotReady {
        /// Why the last pass failed, if one has.
        last_error: Option<String>,
    },

    /// The service could not read its record source.
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}
