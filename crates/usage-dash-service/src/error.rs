//! API error types and responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::engine::EngineError;

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No aggregation pass has succeeded yet.
    #[error("usage data not ready")]
    NotReady {
        /// Why the last pass failed, if one has.
        last_error: Option<String>,
    },

    /// The record source could not be read.
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            Self::NotReady { last_error } => (
                StatusCode::SERVICE_UNAVAILABLE,
                "not_ready",
                self.to_string(),
                last_error
                    .as_ref()
                    .map(|reason| serde_json::json!({ "last_error": reason })),
            ),
            Self::SourceUnavailable(msg) => {
                tracing::warn!(error = %msg, "Record source unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "source_unavailable",
                    msg.clone(),
                    None,
                )
            }
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone(), None),
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::SourceUnavailable { .. } => Self::SourceUnavailable(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        let cases = [
            (
                ApiError::NotReady { last_error: None },
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                ApiError::SourceUnavailable("offline".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (ApiError::NotFound("/nope".into()), StatusCode::NOT_FOUND),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn engine_error_maps_to_source_unavailable() {
        let err = ApiError::from(EngineError::SourceUnavailable {
            backend: "rocksdb",
            reason: "read timed out after 10000ms".into(),
        });

        assert!(matches!(err, ApiError::SourceUnavailable(msg) if msg.contains("timed out")));
    }
}
