//! Usage-dash HTTP client implementation.

use reqwest::Client;
use std::time::Duration;

use crate::error::ClientError;
use crate::types::{
    ApiErrorResponse, ChartsResponse, HealthResponse, SeriesResponse, UsageResponse,
};

/// Usage-dash API client.
///
/// Reads the latest aggregated series and chart descriptors, and can trigger
/// a refresh pass.
#[derive(Debug, Clone)]
pub struct UsageDashClient {
    client: Client,
    base_url: String,
}

impl UsageDashClient {
    /// Create a new usage-dash client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the service (e.g., `"http://usage-dash:8080"`)
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Configuration` if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::with_options(base_url, ClientOptions::default())
    }

    /// Create a new usage-dash client with custom options.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Configuration` if the base URL is empty or the
    /// HTTP client cannot be built.
    pub fn with_options(
        base_url: impl Into<String>,
        options: ClientOptions,
    ) -> Result<Self, ClientError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ClientError::Configuration("base URL is empty".into()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_seconds))
            .build()
            .map_err(|e| ClientError::Configuration(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    /// Check service health.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn health(&self) -> Result<HealthResponse, ClientError> {
        self.get("/health").await
    }

    /// Get the latest daily and weekly series.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotReady` before the service's first successful
    /// pass, or another error if the request fails.
    pub async fn usage(&self) -> Result<UsageResponse, ClientError> {
        self.get("/api/usage").await
    }

    /// Get the latest daily series.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn daily(&self) -> Result<SeriesResponse, ClientError> {
        self.get("/api/usage/daily").await
    }

    /// Get the latest weekly series.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn weekly(&self) -> Result<SeriesResponse, ClientError> {
        self.get("/api/usage/weekly").await
    }

    /// Get the six dashboard chart descriptors.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn charts(&self) -> Result<ChartsResponse, ClientError> {
        self.get("/api/charts").await
    }

    /// Ask the service to run an aggregation pass now.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::SourceUnavailable` if the pass could not read
    /// the record source.
    pub async fn refresh(&self) -> Result<UsageResponse, ClientError> {
        let url = format!("{}/api/refresh", self.base_url);
        tracing::debug!(url = %url, "Requesting usage refresh");

        let response = self.client.post(&url).send().await?;

        self.handle_response(response).await
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = format!("{}{path}", self.base_url);

        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// Handle API response and convert errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        // Try to parse error response
        let error_body: Result<ApiErrorResponse, _> = response.json().await;

        match error_body {
            Ok(api_error) => {
                let code = api_error.error.code.as_str();
                let message = api_error.error.message;

                // Map specific error codes to typed errors
                match code {
                    "not_ready" => {
                        let last_error = api_error
                            .error
                            .details
                            .as_ref()
                            .and_then(|d| d.get("last_error"))
                            .and_then(serde_json::Value::as_str)
                            .map(str::to_string);

                        Err(ClientError::NotReady { last_error })
                    }
                    "source_unavailable" => Err(ClientError::SourceUnavailable(message)),
                    _ => Err(ClientError::Api {
                        code: code.to_string(),
                        message,
                        status: status.as_u16(),
                    }),
                }
            }
            Err(_) => Err(ClientError::Api {
                code: "unknown".to_string(),
                message: format!("HTTP {status}"),
                status: status.as_u16(),
            }),
        }
    }
}

/// Client options for customization.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Request timeout in seconds (default: 30).
    pub timeout_seconds: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
        }
    }
}
