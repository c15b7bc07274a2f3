//! Service configuration.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Default refresh period, matching the dashboard's one-minute redraw.
pub const DEFAULT_REFRESH_INTERVAL_SECONDS: u64 = 60;

/// Default bound on a single record source read.
pub const DEFAULT_SOURCE_READ_TIMEOUT_SECONDS: u64 = 10;

/// Default scratch directory for the secondary handle.
pub const DEFAULT_SECONDARY_DIR: &str = "/tmp/usage-dash-secondary";

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// Path to the `RocksDB` usage collection (default: "/data/usage-dash").
    pub data_dir: String,

    /// Scratch directory for the read-only secondary handle on `data_dir`
    /// (default: "/tmp/usage-dash-secondary").
    pub secondary_dir: String,

    /// Seconds between refresh ticks (default: 60, minimum 1).
    pub refresh_interval_seconds: u64,

    /// Seconds a record source read may take before the tick fails (default: 10).
    pub source_read_timeout_seconds: u64,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,
}

/// Source secrets file structure.
#[derive(Debug, Deserialize)]
struct SourceSecrets {
    data_dir: String,
}

impl ServiceConfig {
    /// Load configuration from environment variables and secrets files.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            data_dir: load_data_dir(),
            secondary_dir: std::env::var("SECONDARY_DIR")
                .unwrap_or_else(|_| DEFAULT_SECONDARY_DIR.into()),
            refresh_interval_seconds: env_u64(
                "REFRESH_INTERVAL_SECONDS",
                DEFAULT_REFRESH_INTERVAL_SECONDS,
            )
            .max(1),
            source_read_timeout_seconds: env_u64(
                "SOURCE_READ_TIMEOUT_SECONDS",
                DEFAULT_SOURCE_READ_TIMEOUT_SECONDS,
            )
            .max(1),
            request_timeout_seconds: env_u64("REQUEST_TIMEOUT_SECONDS", 30),
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
        }
    }

    /// Period between refresh ticks.
    #[must_use]
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_seconds)
    }

    /// Bound on one record source read.
    #[must_use]
    pub fn source_read_timeout(&self) -> Duration {
        Duration::from_secs(self.source_read_timeout_seconds)
    }
}

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Load the collection location from a secrets file, falling back to `DATA_DIR`.
fn load_data_dir() -> String {
    let secret_paths = [
        ".secrets/source.json",
        "usage-dash/.secrets/source.json",
        "../.secrets/source.json",
    ];

    for path in &secret_paths {
        if let Ok(secrets) = load_secrets_file::<SourceSecrets>(path) {
            tracing::info!(path = %path, "Loaded source settings from file");
            return secrets.data_dir;
        }
    }

    tracing::debug!("Source secrets file not found, using environment variables");
    std::env::var("DATA_DIR").unwrap_or_else(|_| "/data/usage-dash".into())
}

/// Load secrets from a JSON file.
fn load_secrets_file<T: serde::de::DeserializeOwned>(path: &str) -> Result<T, std::io::Error> {
    let path = Path::new(path);
    if !path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Secrets file not found",
        ));
    }
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            data_dir: "/data/usage-dash".into(),
            secondary_dir: DEFAULT_SECONDARY_DIR.into(),
            refresh_interval_seconds: DEFAULT_REFRESH_INTERVAL_SECONDS,
            source_read_timeout_seconds: DEFAULT_SOURCE_READ_TIMEOUT_SECONDS,
            request_timeout_seconds: 30,
            cors_origins: vec!["*".into()],
        }
    }
}
