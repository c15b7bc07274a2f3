//! Common test utilities for usage-dash integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum_test::TestServer;
use serde_json::Value;

use usage_dash_service::{create_router, AppState, ServiceConfig};
use usage_dash_store::{MemorySource, RecordSource, StoreError};

/// An in-memory source that can be switched offline.
#[derive(Default)]
pub struct SwitchableSource {
    pub documents: MemorySource,
    offline: AtomicBool,
}

impl SwitchableSource {
    /// Make every subsequent read fail (or succeed again).
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }
}

#[async_trait]
impl RecordSource for SwitchableSource {
    async fn fetch_all(&self) -> usage_dash_store::Result<Vec<Value>> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".into()));
        }
        self.documents.fetch_all().await
    }

    fn backend(&self) -> &'static str {
        "switchable"
    }
}

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// The record source behind the service.
    pub source: Arc<SwitchableSource>,
    /// Shared application state, for driving refresh passes directly.
    pub state: AppState,
}

impl TestHarness {
    /// Create a new test harness over an empty source.
    pub fn new() -> Self {
        Self::with_documents(Vec::new())
    }

    /// Create a new test harness seeded with documents.
    pub fn with_documents(documents: Vec<Value>) -> Self {
        let source = Arc::new(SwitchableSource::default());
        source.documents.replace(documents);

        let config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            data_dir: "unused".into(),
            secondary_dir: "unused-secondary".into(),
            refresh_interval_seconds: 60,
            source_read_timeout_seconds: 5,
            request_timeout_seconds: 30,
            cors_origins: vec!["*".into()],
        };

        let state = AppState::new(source.clone(), config);
        let router: Router = create_router(state.clone());

        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            source,
            state,
        }
    }

    /// Run one aggregation pass through the API.
    pub async fn refresh(&self) -> Value {
        let response = self.server.post("/api/refresh").await;
        response.assert_status_ok();
        response.json()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
