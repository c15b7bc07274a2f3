//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::http::Uri;
use axum::routing::{get, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::handlers::{dashboard, health, usage};
use crate::state::AppState;

/// Maximum concurrent requests for API endpoints.
const API_MAX_CONCURRENT_REQUESTS: usize = 50;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
/// - `GET /` - Redirect to `/dashboard/`
/// - `GET /dashboard/` - Dashboard page
///
/// ## API (rate-limited)
/// - `GET /api/usage` - Latest daily and weekly series
/// - `GET /api/usage/daily` - Latest daily series
/// - `GET /api/usage/weekly` - Latest weekly series
/// - `GET /api/charts` - Six chart descriptors
/// - `POST /api/refresh` - Run an aggregation pass now
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let request_timeout_seconds = state.config.request_timeout_seconds;

    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    let api_routes = Router::new()
        .route("/usage", get(usage::get_usage))
        .route("/usage/daily", get(usage::get_daily))
        .route("/usage/weekly", get(usage::get_weekly))
        .route("/charts", get(usage::get_charts))
        .route("/refresh", post(usage::refresh))
        .layer(ConcurrencyLimitLayer::new(API_MAX_CONCURRENT_REQUESTS));

    Router::new()
        .route("/health", get(health::health))
        .route("/", get(dashboard::redirect_to_dashboard))
        .route("/dashboard", get(dashboard::redirect_to_dashboard))
        .route(dashboard::DASHBOARD_PATH, get(dashboard::dashboard))
        .nest("/api", api_routes)
        .fallback(not_found)
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("no route for {}", uri.path()))
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
