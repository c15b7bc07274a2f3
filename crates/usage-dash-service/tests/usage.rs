//! Usage endpoint integration tests.

mod common;

use axum::http::StatusCode;
use common::TestHarness;
use serde_json::{json, Value};

fn sample_documents() -> Vec<Value> {
    vec![
        json!({"_id": "a", "time": "2024-01-01T08:00:00Z", "total_tokens": 100, "cost": 1.0, "model_name": "gpt-4o"}),
        json!({"_id": "b", "time": "2024-01-01T09:00:00Z", "total_tokens": null, "cost": 0.5}),
        json!({"_id": "c", "time": "2024-01-01T10:00:00Z", "total_tokens": 50, "cost": "bad"}),
    ]
}

#[tokio::test]
async fn usage_before_first_refresh_is_not_ready() {
    let harness = TestHarness::with_documents(sample_documents());

    let response = harness.server.get("/api/usage").await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "not_ready");
}

#[tokio::test]
async fn refresh_then_read_usage() {
    let harness = TestHarness::with_documents(sample_documents());

    let refreshed = harness.refresh().await;
    assert_eq!(refreshed["tick"], 1);

    let response = harness.server.get("/api/usage").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["tick"], 1);
    assert_eq!(body["daily"].as_array().unwrap().len(), 1);
    assert_eq!(body["daily"][0]["total_tokens"], 150.0);
    assert_eq!(body["daily"][0]["total_cost"], 1.5);
    assert_eq!(body["daily"][0]["api_requests"], 3);
    assert_eq!(body["weekly"].as_array().unwrap().len(), 1);
    assert_eq!(body["report"]["documents_read"], 3);
    assert_eq!(body["report"]["coerced_total_tokens"], 1);
    assert_eq!(body["report"]["coerced_costs"], 1);
    assert!(body.get("last_error").is_none());
}

#[tokio::test]
async fn daily_series_fills_gaps() {
    let harness = TestHarness::with_documents(vec![
        json!({"time": "2024-01-01T00:00:00Z", "total_tokens": 10}),
        json!({"time": "2024-01-03T00:00:00Z", "total_tokens": 30}),
    ]);
    harness.refresh().await;

    let response = harness.server.get("/api/usage/daily").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["granularity"], "daily");
    let buckets = body["buckets"].as_array().unwrap();
    let tokens: Vec<_> = buckets
        .iter()
        .map(|b| b["total_tokens"].as_f64().unwrap())
        .collect();
    assert_eq!(tokens, vec![10.0, 0.0, 30.0]);
    assert_eq!(buckets[1]["api_requests"], 0);
}

#[tokio::test]
async fn weekly_series_starts_on_monday() {
    let harness = TestHarness::with_documents(vec![
        // Wednesday and the following Sunday fall in the same week.
        json!({"time": "2024-01-03T12:00:00Z", "total_tokens": 1, "cost": 0.25}),
        json!({"time": "2024-01-07T23:59:59Z", "total_tokens": 2, "cost": 0.5}),
        json!({"time": "2024-01-08T00:00:00Z", "total_tokens": 4, "cost": 1.0}),
    ]);
    harness.refresh().await;

    let response = harness.server.get("/api/usage/weekly").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["granularity"], "weekly");
    let buckets = body["buckets"].as_array().unwrap();
    assert_eq!(buckets.len(), 2);
    assert!(buckets[0]["bucket_start"]
        .as_str()
        .unwrap()
        .starts_with("2024-01-01"));
    assert_eq!(buckets[0]["total_tokens"], 3.0);
    assert_eq!(buckets[0]["api_requests"], 2);
    assert!(buckets[1]["bucket_start"]
        .as_str()
        .unwrap()
        .starts_with("2024-01-08"));
}

#[tokio::test]
async fn empty_source_gives_empty_series() {
    let harness = TestHarness::new();
    harness.refresh().await;

    let response = harness.server.get("/api/usage").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert!(body["daily"].as_array().unwrap().is_empty());
    assert!(body["weekly"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn charts_describe_six_series() {
    let harness = TestHarness::with_documents(sample_documents());
    harness.refresh().await;

    let response = harness.server.get("/api/charts").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["refresh_interval_seconds"], 60);

    let charts = body["charts"].as_array().unwrap();
    let titles: Vec<_> = charts.iter().map(|c| c["title"].as_str().unwrap()).collect();
    assert_eq!(
        titles,
        vec![
            "Daily Cost",
            "Daily Total Tokens",
            "Daily API Requests",
            "Weekly Cost",
            "Weekly Total Tokens",
            "Weekly API Requests",
        ]
    );
    assert_eq!(charts[0]["color"], "firebrick");
    assert_eq!(charts[0]["points"][0]["y"], 1.5);
    assert_eq!(charts[2]["points"][0]["y"], 3.0);
}

#[tokio::test]
async fn failed_refresh_keeps_previous_snapshot() {
    let harness = TestHarness::with_documents(sample_documents());
    harness.refresh().await;

    harness.source.set_offline(true);
    let response = harness.server.post("/api/refresh").await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "source_unavailable");

    let response = harness.server.get("/api/usage").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["tick"], 1);
    assert_eq!(body["daily"][0]["api_requests"], 3);
    assert_eq!(body["last_error"]["tick"], 2);

    harness.source.set_offline(false);
    harness.refresh().await;
    let body: Value = harness.server.get("/api/usage").await.json();
    assert_eq!(body["tick"], 3);
    assert!(body.get("last_error").is_none());
}

#[tokio::test]
async fn not_ready_reports_last_error() {
    let harness = TestHarness::new();
    harness.source.set_offline(true);

    let _ = harness.state.refresher.refresh().await;

    let response = harness.server.get("/api/charts").await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "not_ready");
    assert!(body["error"]["details"]["last_error"]
        .as_str()
        .unwrap()
        .contains("connection refused"));
}

#[tokio::test]
async fn new_documents_show_up_after_refresh() {
    let harness = TestHarness::new();
    harness.refresh().await;

    harness
        .source
        .documents
        .push(json!({"time": "2024-02-01T00:00:00Z", "total_tokens": 7}));

    let before: Value = harness.server.get("/api/usage/daily").await.json();
    assert!(before["buckets"].as_array().unwrap().is_empty());

    harness.refresh().await;
    let after: Value = harness.server.get("/api/usage/daily").await.json();
    assert_eq!(after["buckets"][0]["total_tokens"], 7.0);
}
