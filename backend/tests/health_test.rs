//! Integration tests for health check endpoints
//!
//! Liveness needs no backing services; readiness requires PostgreSQL.

mod common;

use axum::http::StatusCode;
use common::TestApp;

#[tokio::test]
#[ignore = "requires database"]
async fn test_health_endpoint() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "healthy");
    assert!(json["version"].as_str().is_some());
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_liveness_endpoint() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/health/live", None).await;
    assert_eq!(status, StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "alive");
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_readiness_endpoint() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/health/ready", None).await;
    assert_eq!(status, StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "ready");
    assert_eq!(json["checks"]["database"]["status"], "healthy");
    assert_eq!(json["checks"]["session_store"]["status"], "healthy");
}
