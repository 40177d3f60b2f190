//! Integration tests for health check endpoints

mod common;

use axum::http::StatusCode;

#[tokio::test]
async fn test_health_endpoint() {
    let app = common::TestApp::new();

    let (status, body) = app.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(!body["version"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_liveness_endpoint() {
    let app = common::TestApp::new();

    let (status, body) = app.get("/health/live").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "alive");
}

#[tokio::test]
async fn test_readiness_endpoint() {
    let app = common::TestApp::new();

    let (status, body) = app.get("/health/ready").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
    assert_eq!(body["checks"]["storage"]["status"], "healthy");
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_readiness_endpoint_with_database() {
    let app = common::TestApp::with_postgres().await;

    let (status, body) = app.get("/health/ready").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_unknown_route_uses_envelope() {
    let app = common::TestApp::new();

    let (status, body) = app.get("/nonexistent").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], 404);
    assert_eq!(body["message"], "not found");
    assert!(body["data"].is_null());
}
