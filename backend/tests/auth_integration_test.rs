//! Integration tests for login and the account lifecycle over HTTP

mod common;

use axum::http::StatusCode;
use fiqh_qa_backend::config::StorageBackend;
use serde_json::json;

#[tokio::test]
async fn test_register_returns_profile_envelope() {
    let app = common::TestApp::new();

    let (status, body) = app
        .post(
            "/users",
            json!({ "username": "amina", "name": "Amina", "password": "secret1" }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], 200);
    assert_eq!(body["message"], "ok");
    assert_eq!(body["data"]["id"], 1);
    assert_eq!(body["data"]["username"], "amina");
    assert_eq!(body["data"]["name"], "Amina");
    assert!(body["data"].get("password_hash").is_none());
}

#[tokio::test]
async fn test_register_duplicate_username() {
    let app = common::TestApp::new();
    app.register("amina", "secret1").await;

    let (status, body) = app
        .post(
            "/users",
            json!({ "username": "amina", "name": "Other", "password": "another1" }),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], 409);
    assert_eq!(body["message"], "conflict");
}

#[tokio::test]
async fn test_register_invalid_fields() {
    let app = common::TestApp::new();

    for body in [
        json!({ "username": "a", "name": "Amina", "password": "secret1" }),
        json!({ "username": "amina!", "name": "Amina", "password": "secret1" }),
        json!({ "username": "amina", "name": "   ", "password": "secret1" }),
        json!({ "username": "amina", "name": "Amina", "password": "123" }),
        json!({ "username": "amina" }),
    ] {
        let (status, response) = app.post("/users", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response["message"], "bad request");
    }
}

#[tokio::test]
async fn test_login_success() {
    let app = common::TestApp::new();
    app.register("amina", "secret1").await;

    let (status, body) = app
        .post("/login", json!({ "username": "amina", "password": "secret1" }))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["token_type"], "Bearer");
    assert_eq!(body["data"]["expires_in"], 3600);
    assert_eq!(body["data"]["user"]["username"], "amina");
    assert!(!body["data"]["access_token"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let app = common::TestApp::new();
    app.register("amina", "secret1").await;

    let (unknown_status, unknown_body) = app
        .post("/login", json!({ "username": "nobody", "password": "secret1" }))
        .await;
    let (wrong_status, wrong_body) = app
        .post("/login", json!({ "username": "amina", "password": "wrong-password" }))
        .await;

    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, wrong_status);
    assert_eq!(unknown_body, wrong_body);
}

#[tokio::test]
async fn test_detailed_errors_expose_message() {
    let mut config = common::test_config(StorageBackend::Memory);
    config.server.detailed_errors = true;
    let app = common::TestApp::with_config(config);

    let (status, body) = app
        .post("/login", json!({ "username": "nobody", "password": "secret1" }))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid credentials");
}

#[tokio::test]
async fn test_password_change_scenario() {
    let app = common::TestApp::new();

    let user = app.register("amina", "secret1").await;
    assert_eq!(user["id"], 1);

    let token = app.login("amina", "secret1").await;

    let (status, _) = app
        .post("/login", json!({ "username": "amina", "password": "wrong" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .patch_authed(
            "/users/me/password",
            json!({ "current_password": "secret1", "new_password": "secret2" }),
            &token,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "ok");
    assert!(body["data"].is_null());

    let (status, _) = app
        .post("/login", json!({ "username": "amina", "password": "secret1" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    app.login("amina", "secret2").await;
}

#[tokio::test]
async fn test_password_change_with_wrong_current_password() {
    let app = common::TestApp::new();
    app.register("amina", "secret1").await;
    let token = app.login("amina", "secret1").await;

    let (status, _) = app
        .patch_authed(
            "/users/me/password",
            json!({ "current_password": "not-it", "new_password": "secret2" }),
            &token,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Old password still works
    app.login("amina", "secret1").await;
}

#[tokio::test]
async fn test_protected_route_requires_token() {
    let app = common::TestApp::new();

    let (status, body) = app.get("/users/me").await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "unauthorized");
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_password_change_scenario_with_database() {
    let app = common::TestApp::with_postgres().await;
    let username = common::unique_username("amina");

    app.register(&username, "secret1").await;
    let token = app.login(&username, "secret1").await;

    let (status, _) = app
        .patch_authed(
            "/users/me/password",
            json!({ "current_password": "secret1", "new_password": "secret2" }),
            &token,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    app.login(&username, "secret2").await;
}
