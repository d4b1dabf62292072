//! Integration tests for the admin session and message API.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//! - The API running (cargo run -p portfolio-api)
//! - An admin account created via:
//!   `portfolio-cli admin create -u integration -p integration-secret`
//!
//! Run with: cargo test -p portfolio-integration-tests -- --ignored

use portfolio_integration_tests::{api_base_url, client};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

/// Log in with the integration test account and return the session client.
async fn authenticated_client() -> Client {
    let client = client();
    let base_url = api_base_url();

    let resp = client
        .post(format!("{base_url}/admin/login"))
        .json(&json!({
            "username": std::env::var("TEST_ADMIN_USER").unwrap_or_else(|_| "integration".into()),
            "password": std::env::var("TEST_ADMIN_PASS")
                .unwrap_or_else(|_| "integration-secret".into()),
        }))
        .send()
        .await
        .expect("login request failed");

    assert_eq!(resp.status(), StatusCode::OK, "admin login failed");
    client
}

#[tokio::test]
#[ignore = "Requires running API, database, and admin account"]
async fn test_admin_endpoints_require_session() {
    let client = client();
    let base_url = api_base_url();

    let resp = client
        .get(format!("{base_url}/admin/messages"))
        .send()
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running API, database, and admin account"]
async fn test_login_check_logout_lifecycle() {
    let client = authenticated_client().await;
    let base_url = api_base_url();

    let resp = client
        .get(format!("{base_url}/admin/check"))
        .send()
        .await
        .expect("check request failed");
    let body: Value = resp.json().await.expect("invalid body");
    assert_eq!(body["authenticated"], true);
    assert!(body["session_id"].is_string());

    let resp = client
        .post(format!("{base_url}/admin/logout"))
        .send()
        .await
        .expect("logout request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .get(format!("{base_url}/admin/check"))
        .send()
        .await
        .expect("check request failed");
    let body: Value = resp.json().await.expect("invalid body");
    assert_eq!(body["authenticated"], false);
}

#[tokio::test]
#[ignore = "Requires running API, database, and admin account"]
async fn test_invalid_credentials_rejected() {
    let client = client();
    let base_url = api_base_url();

    let resp = client
        .post(format!("{base_url}/admin/login"))
        .json(&json!({"username": "integration", "password": "definitely wrong"}))
        .send()
        .await
        .expect("login request failed");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running API, database, and admin account"]
async fn test_message_list_pagination_defaults() {
    let client = authenticated_client().await;
    let base_url = api_base_url();

    let resp = client
        .get(format!("{base_url}/admin/messages"))
        .send()
        .await
        .expect("list request failed");

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("invalid body");
    assert_eq!(body["success"], true);
    assert_eq!(body["pagination"]["current_page"], 1);
    assert_eq!(body["pagination"]["per_page"], 15);
}

#[tokio::test]
#[ignore = "Requires running API, database, and admin account"]
async fn test_message_list_limit_clamps() {
    let client = authenticated_client().await;
    let base_url = api_base_url();

    let resp = client
        .get(format!("{base_url}/admin/messages?limit=99999"))
        .send()
        .await
        .expect("list request failed");

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("invalid body");
    assert_eq!(body["pagination"]["per_page"], 10000);
}

#[tokio::test]
#[ignore = "Requires running API, database, and admin account"]
async fn test_message_list_rejects_unknown_sort() {
    let client = authenticated_client().await;
    let base_url = api_base_url();

    let resp = client
        .get(format!("{base_url}/admin/messages?sort=password_hash"))
        .send()
        .await
        .expect("list request failed");

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = resp.json().await.expect("invalid body");
    assert_eq!(body["error"]["type"], "validation_error");
}

#[tokio::test]
#[ignore = "Requires running API, database, and admin account"]
async fn test_bulk_action_validation() {
    let client = authenticated_client().await;
    let base_url = api_base_url();

    let resp = client
        .patch(format!("{base_url}/admin/bulk/messages"))
        .json(&json!({"action": "archive", "ids": [1]}))
        .send()
        .await
        .expect("bulk request failed");

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let resp = client
        .patch(format!("{base_url}/admin/bulk/messages"))
        .json(&json!({"action": "mark_read", "ids": []}))
        .send()
        .await
        .expect("bulk request failed");

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
