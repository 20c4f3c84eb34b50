//! API Integration Tests
//!
//! Drive the router end to end over the in-memory stores.

use axum::{body::Body, http::Request, http::StatusCode};
use chrono::Duration;
use serde_json::{json, Value};

use paygate::domain::AccountChanges;
use paygate::store::{AccountStore, TransactionStore};

mod common;

use common::TestApp;

fn register_body() -> Value {
    json!({
        "full_name": "A",
        "email": "a@x.com",
        "password": "pw123",
        "provider": "email"
    })
}

fn payment_body() -> Value {
    json!({
        "amount": "100",
        "currency": "USD",
        "payment_method": "credit_card",
        "payment_details": {
            "card_number": "4111",
            "expiry_date": "12/30",
            "cvv": "123",
            "phone_number": "0700",
            "email": "a@x.com"
        }
    })
}

/// Register, then flip both state flags through the store boundary
async fn register_usable_account(app: &TestApp) -> i64 {
    let (status, json) = app.post_json("/auth/register", register_body(), None).await;
    assert_eq!(status, StatusCode::CREATED);

    let id = json["data"]["id"].as_i64().unwrap();
    app.accounts
        .update_fields(
            id,
            &AccountChanges {
                is_active: Some(true),
                is_verified: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    id
}

async fn login(app: &TestApp) -> (String, String) {
    let (status, json) = app
        .post_json(
            "/auth/login",
            json!({"email": "a@x.com", "password": "pw123"}),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", json);

    (
        json["data"]["token"]["access_token"].as_str().unwrap().to_string(),
        json["data"]["token"]["refresh_token"].as_str().unwrap().to_string(),
    )
}

// =========================================================================
// Registration and login
// =========================================================================

#[tokio::test]
async fn test_register_envelope() {
    let app = common::setup_test_app();

    let (status, json) = app.post_json("/auth/register", register_body(), None).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["status"], 201);
    assert_eq!(json["message"], "User account successfully created");
    assert_eq!(json["data"]["email"], "a@x.com");
    assert_eq!(json["data"]["is_active"], false);
    assert_eq!(json["data"]["is_verified"], false);
    assert!(json["data"].get("password_hash").is_none());
}

#[tokio::test]
async fn test_register_duplicate_email_conflict() {
    let app = common::setup_test_app();
    app.post_json("/auth/register", register_body(), None).await;

    let (status, json) = app.post_json("/auth/register", register_body(), None).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["status"], 409);
    assert_eq!(json["error"], "user with provided email already exists");
}

#[tokio::test]
async fn test_register_rejects_unsupported_provider_and_bad_body() {
    let app = common::setup_test_app();

    let mut body = register_body();
    body["provider"] = json!("google");
    let (status, json) = app.post_json("/auth/register", body.clone(), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "token is required");

    body["token"] = json!("oauth-token");
    let (status, json) = app.post_json("/auth/register", body, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "unsupported provider: google");

    let request = Request::builder()
        .method("POST")
        .uri("/auth/register")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, json) = app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], 400);

    assert!(app.accounts.is_empty().await);
}

#[tokio::test]
async fn test_fresh_account_cannot_log_in() {
    let app = common::setup_test_app();
    app.post_json("/auth/register", register_body(), None).await;

    let (status, json) = app
        .post_json(
            "/auth/login",
            json!({"email": "a@x.com", "password": "wrong"}),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "invalid credentials");

    let (status, json) = app
        .post_json(
            "/auth/login",
            json!({"email": "a@x.com", "password": "pw123"}),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "account is not active");

    let (status, _) = app
        .post_json(
            "/auth/login",
            json!({"email": "nobody@x.com", "password": "pw123"}),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_login_returns_user_and_pair() {
    let app = common::setup_test_app();
    let id = register_usable_account(&app).await;

    let (status, json) = app
        .post_json(
            "/auth/login",
            json!({"email": "a@x.com", "password": "pw123"}),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Login successful");
    assert_eq!(json["data"]["user"]["id"], id);
    assert!(json["data"]["token"]["access_token"].is_string());
    assert!(json["data"]["token"]["refresh_token"].is_string());
}

// =========================================================================
// Refresh
// =========================================================================

#[tokio::test]
async fn test_refresh_token_flow() {
    let app = common::setup_test_app();
    register_usable_account(&app).await;
    let (access, refresh) = login(&app).await;

    // access token cannot be used to refresh
    let (status, json) = app
        .post_json("/user/refresh-token", json!({"refresh_token": access}), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "invalid or expired token");

    app.clock.advance(Duration::minutes(59));
    let (status, json) = app
        .post_json("/user/refresh-token", json!({"refresh_token": refresh}), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["refresh_token"], refresh.as_str());

    let new_access = json["data"]["access_token"].as_str().unwrap().to_string();

    // the refresh token expires on schedule even though it was used
    app.clock.advance(Duration::minutes(2));
    let (status, _) = app
        .post_json("/user/refresh-token", json!({"refresh_token": refresh}), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // the access token minted from it is still fresh
    let (status, _) = app.get("/payments/transactions", Some(&new_access)).await;
    assert_eq!(status, StatusCode::OK);
}

// =========================================================================
// Bearer transport
// =========================================================================

#[tokio::test]
async fn test_payments_require_bearer() {
    let app = common::setup_test_app();
    register_usable_account(&app).await;
    let (access, refresh) = login(&app).await;

    let (status, json) = app.post_json("/payments/payment", payment_body(), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "Missing Authorization Header");

    let request = Request::builder()
        .method("GET")
        .uri("/payments/transactions")
        .header("authorization", format!("Token {}", access))
        .body(Body::empty())
        .unwrap();
    let (status, json) = app.send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "Invalid Authorization Header Format");

    let (status, json) = app.get("/payments/transactions", Some(&refresh)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "invalid or expired token");

    app.clock.advance(Duration::minutes(60));
    let (status, _) = app.get("/payments/transactions", Some(&access)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    assert!(app.transactions.is_empty().await);
}

// =========================================================================
// Payments
// =========================================================================

#[tokio::test]
async fn test_duplicate_payment_scenario() {
    let app = common::setup_test_app();
    register_usable_account(&app).await;
    let (access, _) = login(&app).await;

    let (status, json) = app
        .post_json("/payments/payment", payment_body(), Some(&access))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "Success");
    assert_eq!(json["data"]["message"], "Payment processed successfully");
    assert!(json["data"]["transaction_id"]
        .as_str()
        .unwrap()
        .starts_with("TXN-"));

    app.clock.advance(Duration::seconds(5));
    let (status, json) = app
        .post_json("/payments/payment", payment_body(), Some(&access))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        json["error"],
        "a payment with the amount 100, phone number 0700, and card number 4111 has already been processed recently"
    );

    app.clock.advance(Duration::seconds(56));
    let (status, _) = app
        .post_json("/payments/payment", payment_body(), Some(&access))
        .await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(app.transactions.len().await, 2);
}

#[tokio::test]
async fn test_payment_validation() {
    let app = common::setup_test_app();
    register_usable_account(&app).await;
    let (access, _) = login(&app).await;

    let mut body = payment_body();
    body["payment_method"] = json!("paypal");
    let (status, json) = app.post_json("/payments/payment", body, Some(&access)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "invalid payment method: paypal");

    let mut body = payment_body();
    body["currency"] = json!("");
    let (status, _) = app.post_json("/payments/payment", body, Some(&access)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(app.transactions.is_empty().await);
}

#[tokio::test]
async fn test_get_and_list_payments() {
    let app = common::setup_test_app();
    register_usable_account(&app).await;
    let (access, _) = login(&app).await;

    let (_, json) = app
        .post_json("/payments/payment", payment_body(), Some(&access))
        .await;
    let reference = json["data"]["transaction_id"].as_str().unwrap().to_string();

    app.clock.advance(Duration::seconds(1));
    let mut body = payment_body();
    body["amount"] = json!("42.10");
    body["payment_method"] = json!("mpesa");
    app.post_json("/payments/payment", body, Some(&access)).await;

    let (status, json) = app.get("/payments/transactions", Some(&access)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Payments fetched successfully");
    let listed = json["data"].as_array().unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0]["amount"], "42.10");
    assert_eq!(listed[0]["payment_method"], "mobile_money");
    assert_eq!(listed[1]["reference"], reference.as_str());

    let id = listed[1]["id"].as_i64().unwrap();
    let (status, json) = app.get(&format!("/payments/{}", id), Some(&access)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["payment_details"]["card_number"], "4111");
    assert!(json["data"]["payment_details"].get("cvv").is_none());

    let stored = app.transactions.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(stored.payment_details.cvv, "123");

    let (status, _) = app.get("/payments/abc", Some(&access)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = app.get("/payments/999", Some(&access)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["status"], 404);
}
