//! Common test utilities

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, Response, StatusCode},
    Router,
};
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::util::ServiceExt;

use paygate::api::{self, AppState};
use paygate::credentials::CredentialStore;
use paygate::domain::ManualClock;
use paygate::gateway::SimulatedProcessor;
use paygate::store::{InMemoryAccountStore, InMemoryTransactionStore};
use paygate::tokens::TokenAuthority;

/// Router plus handles on its stores and clock
pub struct TestApp {
    pub router: Router,
    pub clock: Arc<ManualClock>,
    pub accounts: Arc<InMemoryAccountStore>,
    pub transactions: Arc<InMemoryTransactionStore>,
    pub tokens: Arc<TokenAuthority>,
}

/// Build the router over in-memory stores with a manual clock and an
/// instant payment processor
pub fn setup_test_app() -> TestApp {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let accounts = Arc::new(InMemoryAccountStore::with_clock(clock.clone()));
    let transactions = Arc::new(InMemoryTransactionStore::new());

    let tokens = Arc::new(
        TokenAuthority::new(b"test-access-secret", b"test-refresh-secret", clock.clone())
            .expect("Failed to build token authority"),
    );

    let state = AppState::new(
        accounts.clone(),
        transactions.clone(),
        CredentialStore::with_params(1024, 1, 1).expect("Invalid hashing params"),
        tokens.clone(),
        Arc::new(SimulatedProcessor::instant()),
        clock.clone(),
    );

    TestApp {
        router: api::create_router(state),
        clock,
        accounts,
        transactions,
        tokens,
    }
}

impl TestApp {
    /// Send a request and decode the JSON body
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router failed");
        read_json(response).await
    }

    pub async fn post_json(
        &self,
        uri: &str,
        body: Value,
        bearer: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(token) = bearer {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    pub async fn get(&self, uri: &str, bearer: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(token) = bearer {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }
}

pub async fn read_json(response: Response<Body>) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}
