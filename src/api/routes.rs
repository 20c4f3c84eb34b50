//! API Routes
//!
//! HTTP endpoint definitions.

use axum::{
    extract::{rejection::JsonRejection, Extension, Path, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::domain::{AccountView, OperationContext, PaymentDetails, Provider, Transaction};
use crate::error::AppError;
use crate::handlers::{LoginCommand, LoginResult, PaymentCommand, PaymentReceipt, RegisterCommand};
use crate::tokens::TokenPair;

use super::middleware::{logging_middleware, require_bearer};
use super::AppState;

// =========================================================================
// Response envelope
// =========================================================================

/// Success body: `{status, message, data}`
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: u16,
    pub message: String,
    pub data: T,
}

impl<T> ApiResponse<T> {
    fn new(status: StatusCode, message: &str, data: T) -> (StatusCode, Json<Self>) {
        (
            status,
            Json(Self {
                status: status.as_u16(),
                message: message.to_string(),
                data,
            }),
        )
    }
}

type Reply<T> = Result<(StatusCode, Json<ApiResponse<T>>), AppError>;

// =========================================================================
// Request types
// =========================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub provider: Provider,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub provider: Provider,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshTokenRequest {
    #[serde(default)]
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentRequest {
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub payment_method: String,
    #[serde(default)]
    pub payment_details: PaymentDetails,
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(request)| request)
        .map_err(|rejection| AppError::validation(rejection.body_text()))
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router.
///
/// Paths are unprefixed; the binary nests them under `/api/v1`.
/// Everything under `/payments` requires a bearer access token.
pub fn create_router(state: AppState) -> Router {
    let payments = Router::new()
        .route("/payments/payment", post(make_payment))
        .route("/payments/transactions", get(list_transactions))
        .route("/payments/:id", get(get_payment))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_bearer));

    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/user/refresh-token", post(refresh_token))
        .merge(payments)
        .layer(middleware::from_fn(logging_middleware))
        .with_state(state)
}

// =========================================================================
// POST /auth/register
// =========================================================================

async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Reply<AccountView> {
    let request = body(payload)?;

    let command = RegisterCommand::new(request.full_name, request.email, request.password)
        .with_provider(request.provider, request.token);

    let account = state.gate.register(command).await?;

    Ok(ApiResponse::new(
        StatusCode::CREATED,
        "User account successfully created",
        AccountView::from(&account),
    ))
}

// =========================================================================
// POST /auth/login
// =========================================================================

async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Reply<LoginResult> {
    let request = body(payload)?;

    let command =
        LoginCommand::new(request.email, request.password).with_provider(request.provider);

    let result = state.auth.login(command).await?;

    Ok(ApiResponse::new(StatusCode::OK, "Login successful", result))
}

// =========================================================================
// POST /user/refresh-token
// =========================================================================

async fn refresh_token(
    State(state): State<AppState>,
    payload: Result<Json<RefreshTokenRequest>, JsonRejection>,
) -> Reply<TokenPair> {
    let request = body(payload)?;

    if request.refresh_token.is_empty() {
        return Err(AppError::validation("refresh_token is required"));
    }

    let pair = state.auth.refresh(&request.refresh_token)?;

    Ok(ApiResponse::new(StatusCode::OK, "Token refreshed successfully", pair))
}

// =========================================================================
// POST /payments/payment
// =========================================================================

async fn make_payment(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    payload: Result<Json<PaymentRequest>, JsonRejection>,
) -> Reply<PaymentReceipt> {
    let request = body(payload)?;

    let command = PaymentCommand::new(request.amount, request.currency, request.payment_method)
        .with_details(request.payment_details);

    let receipt = state.payments.submit(command, &context).await?;

    Ok(ApiResponse::new(StatusCode::OK, "Payment processed successfully", receipt))
}

// =========================================================================
// GET /payments/:id
// =========================================================================

async fn get_payment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Reply<Transaction> {
    let id: i64 = id
        .parse()
        .map_err(|_| AppError::validation(format!("invalid payment id: {}", id)))?;

    let transaction = state.payments.get(id).await?;

    Ok(ApiResponse::new(
        StatusCode::OK,
        "Payment detail fetched successfully",
        transaction,
    ))
}

// =========================================================================
// GET /payments/transactions
// =========================================================================

async fn list_transactions(State(state): State<AppState>) -> Reply<Vec<Transaction>> {
    let transactions = state.payments.list().await?;

    Ok(ApiResponse::new(
        StatusCode::OK,
        "Payments fetched successfully",
        transactions,
    ))
}
