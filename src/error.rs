//! Error handling module
//!
//! Centralized error types and HTTP response conversion.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::credentials::CredentialError;
use crate::domain::DomainError;
use crate::gateway::GatewayError;
use crate::store::StoreError;
use crate::tokens::TokenError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Domain errors
    #[error(transparent)]
    Domain(#[from] DomainError),

    // Transport-level authentication
    #[error("Missing Authorization Header")]
    MissingAuthorization,

    #[error("Invalid Authorization Header Format")]
    MalformedAuthorization,

    // Server errors (5xx)
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    #[error("Token error: {0}")]
    Token(String),

    #[error("Payment processing failed: {0}")]
    Gateway(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Domain(DomainError::validation(msg))
    }

    /// The domain error kind, if this is one
    pub fn domain(&self) -> Option<&DomainError> {
        match self {
            AppError::Domain(e) => Some(e),
            _ => None,
        }
    }

    /// Persistence, hashing, signing or gateway failure
    pub fn is_dependency_failure(&self) -> bool {
        matches!(
            self,
            AppError::Store(_)
                | AppError::Credential(_)
                | AppError::Token(_)
                | AppError::Gateway(_)
                | AppError::Internal(_)
        )
    }

    /// HTTP status and client-facing message
    pub fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            AppError::Domain(domain_err) => {
                let status = match domain_err {
                    e if e.is_auth_failure() => StatusCode::UNAUTHORIZED,
                    e if e.is_conflict_error() => StatusCode::CONFLICT,
                    DomainError::NotFound(_) => StatusCode::NOT_FOUND,
                    _ => StatusCode::BAD_REQUEST,
                };
                (status, domain_err.to_string())
            }

            AppError::MissingAuthorization | AppError::MalformedAuthorization => {
                (StatusCode::UNAUTHORIZED, self.to_string())
            }

            // 500: detail is logged, never returned
            AppError::Store(e) => {
                tracing::error!("Store error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_string())
            }
            AppError::Credential(e) => {
                tracing::error!("Credential error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_string())
            }
            AppError::Token(msg) => {
                tracing::error!("Token error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_string())
            }
            AppError::Gateway(msg) => {
                tracing::error!("Gateway error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "payment processing failed".to_string())
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_string())
            }
        }
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::InvalidToken => AppError::Domain(DomainError::InvalidToken),
            other => AppError::Token(other.to_string()),
        }
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::InvalidPayment => AppError::validation(err.to_string()),
            GatewayError::Unavailable(reason) => AppError::Gateway(reason),
        }
    }
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: u16,
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = self.status_and_message();

        let body = ErrorResponse {
            status: status.as_u16(),
            error,
        };

        (status, Json(body)).into_response()
    }
}
