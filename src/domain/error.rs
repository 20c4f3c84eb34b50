//! Domain Error Types
//!
//! Pure domain errors that don't depend on infrastructure.

use thiserror::Error;

/// Business-level failures returned by the core operations.
///
/// Token failures share one variant; the reason is only logged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Malformed or missing input
    #[error("{0}")]
    Validation(String),

    /// No matching account or transaction
    #[error("{0}")]
    NotFound(String),

    /// Wrong password for an existing account
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Bad signature, wrong kind, malformed or expired token
    #[error("invalid or expired token")]
    InvalidToken,

    #[error("account is not active")]
    AccountNotActive,

    #[error("account is not verified")]
    AccountNotVerified,

    /// An account with this email already exists
    #[error("user with provided email already exists")]
    DuplicateEmail,

    /// Identity provider that has no implementation
    #[error("unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// A matching payment was admitted inside the duplicate window
    #[error(
        "a payment with the amount {amount}, phone number {phone_number}, and card number {card_number} has already been processed recently"
    )]
    DuplicateSubmission {
        amount: String,
        phone_number: String,
        card_number: String,
    },
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Check if this is an authentication failure
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials
                | Self::InvalidToken
                | Self::AccountNotActive
                | Self::AccountNotVerified
        )
    }

    /// Check if this is a conflict with existing state
    pub fn is_conflict_error(&self) -> bool {
        matches!(
            self,
            Self::DuplicateEmail | Self::DuplicateSubmission { .. }
        )
    }
}
