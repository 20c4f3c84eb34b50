//! Command definitions
//!
//! Commands represent intentions to change the system state.

use serde::{Deserialize, Serialize};

use crate::domain::{AccountView, PaymentDetails, Provider, Transaction};
use crate::tokens::TokenPair;

// =========================================================================
// RegisterCommand
// =========================================================================

/// Command to register a new account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterCommand {
    pub full_name: String,
    pub email: String,
    pub password: String,
    /// Required for any provider other than email
    pub token: Option<String>,
    pub provider: Provider,
}

impl RegisterCommand {
    pub fn new(full_name: String, email: String, password: String) -> Self {
        Self {
            full_name,
            email,
            password,
            token: None,
            provider: Provider::Email,
        }
    }

    pub fn with_provider(mut self, provider: Provider, token: Option<String>) -> Self {
        self.provider = provider;
        self.token = token;
        self
    }
}

// =========================================================================
// LoginCommand
// =========================================================================

/// Command to sign in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginCommand {
    pub email: String,
    pub password: String,
    pub provider: Provider,
}

impl LoginCommand {
    pub fn new(email: String, password: String) -> Self {
        Self {
            email,
            password,
            provider: Provider::Email,
        }
    }

    pub fn with_provider(mut self, provider: Provider) -> Self {
        self.provider = provider;
        self
    }
}

// =========================================================================
// PaymentCommand
// =========================================================================

/// Command to submit a payment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentCommand {
    /// Decimal amount as submitted; compared verbatim for duplicates
    pub amount: String,
    pub currency: String,
    /// Unparsed method name, checked during validation
    pub payment_method: String,
    pub payment_details: PaymentDetails,
}

impl PaymentCommand {
    pub fn new(amount: String, currency: String, payment_method: String) -> Self {
        Self {
            amount,
            currency,
            payment_method,
            payment_details: PaymentDetails::default(),
        }
    }

    pub fn with_details(mut self, payment_details: PaymentDetails) -> Self {
        self.payment_details = payment_details;
        self
    }
}

/// Result of a successful login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResult {
    pub user: AccountView,
    pub token: TokenPair,
}

/// Result of an admitted payment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub transaction_id: String,
    pub status: String,
    pub message: String,
    /// Stored transaction
    #[serde(skip)]
    pub transaction: Option<Transaction>,
}
