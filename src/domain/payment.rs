//! Payment types
//!
//! Transactions, their one-to-one payment details and the fingerprint used
//! for duplicate detection.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::DomainError;

/// Supported payment methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    EWallet,
    #[serde(alias = "mpesa")]
    MobileMoney,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "credit_card",
            PaymentMethod::EWallet => "e_wallet",
            PaymentMethod::MobileMoney => "mobile_money",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "credit_card" => Ok(PaymentMethod::CreditCard),
            "e_wallet" => Ok(PaymentMethod::EWallet),
            "mobile_money" | "mpesa" => Ok(PaymentMethod::MobileMoney),
            other => Err(DomainError::validation(format!(
                "invalid payment method: {}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Instrument details attached to exactly one transaction.
/// All fields are opaque; no checksum validation is done.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDetails {
    #[serde(default)]
    pub card_number: String,
    #[serde(default)]
    pub expiry_date: String,
    #[serde(default, skip_serializing)]
    pub cvv: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub email: String,
}

/// Fields that identify a repeated submission
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PaymentFingerprint {
    pub amount: String,
    pub phone_number: String,
    pub card_number: String,
}

impl PaymentFingerprint {
    pub fn new(amount: &str, details: &PaymentDetails) -> Self {
        Self {
            amount: amount.to_string(),
            phone_number: details.phone_number.clone(),
            card_number: details.card_number.clone(),
        }
    }

    /// SHA-256 of the fingerprint, safe to log in place of the card number
    pub fn digest(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(self.amount.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.phone_number.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.card_number.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// The rejection reported for a submission matching this fingerprint
    pub fn duplicate_error(&self) -> DomainError {
        DomainError::DuplicateSubmission {
            amount: self.amount.clone(),
            phone_number: self.phone_number.clone(),
            card_number: self.card_number.clone(),
        }
    }
}

/// Check the structural rules of a submission and return its payment method.
///
/// Amount must be a decimal number with no surrounding whitespace, since
/// it is fingerprinted exactly as submitted. Currency must be present and
/// the method must be one of the enumerated values.
pub fn validate_submission(
    amount: &str,
    currency: &str,
    payment_method: &str,
) -> Result<PaymentMethod, DomainError> {
    if amount.trim().is_empty() {
        return Err(DomainError::validation("amount is required"));
    }
    if amount.trim() != amount || Decimal::from_str(amount).is_err() {
        return Err(DomainError::validation(format!("invalid amount: {}", amount)));
    }
    if currency.trim().is_empty() {
        return Err(DomainError::validation("currency is required"));
    }
    payment_method.parse()
}

/// A committed payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    /// Processor-issued reference (`TXN-...`)
    pub reference: String,
    pub amount: String,
    pub currency: String,
    pub payment_method: PaymentMethod,
    pub payment_details: PaymentDetails,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn fingerprint(&self) -> PaymentFingerprint {
        PaymentFingerprint::new(&self.amount, &self.payment_details)
    }
}

/// Transaction data to commit; the store assigns the id
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub reference: String,
    pub amount: String,
    pub currency: String,
    pub payment_method: PaymentMethod,
    pub payment_details: PaymentDetails,
    pub created_at: DateTime<Utc>,
}
