//! Persistence boundary
//!
//! Account and transaction stores as traits, so components receive an
//! explicitly constructed handle instead of reaching for a global one.
//! `postgres` is the production backend, `memory` backs tests and local runs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    Account, AccountChanges, NewAccount, NewTransaction, PaymentFingerprint, Transaction,
};

pub mod memory;
pub mod postgres;

pub use memory::{InMemoryAccountStore, InMemoryTransactionStore};
pub use postgres::{PgAccountStore, PgTransactionStore};

/// Store Error
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A unique constraint rejected the write
    #[error("Unique constraint violated: {0}")]
    Conflict(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    /// A stored row could not be mapped back into a domain value
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

impl StoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }
}

/// Account persistence, keyed by unique email and surrogate id
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Account>, StoreError>;

    /// Insert a new account; `Conflict` if the email is taken
    async fn insert(&self, account: NewAccount) -> Result<Account, StoreError>;

    /// Apply a partial update and bump `updated_at`
    async fn update_fields(&self, id: i64, changes: &AccountChanges)
        -> Result<Account, StoreError>;
}

/// Transaction persistence.
///
/// No uniqueness is enforced on the payment fingerprint; duplicate
/// detection is the admission pipeline's job.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Persist a transaction and its details as one unit
    async fn insert(&self, transaction: NewTransaction) -> Result<Transaction, StoreError>;

    /// Any transaction with the same fingerprint created at or after `since`
    async fn find_matching(
        &self,
        fingerprint: &PaymentFingerprint,
        since: DateTime<Utc>,
    ) -> Result<Option<Transaction>, StoreError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Transaction>, StoreError>;

    /// All transactions, newest first
    async fn list_all(&self) -> Result<Vec<Transaction>, StoreError>;
}
