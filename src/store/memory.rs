//! In-memory stores
//!
//! Same contracts as the Postgres stores, held behind a `RwLock`. Each
//! call is atomic on its own; nothing spans a check and a later insert.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::{
    Account, AccountChanges, Clock, NewAccount, NewTransaction, PaymentFingerprint, SystemClock,
    Transaction,
};

use super::{AccountStore, StoreError, TransactionStore};

#[derive(Debug)]
struct Table<T> {
    next_id: i64,
    rows: Vec<T>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            rows: Vec::new(),
        }
    }
}

impl<T> Table<T> {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

// =========================================================================
// Accounts
// =========================================================================

/// Account store held in process memory
pub struct InMemoryAccountStore {
    table: RwLock<Table<Account>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Timestamps are taken from `clock`
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            table: RwLock::new(Table::default()),
            clock,
        }
    }

    pub async fn len(&self) -> usize {
        self.table.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for InMemoryAccountStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let table = self.table.read().await;
        Ok(table.rows.iter().find(|a| a.email == email).cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Account>, StoreError> {
        let table = self.table.read().await;
        Ok(table.rows.iter().find(|a| a.id == id).cloned())
    }

    async fn insert(&self, account: NewAccount) -> Result<Account, StoreError> {
        let mut table = self.table.write().await;

        if table.rows.iter().any(|a| a.email == account.email) {
            return Err(StoreError::Conflict(format!("email {}", account.email)));
        }

        let now = self.clock.now();
        let account = Account {
            id: table.next_id(),
            full_name: account.full_name,
            email: account.email,
            phone_number: account.phone_number,
            password_hash: account.password_hash,
            is_active: account.is_active,
            is_verified: account.is_verified,
            created_at: now,
            updated_at: now,
        };
        table.rows.push(account.clone());

        Ok(account)
    }

    async fn update_fields(
        &self,
        id: i64,
        changes: &AccountChanges,
    ) -> Result<Account, StoreError> {
        let mut table = self.table.write().await;
        let account = table
            .rows
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("account {}", id)))?;

        changes.apply_to(account);
        account.updated_at = self.clock.now();

        Ok(account.clone())
    }
}

// =========================================================================
// Transactions
// =========================================================================

/// Transaction store held in process memory
#[derive(Default)]
pub struct InMemoryTransactionStore {
    table: RwLock<Table<Transaction>>,
}

impl InMemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.table.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn insert(&self, transaction: NewTransaction) -> Result<Transaction, StoreError> {
        let mut table = self.table.write().await;

        let transaction = Transaction {
            id: table.next_id(),
            reference: transaction.reference,
            amount: transaction.amount,
            currency: transaction.currency,
            payment_method: transaction.payment_method,
            payment_details: transaction.payment_details,
            created_at: transaction.created_at,
        };
        table.rows.push(transaction.clone());

        Ok(transaction)
    }

    async fn find_matching(
        &self,
        fingerprint: &PaymentFingerprint,
        since: DateTime<Utc>,
    ) -> Result<Option<Transaction>, StoreError> {
        let table = self.table.read().await;
        Ok(table
            .rows
            .iter()
            .find(|t| t.created_at >= since && &t.fingerprint() == fingerprint)
            .cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Transaction>, StoreError> {
        let table = self.table.read().await;
        Ok(table.rows.iter().find(|t| t.id == id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Transaction>, StoreError> {
        let table = self.table.read().await;
        let mut rows = table.rows.clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }
}
