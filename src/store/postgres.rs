//! Postgres stores
//!
//! sqlx-backed implementations of the account and transaction stores.
//! Schema lives in `migrations/0001_init.sql`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{
    Account, AccountChanges, NewAccount, NewTransaction, PaymentDetails, PaymentFingerprint,
    PaymentMethod, Transaction,
};

use super::{AccountStore, StoreError, TransactionStore};

/// Map unique violations to `StoreError::Conflict`
fn map_write_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.is_unique_violation() {
            let constraint = db_err.constraint().unwrap_or("unique").to_string();
            return StoreError::Conflict(constraint);
        }
    }
    StoreError::Database(err)
}

// =========================================================================
// Accounts
// =========================================================================

type AccountRow = (
    i64,
    String,
    String,
    String,
    String,
    bool,
    bool,
    DateTime<Utc>,
    DateTime<Utc>,
);

fn account_from_row(row: AccountRow) -> Account {
    let (id, full_name, email, phone_number, password_hash, is_active, is_verified, created_at, updated_at) =
        row;
    Account {
        id,
        full_name,
        email,
        phone_number,
        password_hash,
        is_active,
        is_verified,
        created_at,
        updated_at,
    }
}

const ACCOUNT_COLUMNS: &str = "id, full_name, email, phone_number, password_hash, is_active, is_verified, created_at, updated_at";

/// Account store over the `accounts` table
#[derive(Debug, Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let row: Option<AccountRow> = sqlx::query_as(&format!(
            "SELECT {} FROM accounts WHERE email = $1",
            ACCOUNT_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(account_from_row))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Account>, StoreError> {
        let row: Option<AccountRow> = sqlx::query_as(&format!(
            "SELECT {} FROM accounts WHERE id = $1",
            ACCOUNT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(account_from_row))
    }

    async fn insert(&self, account: NewAccount) -> Result<Account, StoreError> {
        let row: AccountRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO accounts (full_name, email, phone_number, password_hash, is_active, is_verified, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW())
            RETURNING {}
            "#,
            ACCOUNT_COLUMNS
        ))
        .bind(&account.full_name)
        .bind(&account.email)
        .bind(&account.phone_number)
        .bind(&account.password_hash)
        .bind(account.is_active)
        .bind(account.is_verified)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;

        tracing::info!(account_id = row.0, "Account created");
        Ok(account_from_row(row))
    }

    async fn update_fields(
        &self,
        id: i64,
        changes: &AccountChanges,
    ) -> Result<Account, StoreError> {
        let row: Option<AccountRow> = sqlx::query_as(&format!(
            r#"
            UPDATE accounts
            SET
                full_name = COALESCE($2, full_name),
                phone_number = COALESCE($3, phone_number),
                is_active = COALESCE($4, is_active),
                is_verified = COALESCE($5, is_verified),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            ACCOUNT_COLUMNS
        ))
        .bind(id)
        .bind(changes.full_name.as_deref())
        .bind(changes.phone_number.as_deref())
        .bind(changes.is_active)
        .bind(changes.is_verified)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_write_error)?;

        row.map(account_from_row)
            .ok_or_else(|| StoreError::NotFound(format!("account {}", id)))
    }
}

// =========================================================================
// Transactions
// =========================================================================

type TransactionRow = (
    i64,
    String,
    String,
    String,
    String,
    DateTime<Utc>,
    String,
    String,
    String,
    String,
    String,
);

fn transaction_from_row(row: TransactionRow) -> Result<Transaction, StoreError> {
    let (
        id,
        reference,
        amount,
        currency,
        payment_method,
        created_at,
        card_number,
        expiry_date,
        cvv,
        phone_number,
        email,
    ) = row;

    let payment_method: PaymentMethod = payment_method.parse().map_err(|_| {
        StoreError::Corrupt(format!(
            "payment {} has unknown payment method {}",
            id, payment_method
        ))
    })?;

    Ok(Transaction {
        id,
        reference,
        amount,
        currency,
        payment_method,
        payment_details: PaymentDetails {
            card_number,
            expiry_date,
            cvv,
            phone_number,
            email,
        },
        created_at,
    })
}

const TRANSACTION_SELECT: &str = r#"
    SELECT
        p.id, p.reference, p.amount, p.currency, p.payment_method, p.created_at,
        d.card_number, d.expiry_date, d.cvv, d.phone_number, d.email
    FROM payments p
    JOIN payment_details d ON d.payment_id = p.id
"#;

/// Transaction store over the `payments` and `payment_details` tables
#[derive(Debug, Clone)]
pub struct PgTransactionStore {
    pool: PgPool,
}

impl PgTransactionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionStore for PgTransactionStore {
    async fn insert(&self, transaction: NewTransaction) -> Result<Transaction, StoreError> {
        let mut tx = self.pool.begin().await?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO payments (reference, amount, currency, payment_method, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&transaction.reference)
        .bind(&transaction.amount)
        .bind(&transaction.currency)
        .bind(transaction.payment_method.as_str())
        .bind(transaction.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_write_error)?;

        let details = &transaction.payment_details;
        sqlx::query(
            r#"
            INSERT INTO payment_details (payment_id, card_number, expiry_date, cvv, phone_number, email)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(id)
        .bind(&details.card_number)
        .bind(&details.expiry_date)
        .bind(&details.cvv)
        .bind(&details.phone_number)
        .bind(&details.email)
        .execute(&mut *tx)
        .await
        .map_err(map_write_error)?;

        tx.commit().await?;

        tracing::info!(payment_id = id, reference = %transaction.reference, "Payment committed");

        Ok(Transaction {
            id,
            reference: transaction.reference,
            amount: transaction.amount,
            currency: transaction.currency,
            payment_method: transaction.payment_method,
            payment_details: transaction.payment_details,
            created_at: transaction.created_at,
        })
    }

    async fn find_matching(
        &self,
        fingerprint: &PaymentFingerprint,
        since: DateTime<Utc>,
    ) -> Result<Option<Transaction>, StoreError> {
        let row: Option<TransactionRow> = sqlx::query_as(&format!(
            r#"
            {}
            WHERE p.amount = $1
              AND d.phone_number = $2
              AND d.card_number = $3
              AND p.created_at >= $4
            ORDER BY p.created_at DESC
            LIMIT 1
            "#,
            TRANSACTION_SELECT
        ))
        .bind(&fingerprint.amount)
        .bind(&fingerprint.phone_number)
        .bind(&fingerprint.card_number)
        .bind(since)
        .fetch_optional(&self.pool)
        .await?;

        row.map(transaction_from_row).transpose()
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Transaction>, StoreError> {
        let row: Option<TransactionRow> =
            sqlx::query_as(&format!("{} WHERE p.id = $1", TRANSACTION_SELECT))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(transaction_from_row).transpose()
    }

    async fn list_all(&self) -> Result<Vec<Transaction>, StoreError> {
        let rows: Vec<TransactionRow> = sqlx::query_as(&format!(
            "{} ORDER BY p.created_at DESC, p.id DESC",
            TRANSACTION_SELECT
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(transaction_from_row).collect()
    }
}
