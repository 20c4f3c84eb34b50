//! Postgres store tests
//!
//! Need a database with `migrations/0001_init.sql` applied.
//! Run with: DATABASE_URL=... cargo test --test integration_postgres -- --ignored

use chrono::{Duration, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use paygate::db;
use paygate::domain::{AccountChanges, NewAccount, NewTransaction, PaymentDetails, PaymentMethod};
use paygate::store::{
    AccountStore, PgAccountStore, PgTransactionStore, StoreError, TransactionStore,
};

/// Connect and empty the tables
async fn setup_test_db() -> PgPool {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    assert!(
        db::check_schema(&pool).await.expect("Schema check failed"),
        "Run migrations/0001_init.sql first"
    );

    sqlx::query("TRUNCATE TABLE payment_details, payments, accounts RESTART IDENTITY CASCADE")
        .execute(&pool)
        .await
        .expect("Failed to clean up DB");

    pool
}

fn new_transaction(amount: &str, at: chrono::DateTime<Utc>) -> NewTransaction {
    NewTransaction {
        reference: format!("TXN-{}", at.timestamp_nanos_opt().unwrap_or_default()),
        amount: amount.to_string(),
        currency: "USD".to_string(),
        payment_method: PaymentMethod::CreditCard,
        payment_details: PaymentDetails {
            card_number: "4111".to_string(),
            expiry_date: "12/30".to_string(),
            cvv: "123".to_string(),
            phone_number: "0700".to_string(),
            email: "a@x.com".to_string(),
        },
        created_at: at,
    }
}

#[tokio::test]
#[ignore]
async fn test_account_store_roundtrip() {
    let pool = setup_test_db().await;
    let store = PgAccountStore::new(pool);

    let account = store
        .insert(NewAccount::new(
            "A".to_string(),
            "a@x.com".to_string(),
            "$argon2id$fake".to_string(),
        ))
        .await
        .unwrap();
    assert!(!account.is_active);
    assert!(!account.is_verified);

    let err = store
        .insert(NewAccount::new(
            "B".to_string(),
            "a@x.com".to_string(),
            "$argon2id$fake".to_string(),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)));

    let updated = store
        .update_fields(account.id, &AccountChanges::activate())
        .await
        .unwrap();
    assert!(updated.is_active);
    assert!(!updated.is_verified);
    assert_eq!(updated.full_name, "A");

    let found = store.find_by_email("a@x.com").await.unwrap().unwrap();
    assert_eq!(found.id, account.id);
    assert!(store.find_by_email("A@x.com").await.unwrap().is_none());

    let err = store
        .update_fields(account.id + 1000, &AccountChanges::default())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[tokio::test]
#[ignore]
async fn test_transaction_store_window_query() {
    let pool = setup_test_db().await;
    let store = PgTransactionStore::new(pool);

    let t0 = Utc::now();
    let committed = store.insert(new_transaction("100", t0)).await.unwrap();
    let fingerprint = committed.fingerprint();

    let found = store
        .find_matching(&fingerprint, t0 - Duration::seconds(30))
        .await
        .unwrap();
    assert_eq!(found.map(|t| t.id), Some(committed.id));

    assert!(store
        .find_matching(&fingerprint, t0 + Duration::seconds(1))
        .await
        .unwrap()
        .is_none());

    let fetched = store.find_by_id(committed.id).await.unwrap().unwrap();
    assert_eq!(fetched.payment_details.cvv, "123");
    assert_eq!(fetched.reference, committed.reference);
}

#[tokio::test]
#[ignore]
async fn test_transaction_store_allows_identical_rows() {
    let pool = setup_test_db().await;
    let store = PgTransactionStore::new(pool);

    let t0 = Utc::now();
    store.insert(new_transaction("100", t0)).await.unwrap();
    store
        .insert(new_transaction("100", t0 + Duration::milliseconds(1)))
        .await
        .unwrap();
    store
        .insert(new_transaction("5", t0 + Duration::seconds(1)))
        .await
        .unwrap();

    let all = store.list_all().await.unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].amount, "5");
}
