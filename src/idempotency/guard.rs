//! Duplicate-Submission Guard
//!
//! Time-windowed lookup over transaction history. A submission whose
//! `(amount, phone number, card number)` matches a transaction created in
//! the last 60 seconds is rejected; the earlier transaction is untouched.
//!
//! The check and the later insert are separate store calls. Two identical
//! submissions racing through the gap can both be admitted.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::domain::PaymentFingerprint;
use crate::error::AppError;
use crate::store::TransactionStore;

/// Lookback of the duplicate window, in seconds
pub const DUPLICATE_WINDOW_SECS: i64 = 60;

/// Guard over the transaction history
#[derive(Clone)]
pub struct DuplicateGuard {
    transactions: Arc<dyn TransactionStore>,
}

impl DuplicateGuard {
    pub fn new(transactions: Arc<dyn TransactionStore>) -> Self {
        Self { transactions }
    }

    /// Oldest creation time that still counts as a duplicate at `now`
    pub fn window_start(now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::seconds(DUPLICATE_WINDOW_SECS)
    }

    // =========================================================================
    // check_and_reserve
    // =========================================================================

    /// Clear a submission for commit, or reject it as a duplicate.
    ///
    /// `now` is the wall-clock time of the check, not any time the client
    /// attached to the payment.
    pub async fn check_and_reserve(
        &self,
        fingerprint: &PaymentFingerprint,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let since = Self::window_start(now);

        tracing::debug!(
            fingerprint = %fingerprint.digest(),
            since = %since,
            "Checking for duplicate payments"
        );

        let existing = self
            .transactions
            .find_matching(fingerprint, since)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Duplicate check failed");
                AppError::from(e)
            })?;

        if let Some(existing) = existing {
            tracing::warn!(
                fingerprint = %fingerprint.digest(),
                existing_id = existing.id,
                existing_created_at = %existing.created_at,
                "Duplicate payment rejected"
            );
            return Err(fingerprint.duplicate_error().into());
        }

        Ok(())
    }
}
