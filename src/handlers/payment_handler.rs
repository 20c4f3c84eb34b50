//! Transaction Admission Pipeline
//!
//! Validation, duplicate guard, processing and commit, strictly in that
//! order. Any failing stage ends the submission.

use std::sync::Arc;

use crate::domain::{
    validate_submission, Clock, DomainError, NewTransaction, OperationContext, PaymentFingerprint,
    Transaction,
};
use crate::error::{AppError, AppResult};
use crate::gateway::{ChargeRequest, PaymentProcessor};
use crate::idempotency::DuplicateGuard;
use crate::store::TransactionStore;

use super::{PaymentCommand, PaymentReceipt};

// =========================================================================
// AdmissionPipeline
// =========================================================================

/// Payment admission and transaction queries
#[derive(Clone)]
pub struct AdmissionPipeline {
    guard: DuplicateGuard,
    processor: Arc<dyn PaymentProcessor>,
    transactions: Arc<dyn TransactionStore>,
    clock: Arc<dyn Clock>,
}

impl AdmissionPipeline {
    pub fn new(
        transactions: Arc<dyn TransactionStore>,
        processor: Arc<dyn PaymentProcessor>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            guard: DuplicateGuard::new(transactions.clone()),
            processor,
            transactions,
            clock,
        }
    }

    /// Run a submission through every stage
    pub async fn submit(
        &self,
        command: PaymentCommand,
        context: &OperationContext,
    ) -> AppResult<PaymentReceipt> {
        // 1. structural validation
        let payment_method =
            validate_submission(&command.amount, &command.currency, &command.payment_method)?;

        // 2. duplicate guard
        let fingerprint = PaymentFingerprint::new(&command.amount, &command.payment_details);
        self.guard
            .check_and_reserve(&fingerprint, self.clock.now())
            .await?;

        // 3. processing
        let charge = ChargeRequest {
            amount: command.amount.clone(),
            currency: command.currency.clone(),
            payment_method,
        };
        let response = self.processor.process(&charge).await?;

        // 4. commit
        let transaction = self
            .transactions
            .insert(NewTransaction {
                reference: response.transaction_id.clone(),
                amount: command.amount,
                currency: command.currency,
                payment_method,
                payment_details: command.payment_details,
                created_at: self.clock.now(),
            })
            .await
            .map_err(|e| {
                tracing::error!(
                    reference = %response.transaction_id,
                    error = %e,
                    "Processed payment could not be committed"
                );
                AppError::from(e)
            })?;

        tracing::info!(
            transaction_id = transaction.id,
            reference = %transaction.reference,
            method = %transaction.payment_method,
            subject = ?context.subject,
            correlation_id = ?context.correlation_id,
            "Payment admitted"
        );

        Ok(PaymentReceipt {
            transaction_id: response.transaction_id,
            status: response.status,
            message: response.message,
            transaction: Some(transaction),
        })
    }

    /// Look up one transaction
    pub async fn get(&self, id: i64) -> AppResult<Transaction> {
        self.transactions
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("transaction {} not found", id)).into())
    }

    /// All transactions, newest first
    pub async fn list(&self) -> AppResult<Vec<Transaction>> {
        Ok(self.transactions.list_all().await?)
    }
}
