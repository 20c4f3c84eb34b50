//! Payment processing
//!
//! The processing step sits behind `PaymentProcessor`. The only
//! implementation is `SimulatedProcessor`, which waits for a fixed latency
//! and approves every well-formed charge.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::domain::PaymentMethod;

/// Default simulated gateway round-trip
pub const DEFAULT_PROCESSING_DELAY: Duration = Duration::from_secs(2);

/// Charge submitted to the processor
#[derive(Debug, Clone)]
pub struct ChargeRequest {
    pub amount: String,
    pub currency: String,
    pub payment_method: PaymentMethod,
}

/// Processor's answer to an approved charge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorResponse {
    pub transaction_id: String,
    pub status: String,
    pub message: String,
}

/// Gateway Error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("invalid payment details")]
    InvalidPayment,

    #[error("Payment processor unavailable: {0}")]
    Unavailable(String),
}

/// Something that can process a charge
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    async fn process(&self, charge: &ChargeRequest) -> Result<ProcessorResponse, GatewayError>;
}

static LAST_REFERENCE_NANOS: AtomicI64 = AtomicI64::new(0);

/// `TXN-<nanos>`, strictly increasing within the process
pub fn next_transaction_id() -> String {
    let now = Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_else(|| LAST_REFERENCE_NANOS.load(Ordering::Relaxed) + 1);

    let previous = LAST_REFERENCE_NANOS
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
            Some(now.max(last + 1))
        })
        .unwrap_or(now);

    format!("TXN-{}", now.max(previous + 1))
}

/// Stand-in for a real gateway round-trip.
///
/// The latency is awaited on the calling task only; concurrent requests
/// wait in parallel. `fail_with` makes every call fail, for exercising
/// the pipeline's failure path.
#[derive(Debug, Clone)]
pub struct SimulatedProcessor {
    latency: Duration,
    failure: Option<String>,
}

impl SimulatedProcessor {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            failure: None,
        }
    }

    /// No latency, for tests
    pub fn instant() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn fail_with(mut self, reason: impl Into<String>) -> Self {
        self.failure = Some(reason.into());
        self
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }
}

impl Default for SimulatedProcessor {
    fn default() -> Self {
        Self::new(DEFAULT_PROCESSING_DELAY)
    }
}

#[async_trait]
impl PaymentProcessor for SimulatedProcessor {
    async fn process(&self, charge: &ChargeRequest) -> Result<ProcessorResponse, GatewayError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if let Some(ref reason) = self.failure {
            return Err(GatewayError::Unavailable(reason.clone()));
        }

        if charge.amount.is_empty() || charge.currency.is_empty() {
            return Err(GatewayError::InvalidPayment);
        }

        Ok(ProcessorResponse {
            transaction_id: next_transaction_id(),
            status: "Success".to_string(),
            message: "Payment processed successfully".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn charge(amount: &str, currency: &str) -> ChargeRequest {
        ChargeRequest {
            amount: amount.to_string(),
            currency: currency.to_string(),
            payment_method: PaymentMethod::CreditCard,
        }
    }

    #[tokio::test]
    async fn test_simulated_success() {
        let response = SimulatedProcessor::instant()
            .process(&charge("100", "USD"))
            .await
            .unwrap();

        assert!(response.transaction_id.starts_with("TXN-"));
        assert_eq!(response.status, "Success");
    }

    #[tokio::test]
    async fn test_empty_amount_or_currency_rejected() {
        let processor = SimulatedProcessor::instant();
        assert_eq!(
            processor.process(&charge("", "USD")).await,
            Err(GatewayError::InvalidPayment)
        );
        assert_eq!(
            processor.process(&charge("100", "")).await,
            Err(GatewayError::InvalidPayment)
        );
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let processor = SimulatedProcessor::instant().fail_with("gateway down");
        assert_eq!(
            processor.process(&charge("100", "USD")).await,
            Err(GatewayError::Unavailable("gateway down".to_string()))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_is_awaited() {
        let processor = SimulatedProcessor::default();
        let start = tokio::time::Instant::now();

        processor.process(&charge("100", "USD")).await.unwrap();
        assert!(start.elapsed() >= DEFAULT_PROCESSING_DELAY);
    }

    #[test]
    fn test_transaction_ids_strictly_increase() {
        let parse = |id: String| id.trim_start_matches("TXN-").parse::<i64>().unwrap();

        let mut last = parse(next_transaction_id());
        for _ in 0..1000 {
            let next = parse(next_transaction_id());
            assert!(next > last);
            last = next;
        }
    }
}
