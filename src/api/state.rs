//! Shared application state

use std::sync::Arc;

use crate::credentials::CredentialStore;
use crate::domain::Clock;
use crate::gateway::PaymentProcessor;
use crate::handlers::{AccountGate, AdmissionPipeline, AuthHandler};
use crate::store::{AccountStore, TransactionStore};
use crate::tokens::TokenAuthority;

/// Handles shared by every request.
///
/// Built once from explicitly constructed stores; cloning only bumps
/// reference counts.
#[derive(Clone)]
pub struct AppState {
    pub gate: AccountGate,
    pub auth: AuthHandler,
    pub payments: AdmissionPipeline,
    pub tokens: Arc<TokenAuthority>,
}

impl AppState {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        transactions: Arc<dyn TransactionStore>,
        credentials: CredentialStore,
        tokens: Arc<TokenAuthority>,
        processor: Arc<dyn PaymentProcessor>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let gate = AccountGate::new(accounts, credentials);
        let auth = AuthHandler::new(gate.clone(), tokens.clone());
        let payments = AdmissionPipeline::new(transactions, processor, clock);

        Self {
            gate,
            auth,
            payments,
            tokens,
        }
    }
}
