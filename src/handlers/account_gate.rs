//! Account Gate
//!
//! Registration and the ordered credential/state checks that guard login.

use std::sync::Arc;

use crate::credentials::CredentialStore;
use crate::domain::{Account, DomainError, NewAccount, Provider};
use crate::error::{AppError, AppResult};
use crate::store::AccountStore;

use super::{LoginCommand, RegisterCommand};

// =========================================================================
// AccountGate
// =========================================================================

/// Gate in front of the account store
#[derive(Clone)]
pub struct AccountGate {
    accounts: Arc<dyn AccountStore>,
    credentials: CredentialStore,
}

impl AccountGate {
    pub fn new(accounts: Arc<dyn AccountStore>, credentials: CredentialStore) -> Self {
        Self {
            accounts,
            credentials,
        }
    }

    pub fn accounts(&self) -> &Arc<dyn AccountStore> {
        &self.accounts
    }

    fn ensure_supported(provider: &Provider) -> AppResult<()> {
        match provider {
            Provider::Email => Ok(()),
            Provider::Unsupported(name) => {
                Err(DomainError::UnsupportedProvider(name.clone()).into())
            }
        }
    }

    // =========================================================================
    // register
    // =========================================================================

    /// Create an inactive, unverified account.
    ///
    /// Email comparison is exact. A concurrent registration that wins the
    /// insert still surfaces as `DuplicateEmail` through the unique index.
    pub async fn register(&self, command: RegisterCommand) -> AppResult<Account> {
        if command.provider != Provider::Email
            && command.token.as_deref().map_or(true, |t| t.trim().is_empty())
        {
            return Err(AppError::validation("token is required"));
        }
        Self::ensure_supported(&command.provider)?;

        if command.email.trim().is_empty() {
            return Err(AppError::validation("email is required"));
        }
        if command.full_name.trim().is_empty() {
            return Err(AppError::validation("full_name is required"));
        }
        if command.password.is_empty() {
            return Err(AppError::validation("password is required"));
        }

        if self.accounts.find_by_email(&command.email).await?.is_some() {
            return Err(DomainError::DuplicateEmail.into());
        }

        let password_hash = self.hash_password(command.password).await?;

        let account = self
            .accounts
            .insert(NewAccount::new(command.full_name, command.email, password_hash))
            .await
            .map_err(|e| {
                if e.is_conflict() {
                    AppError::Domain(DomainError::DuplicateEmail)
                } else {
                    AppError::from(e)
                }
            })?;

        tracing::info!(account_id = account.id, "Account registered");

        Ok(account)
    }

    // =========================================================================
    // authenticate
    // =========================================================================

    /// Resolve an account from credentials.
    ///
    /// Checks run in a fixed order: existence, password, active, verified.
    /// The first failure is returned.
    pub async fn authenticate(&self, command: LoginCommand) -> AppResult<Account> {
        Self::ensure_supported(&command.provider)?;

        if command.email.trim().is_empty() {
            return Err(AppError::validation("email is required"));
        }
        if command.password.is_empty() {
            return Err(AppError::validation("password is required"));
        }

        let account = self
            .accounts
            .find_by_email(&command.email)
            .await?
            .ok_or_else(|| DomainError::not_found("account not found"))?;

        if !self
            .verify_password(command.password, account.password_hash.clone())
            .await?
        {
            tracing::warn!(account_id = account.id, "Login rejected: bad password");
            return Err(DomainError::InvalidCredentials.into());
        }

        if !account.is_active {
            tracing::warn!(account_id = account.id, "Login rejected: account not active");
            return Err(DomainError::AccountNotActive.into());
        }

        if !account.is_verified {
            tracing::warn!(account_id = account.id, "Login rejected: account not verified");
            return Err(DomainError::AccountNotVerified.into());
        }

        Ok(account)
    }

    // Argon2 is CPU and memory bound; keep it off the async workers.

    async fn hash_password(&self, password: String) -> AppResult<String> {
        let credentials = self.credentials.clone();
        let hash = tokio::task::spawn_blocking(move || credentials.hash(&password))
            .await
            .map_err(|e| AppError::Internal(format!("hashing task failed: {}", e)))??;
        Ok(hash)
    }

    async fn verify_password(&self, password: String, hash: String) -> AppResult<bool> {
        let credentials = self.credentials.clone();
        tokio::task::spawn_blocking(move || credentials.verify(&password, &hash))
            .await
            .map_err(|e| AppError::Internal(format!("verification task failed: {}", e)))
    }
}
