//! Login and token refresh

use std::sync::Arc;

use crate::domain::{AccountChanges, AccountView};
use crate::error::AppResult;
use crate::tokens::{TokenAuthority, TokenPair};

use super::{AccountGate, LoginCommand, LoginResult};

/// Handler for login and refresh
#[derive(Clone)]
pub struct AuthHandler {
    gate: AccountGate,
    tokens: Arc<TokenAuthority>,
}

impl AuthHandler {
    pub fn new(gate: AccountGate, tokens: Arc<TokenAuthority>) -> Self {
        Self { gate, tokens }
    }

    /// Authenticate and issue an access/refresh pair
    pub async fn login(&self, command: LoginCommand) -> AppResult<LoginResult> {
        let account = self.gate.authenticate(command).await?;

        let token = self.tokens.issue_pair(&account.subject())?;

        // touch updated_at as a last-login marker
        let account = self
            .gate
            .accounts()
            .update_fields(account.id, &AccountChanges::default())
            .await?;

        tracing::info!(account_id = account.id, "Login succeeded");

        Ok(LoginResult {
            user: AccountView::from(&account),
            token,
        })
    }

    /// New access token from a refresh token; the refresh token is returned as-is
    pub fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair> {
        let access_token = self.tokens.refresh(refresh_token)?;

        Ok(TokenPair {
            access_token,
            refresh_token: refresh_token.to_string(),
        })
    }
}
