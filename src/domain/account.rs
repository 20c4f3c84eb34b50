//! Account types
//!
//! Registered identities and the identity-provider switch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity provider used to register or sign in.
///
/// Only `email` has an implementation; any other name deserializes into
/// `Unsupported` so the caller can reject it explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Provider {
    Email,
    Unsupported(String),
}

impl Default for Provider {
    fn default() -> Self {
        Self::Email
    }
}

impl From<String> for Provider {
    fn from(s: String) -> Self {
        match s.as_str() {
            "email" => Provider::Email,
            _ => Provider::Unsupported(s),
        }
    }
}

impl From<Provider> for String {
    fn from(p: Provider) -> Self {
        p.to_string()
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::Email => write!(f, "email"),
            Provider::Unsupported(name) => write!(f, "{}", name),
        }
    }
}

/// A persisted account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: i64,
    pub full_name: String,
    /// Unique, compared case-sensitively
    pub email: String,
    pub phone_number: String,
    pub password_hash: String,
    pub is_active: bool,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Token subject for this account
    pub fn subject(&self) -> String {
        self.id.to_string()
    }
}

/// Account data to insert; the store assigns the id and timestamps
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    pub password_hash: String,
    pub is_active: bool,
    pub is_verified: bool,
}

impl NewAccount {
    /// New accounts start inactive and unverified
    pub fn new(full_name: String, email: String, password_hash: String) -> Self {
        Self {
            full_name,
            email,
            phone_number: String::new(),
            password_hash,
            is_active: false,
            is_verified: false,
        }
    }
}

/// Partial update; `None` fields are left untouched.
/// An empty change set only bumps `updated_at`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountChanges {
    pub full_name: Option<String>,
    pub phone_number: Option<String>,
    pub is_active: Option<bool>,
    pub is_verified: Option<bool>,
}

impl AccountChanges {
    pub fn activate() -> Self {
        Self {
            is_active: Some(true),
            ..Self::default()
        }
    }

    pub fn verify() -> Self {
        Self {
            is_verified: Some(true),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Apply to an in-memory account
    pub fn apply_to(&self, account: &mut Account) {
        if let Some(ref full_name) = self.full_name {
            account.full_name = full_name.clone();
        }
        if let Some(ref phone_number) = self.phone_number {
            account.phone_number = phone_number.clone();
        }
        if let Some(is_active) = self.is_active {
            account.is_active = is_active;
        }
        if let Some(is_verified) = self.is_verified {
            account.is_verified = is_verified;
        }
    }
}

/// Public projection of an account (no password hash)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountView {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    pub is_active: bool,
    pub is_verified: bool,
}

impl From<&Account> for AccountView {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            full_name: account.full_name.clone(),
            email: account.email.clone(),
            phone_number: account.phone_number.clone(),
            is_active: account.is_active,
            is_verified: account.is_verified,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_account() -> Account {
        let now = Utc::now();
        Account {
            id: 7,
            full_name: "A".to_string(),
            email: "a@x.com".to_string(),
            phone_number: String::new(),
            password_hash: "$argon2id$...".to_string(),
            is_active: false,
            is_verified: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_provider_from_string() {
        assert_eq!(Provider::from("email".to_string()), Provider::Email);
        assert_eq!(
            Provider::from("google".to_string()),
            Provider::Unsupported("google".to_string())
        );
        assert_eq!(Provider::default(), Provider::Email);
    }

    #[test]
    fn test_provider_serde() {
        let p: Provider = serde_json::from_str("\"github\"").unwrap();
        assert_eq!(p, Provider::Unsupported("github".to_string()));
        assert_eq!(serde_json::to_string(&Provider::Email).unwrap(), "\"email\"");
    }

    #[test]
    fn test_new_account_starts_gated() {
        let account = NewAccount::new("A".into(), "a@x.com".into(), "hash".into());
        assert!(!account.is_active);
        assert!(!account.is_verified);
    }

    #[test]
    fn test_account_changes_apply() {
        let mut account = sample_account();
        AccountChanges::activate().apply_to(&mut account);
        assert!(account.is_active);
        assert!(!account.is_verified);

        AccountChanges::verify().apply_to(&mut account);
        assert!(account.is_verified);
        assert!(AccountChanges::default().is_empty());
        assert!(!AccountChanges::activate().is_empty());
    }

    #[test]
    fn test_account_view_hides_hash() {
        let account = sample_account();
        let json = serde_json::to_value(AccountView::from(&account)).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "a@x.com");
        assert_eq!(account.subject(), "7");
    }
}
