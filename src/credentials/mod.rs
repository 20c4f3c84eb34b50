//! Credential Store
//!
//! Salted, memory-hard password hashing (Argon2id) with a fixed work
//! factor. A wrong password is a `false` result, never an error.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;

/// Credential Store Error
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("Failed to hash password: {0}")]
    Hashing(String),

    #[error("Invalid hashing parameters: {0}")]
    InvalidParams(String),
}

/// Password hashing and verification
#[derive(Debug, Clone)]
pub struct CredentialStore {
    params: Params,
}

impl Default for CredentialStore {
    /// Argon2id, 19 MiB, 2 iterations, 1 lane
    fn default() -> Self {
        Self {
            params: Params::DEFAULT,
        }
    }
}

impl CredentialStore {
    /// Build a store with an explicit cost (memory in KiB, iterations, lanes)
    pub fn with_params(m_cost: u32, t_cost: u32, p_cost: u32) -> Result<Self, CredentialError> {
        let params = Params::new(m_cost, t_cost, p_cost, None)
            .map_err(|e| CredentialError::InvalidParams(e.to_string()))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a plaintext password into a PHC string
    pub fn hash(&self, plaintext: &str) -> Result<String, CredentialError> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2()
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| CredentialError::Hashing(e.to_string()))
    }

    /// Check a plaintext password against a stored hash.
    ///
    /// The cost parameters embedded in the stored hash are used, so hashes
    /// produced under an older cost keep verifying.
    pub fn verify(&self, plaintext: &str, hash: &str) -> bool {
        let parsed = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(error = %e, "Stored password hash is not a valid PHC string");
                return false;
            }
        };

        self.argon2()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }
}
