//! Token Authority
//!
//! Issues and validates HS256 access and refresh tokens. Each kind is
//! signed with its own secret and also carries its kind in the claims, so
//! neither kind can ever pass as the other.
//!
//! Tokens are bearer capabilities: nothing is stored server-side and the
//! only way a token stops working is by reaching its `exp`. Refresh tokens
//! are not rotated when used.

use std::sync::Arc;

use chrono::Duration;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::domain::Clock;

/// Default lifetime of both token kinds
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 60;

/// Longest configurable lifetime (366 days)
pub const MAX_TOKEN_TTL_MINUTES: i64 = 366 * 24 * 60;

/// Token kind, embedded in the claims and selecting the signing secret
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Access => write!(f, "access"),
            TokenKind::Refresh => write!(f, "refresh"),
        }
    }
}

/// Signed claims set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Account id
    pub sub: String,
    pub kind: TokenKind,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expires at (unix seconds)
    pub exp: i64,
    /// Expires at (unix microseconds). Authoritative for expiry checks.
    pub exp_us: i64,
}

/// Access/refresh pair returned on login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Why a token was rejected. Only used for logging; callers see
/// `TokenError::InvalidToken` for all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRejection {
    Malformed,
    BadSignature,
    WrongKind { expected: TokenKind, found: TokenKind },
    Expired,
}

impl std::fmt::Display for TokenRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenRejection::Malformed => write!(f, "malformed"),
            TokenRejection::BadSignature => write!(f, "bad signature"),
            TokenRejection::WrongKind { expected, found } => {
                write!(f, "expected {} token, found {}", expected, found)
            }
            TokenRejection::Expired => write!(f, "expired"),
        }
    }
}

/// Token Authority Error
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("invalid or expired token")]
    InvalidToken,

    #[error("Token signing failed: {0}")]
    Signing(String),

    #[error("Access and refresh secrets must be non-empty and distinct")]
    SharedSecret,

    #[error("Token lifetime out of range")]
    LifetimeOutOfRange,
}

struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KeyPair {
    fn from_secret(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

/// Issues, validates and refreshes tokens
pub struct TokenAuthority {
    access: KeyPair,
    refresh: KeyPair,
    access_ttl: Duration,
    refresh_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for TokenAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenAuthority")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenAuthority {
    /// Create an authority with the default 60 minute lifetimes
    pub fn new(
        access_secret: &[u8],
        refresh_secret: &[u8],
        clock: Arc<dyn Clock>,
    ) -> Result<Self, TokenError> {
        if access_secret.is_empty() || refresh_secret.is_empty() || access_secret == refresh_secret
        {
            return Err(TokenError::SharedSecret);
        }

        Ok(Self {
            access: KeyPair::from_secret(access_secret),
            refresh: KeyPair::from_secret(refresh_secret),
            access_ttl: Duration::minutes(DEFAULT_TOKEN_TTL_MINUTES),
            refresh_ttl: Duration::minutes(DEFAULT_TOKEN_TTL_MINUTES),
            clock,
        })
    }

    /// Override the lifetimes used by `issue_pair` and `refresh`
    pub fn with_ttls(mut self, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        self.access_ttl = access_ttl;
        self.refresh_ttl = refresh_ttl;
        self
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    fn keys(&self, kind: TokenKind) -> &KeyPair {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    // =========================================================================
    // Issuance
    // =========================================================================

    fn issue(&self, kind: TokenKind, subject: &str, ttl: Duration) -> Result<String, TokenError> {
        let now = self.clock.now();
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or(TokenError::LifetimeOutOfRange)?;
        let claims = Claims {
            sub: subject.to_string(),
            kind,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            exp_us: expires_at.timestamp_micros(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.keys(kind).encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Issue an access token for `subject`
    pub fn issue_access(&self, subject: &str, ttl: Duration) -> Result<String, TokenError> {
        self.issue(TokenKind::Access, subject, ttl)
    }

    /// Issue a refresh token for `subject`
    pub fn issue_refresh(&self, subject: &str, ttl: Duration) -> Result<String, TokenError> {
        self.issue(TokenKind::Refresh, subject, ttl)
    }

    /// Issue an access/refresh pair with the configured lifetimes
    pub fn issue_pair(&self, subject: &str) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access_token: self.issue_access(subject, self.access_ttl)?,
            refresh_token: self.issue_refresh(subject, self.refresh_ttl)?,
        })
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Check a token and report exactly why it failed.
    ///
    /// Signature is checked under the secret of `expected`, then the
    /// embedded kind, then expiry against the injected clock. A token is
    /// invalid from the microsecond its `exp_us` is reached.
    pub fn inspect(&self, token: &str, expected: TokenKind) -> Result<Claims, TokenRejection> {
        let mut validation = Validation::new(Algorithm::HS256);
        // expiry is checked below against the injected clock
        validation.validate_exp = false;

        let data = decode::<Claims>(token, &self.keys(expected).decoding, &validation).map_err(
            |e| match e.kind() {
                ErrorKind::InvalidSignature => TokenRejection::BadSignature,
                _ => TokenRejection::Malformed,
            },
        )?;
        let claims = data.claims;

        if claims.kind != expected {
            return Err(TokenRejection::WrongKind {
                expected,
                found: claims.kind,
            });
        }

        if self.clock.now().timestamp_micros() >= claims.exp_us {
            return Err(TokenRejection::Expired);
        }

        Ok(claims)
    }

    /// Validate a token of the expected kind
    pub fn validate(&self, token: &str, expected: TokenKind) -> Result<Claims, TokenError> {
        self.inspect(token, expected).map_err(|reason| {
            tracing::warn!(kind = %expected, reason = %reason, "Token rejected");
            TokenError::InvalidToken
        })
    }

    /// Mint a fresh access token from a valid refresh token.
    ///
    /// The refresh token itself stays valid until its own expiry.
    pub fn refresh(&self, refresh_token: &str) -> Result<String, TokenError> {
        let claims = self.validate(refresh_token, TokenKind::Refresh)?;
        tracing::debug!(subject = %claims.sub, "Issuing access token from refresh token");
        self.issue_access(&claims.sub, self.access_ttl)
    }
}
