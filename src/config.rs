//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;
use std::time::Duration;

use crate::tokens::{DEFAULT_TOKEN_TTL_MINUTES, MAX_TOKEN_TTL_MINUTES};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Maximum database connections in pool
    pub database_max_connections: u32,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,

    pub log_format: LogFormat,

    /// HS256 secret for access tokens
    pub access_token_secret: String,

    /// HS256 secret for refresh tokens, distinct from the access secret
    pub refresh_token_secret: String,

    pub access_token_ttl_minutes: i64,

    pub refresh_token_ttl_minutes: i64,

    /// Simulated gateway latency
    pub payment_processing_delay: Duration,

    /// Whole-request timeout at the HTTP boundary
    pub request_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url =
            lookup("DATABASE_URL").ok_or(ConfigError::MissingEnv("DATABASE_URL"))?;

        let database_max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?;

        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());

        let port = parse_or(&lookup, "PORT", 8080)?;

        let environment = lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string());

        let log_format = match lookup("LOG_FORMAT").as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(_) => return Err(ConfigError::InvalidValue("LOG_FORMAT")),
        };

        let access_token_secret = lookup("ACCESS_TOKEN_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingEnv("ACCESS_TOKEN_SECRET"))?;

        let refresh_token_secret = lookup("REFRESH_TOKEN_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingEnv("REFRESH_TOKEN_SECRET"))?;

        if access_token_secret == refresh_token_secret {
            return Err(ConfigError::SharedTokenSecret);
        }

        let access_token_ttl_minutes =
            parse_or(&lookup, "ACCESS_TOKEN_TTL_MINUTES", DEFAULT_TOKEN_TTL_MINUTES)?;

        let refresh_token_ttl_minutes =
            parse_or(&lookup, "REFRESH_TOKEN_TTL_MINUTES", DEFAULT_TOKEN_TTL_MINUTES)?;

        if !(1..=MAX_TOKEN_TTL_MINUTES).contains(&access_token_ttl_minutes) {
            return Err(ConfigError::InvalidValue("ACCESS_TOKEN_TTL_MINUTES"));
        }
        if !(1..=MAX_TOKEN_TTL_MINUTES).contains(&refresh_token_ttl_minutes) {
            return Err(ConfigError::InvalidValue("REFRESH_TOKEN_TTL_MINUTES"));
        }

        let payment_processing_delay =
            Duration::from_millis(parse_or(&lookup, "PAYMENT_PROCESSING_DELAY_MS", 2000)?);

        let request_timeout = Duration::from_secs(parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 30)?);

        Ok(Self {
            database_url,
            database_max_connections,
            host,
            port,
            environment,
            log_format,
            access_token_secret,
            refresh_token_secret,
            access_token_ttl_minutes,
            refresh_token_ttl_minutes,
            payment_processing_delay,
            request_timeout,
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(value) => value.parse().map_err(|_| ConfigError::InvalidValue(key)),
        None => Ok(default),
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),

    #[error("ACCESS_TOKEN_SECRET and REFRESH_TOKEN_SECRET must differ")]
    SharedTokenSecret,
}
