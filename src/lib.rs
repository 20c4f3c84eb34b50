//! paygate Library
//!
//! Authentication and payment admission service. Re-exports modules for
//! the binary and for integration testing.

pub mod api;
pub mod config;
pub mod credentials;
pub mod db;
pub mod domain;
mod error;
pub mod gateway;
pub mod handlers;
pub mod idempotency;
pub mod store;
pub mod tokens;

pub use config::{Config, ConfigError, LogFormat};
pub use error::{AppError, AppResult, ErrorResponse};
pub use domain::{DomainError, OperationContext};
