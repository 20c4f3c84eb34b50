//! Domain module
//!
//! Core domain types shared by the auth and payment subsystems.

pub mod account;
pub mod clock;
pub mod context;
pub mod error;
pub mod payment;

pub use account::{Account, AccountChanges, AccountView, NewAccount, Provider};
pub use clock::{Clock, ManualClock, SystemClock};
pub use context::OperationContext;
pub use error::DomainError;
pub use payment::{
    validate_submission, NewTransaction, PaymentDetails, PaymentFingerprint, PaymentMethod,
    Transaction,
};
