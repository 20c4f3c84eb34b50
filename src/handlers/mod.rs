//! Command Handlers module
//!
//! Orchestrators that sit between the HTTP layer and the core components.
//! Each handler receives its store handles and collaborators at construction.

mod account_gate;
mod auth_handler;
mod commands;
mod payment_handler;


pub use account_gate::AccountGate;
pub use auth_handler::AuthHandler;
pub use commands::*;
pub use payment_handler::AdmissionPipeline;
