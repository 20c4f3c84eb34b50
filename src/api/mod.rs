//! API module
//!
//! HTTP API endpoints and middleware.

pub mod middleware;
pub mod routes;
mod state;

pub use routes::{create_router, ApiResponse};
pub use state::AppState;
