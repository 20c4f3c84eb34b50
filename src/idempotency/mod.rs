//! Idempotency module
//!
//! Rejects payment submissions that repeat a recent one.

mod guard;

pub use guard::{DuplicateGuard, DUPLICATE_WINDOW_SECS};
