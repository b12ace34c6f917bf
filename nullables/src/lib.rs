//! Nullable infrastructure for deterministic testing.
//!
//! The engine's external collaborators (clock, payment gateway) are abstracted
//! behind traits in `coffer-types`. This crate provides test-friendly
//! implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never move real value
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod payments;

pub use clock::NullClock;
pub use payments::{NullPayments, ReceiptHook};
