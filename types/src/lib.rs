//! Fundamental types for the coffer treasury engine.
//!
//! This crate defines the primitives shared across every other crate in the workspace:
//! addresses, amounts, timestamps and proposal identifiers, plus the traits for
//! the engine's external collaborators (clock and payment gateway).

pub mod address;
pub mod amount;
pub mod clock;
pub mod error;
pub mod id;
pub mod payment;
pub mod time;

pub use address::Address;
pub use amount::Wei;
pub use clock::{Clock, SystemClock};
pub use error::CofferError;
pub use id::ProposalId;
pub use payment::{PaymentError, PaymentGateway};
pub use time::Timestamp;
