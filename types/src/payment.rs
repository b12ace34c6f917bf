//! Outbound value transfer primitive.

use crate::address::Address;
use crate::amount::Wei;
use thiserror::Error;

/// Why an outbound transfer did not go through.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("transfer of {amount} to {to} failed: {reason}")]
pub struct PaymentError {
    pub to: Address,
    pub amount: Wei,
    pub reason: String,
}

/// Performs the actual outbound payment and reports the outcome synchronously.
///
/// The recipient may run arbitrary code while receiving (a receipt hook),
/// including calls back into whoever initiated the transfer.
pub trait PaymentGateway {
    fn transfer(&self, to: &Address, amount: Wei) -> Result<(), PaymentError>;
}
