//! Nullable payment gateway — record transfers without moving value.

use coffer_types::{Address, PaymentError, PaymentGateway, Wei};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Code run "by the recipient" while a transfer is being delivered.
pub type ReceiptHook = Rc<dyn Fn(&Address, Wei)>;

/// A test gateway that records transfers instead of sending them.
///
/// It can be told to refuse transfers, and it can run a receipt hook during
/// delivery, which is how tests stand in for a beneficiary that calls back
/// into the treasury.
pub struct NullPayments {
    sent: RefCell<Vec<(Address, Wei)>>,
    failure: RefCell<Option<String>>,
    hook: RefCell<Option<ReceiptHook>>,
    attempts: Cell<u32>,
}

impl NullPayments {
    pub fn new() -> Self {
        Self {
            sent: RefCell::new(Vec::new()),
            failure: RefCell::new(None),
            hook: RefCell::new(None),
            attempts: Cell::new(0),
        }
    }

    /// Make every following transfer fail with `reason`.
    pub fn fail_with(&self, reason: impl Into<String>) {
        *self.failure.borrow_mut() = Some(reason.into());
    }

    /// Let transfers succeed again.
    pub fn succeed(&self) {
        *self.failure.borrow_mut() = None;
    }

    /// Install a hook that runs on every successful delivery.
    pub fn on_receipt(&self, hook: ReceiptHook) {
        *self.hook.borrow_mut() = Some(hook);
    }

    /// All delivered transfers, oldest first (for assertions).
    pub fn sent(&self) -> Vec<(Address, Wei)> {
        self.sent.borrow().clone()
    }

    /// Total value delivered to `to`.
    pub fn received_by(&self, to: &Address) -> Wei {
        self.sent
            .borrow()
            .iter()
            .filter(|(addr, _)| addr == to)
            .map(|(_, amount)| *amount)
            .sum()
    }

    /// Number of transfer calls, including refused ones.
    pub fn attempts(&self) -> u32 {
        self.attempts.get()
    }
}

impl Default for NullPayments {
    fn default() -> Self {
        Self::new()
    }
}

impl PaymentGateway for NullPayments {
    fn transfer(&self, to: &Address, amount: Wei) -> Result<(), PaymentError> {
        self.attempts.set(self.attempts.get() + 1);
        if let Some(reason) = self.failure.borrow().clone() {
            return Err(PaymentError {
                to: *to,
                amount,
                reason,
            });
        }
        self.sent.borrow_mut().push((*to, amount));
        // Clone out of the cell: the hook may re-enter and transfer again.
        let hook = self.hook.borrow().clone();
        if let Some(hook) = hook {
            hook(to, amount);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> Address {
        Address::new([n; 20])
    }

    #[test]
    fn test_records_transfers() {
        let payments = NullPayments::new();
        payments.transfer(&addr(1), Wei::new(10)).unwrap();
        payments.transfer(&addr(1), Wei::new(5)).unwrap();
        payments.transfer(&addr(2), Wei::new(7)).unwrap();
        assert_eq!(payments.sent().len(), 3);
        assert_eq!(payments.received_by(&addr(1)), Wei::new(15));
    }

    #[test]
    fn test_failure_records_nothing() {
        let payments = NullPayments::new();
        payments.fail_with("recipient rejected");
        let err = payments.transfer(&addr(1), Wei::new(10)).unwrap_err();
        assert_eq!(err.reason, "recipient rejected");
        assert!(payments.sent().is_empty());
        assert_eq!(payments.attempts(), 1);

        payments.succeed();
        assert!(payments.transfer(&addr(1), Wei::new(10)).is_ok());
    }

    #[test]
    fn test_hook_runs_on_delivery() {
        let payments = NullPayments::new();
        let seen = Rc::new(Cell::new(0u128));
        let seen_in_hook = seen.clone();
        payments.on_receipt(Rc::new(move |_, amount| seen_in_hook.set(amount.raw())));
        payments.transfer(&addr(3), Wei::new(42)).unwrap();
        assert_eq!(seen.get(), 42);
    }
}
