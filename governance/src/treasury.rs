//! Treasury ledger — the pooled, non-earmarked balance.
//!
//! Credited only by contributions and debited only by successful
//! disbursements, so `balance == total_contributed - total_disbursed` holds
//! after every operation.

use crate::error::GovernanceError;
use coffer_types::Wei;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreasuryLedger {
    balance: Wei,
    total_contributed: Wei,
    total_disbursed: Wei,
}

impl TreasuryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance(&self) -> Wei {
        self.balance
    }

    pub fn total_contributed(&self) -> Wei {
        self.total_contributed
    }

    pub fn total_disbursed(&self) -> Wei {
        self.total_disbursed
    }

    /// Fail with `InsufficientFunds` unless `amount` can be paid out.
    pub fn check_funds(&self, amount: Wei) -> Result<(), GovernanceError> {
        if self.balance < amount {
            return Err(GovernanceError::InsufficientFunds {
                needed: amount,
                available: self.balance,
            });
        }
        Ok(())
    }

    /// Both totals after crediting `amount`, without applying them.
    pub fn preview_credit(&self, amount: Wei) -> Result<TreasuryLedger, GovernanceError> {
        Ok(TreasuryLedger {
            balance: self
                .balance
                .checked_add(amount)
                .ok_or(GovernanceError::Overflow)?,
            total_contributed: self
                .total_contributed
                .checked_add(amount)
                .ok_or(GovernanceError::Overflow)?,
            total_disbursed: self.total_disbursed,
        })
    }

    /// Both totals after debiting `amount`, without applying them.
    pub fn preview_debit(&self, amount: Wei) -> Result<TreasuryLedger, GovernanceError> {
        self.check_funds(amount)?;
        Ok(TreasuryLedger {
            balance: self.balance.saturating_sub(amount),
            total_contributed: self.total_contributed,
            total_disbursed: self
                .total_disbursed
                .checked_add(amount)
                .ok_or(GovernanceError::Overflow)?,
        })
    }

    /// Commit a previewed state.
    pub fn commit(&mut self, next: TreasuryLedger) {
        *self = next;
    }

    /// Whether the conservation identity holds.
    pub fn is_conserved(&self) -> bool {
        self.total_contributed.checked_sub(self.total_disbursed) == Some(self.balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credit_and_debit() {
        let mut ledger = TreasuryLedger::new();
        let next = ledger.preview_credit(Wei::new(100)).unwrap();
        assert_eq!(ledger.balance(), Wei::ZERO);
        ledger.commit(next);
        assert_eq!(ledger.balance(), Wei::new(100));

        let next = ledger.preview_debit(Wei::new(30)).unwrap();
        ledger.commit(next);
        assert_eq!(ledger.balance(), Wei::new(70));
        assert_eq!(ledger.total_contributed(), Wei::new(100));
        assert_eq!(ledger.total_disbursed(), Wei::new(30));
        assert!(ledger.is_conserved());
    }

    #[test]
    fn test_debit_beyond_balance_fails() {
        let mut ledger = TreasuryLedger::new();
        let next = ledger.preview_credit(Wei::new(10)).unwrap();
        ledger.commit(next);
        match ledger.preview_debit(Wei::new(11)) {
            Err(GovernanceError::InsufficientFunds { needed, available }) => {
                assert_eq!(needed, Wei::new(11));
                assert_eq!(available, Wei::new(10));
            }
            other => panic!("expected InsufficientFunds, got {:?}", other),
        }
        assert!(ledger.preview_debit(Wei::new(10)).is_ok());
    }

    #[test]
    fn test_credit_overflow() {
        let mut ledger = TreasuryLedger::new();
        let next = ledger.preview_credit(Wei::new(u128::MAX)).unwrap();
        ledger.commit(next);
        assert!(matches!(
            ledger.preview_credit(Wei::new(1)),
            Err(GovernanceError::Overflow)
        ));
    }
}
