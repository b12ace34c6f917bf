//! Non-reentrant critical section around balance-mutating operations.

use crate::error::GovernanceError;
use std::cell::Cell;

/// Ledger-wide in-progress flag.
///
/// [`ReentrancyGuard::enter`] hands out a [`GuardToken`]; the flag is cleared
/// when the token is dropped, on every exit path.
#[derive(Debug, Default)]
pub struct ReentrancyGuard {
    entered: Cell<bool>,
}

impl ReentrancyGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(&self) -> Result<GuardToken<'_>, GovernanceError> {
        if self.entered.replace(true) {
            return Err(GovernanceError::Reentrancy);
        }
        Ok(GuardToken { guard: self })
    }

    pub fn is_entered(&self) -> bool {
        self.entered.get()
    }
}

#[must_use = "the critical section ends when the token is dropped"]
#[derive(Debug)]
pub struct GuardToken<'a> {
    guard: &'a ReentrancyGuard,
}

impl Drop for GuardToken<'_> {
    fn drop(&mut self) {
        self.guard.entered.set(false);
    }
}
