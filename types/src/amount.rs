//! Native value amounts.
//!
//! Amounts are represented as fixed-point integers (u128) to avoid floating-point errors.
//! The smallest unit is 1 wei; one ether is 10^18 wei.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An amount of native value, stored in wei.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Wei(u128);

impl Wei {
    pub const ZERO: Self = Self(0);

    /// 10^9 wei.
    pub const GWEI: Self = Self(1_000_000_000);

    /// 10^18 wei.
    pub const ETHER: Self = Self(1_000_000_000_000_000_000);

    pub const fn new(raw: u128) -> Self {
        Self(raw)
    }

    /// Whole ether, e.g. `Wei::from_ether(2)`.
    pub const fn from_ether(ether: u64) -> Self {
        Self(ether as u128 * Self::ETHER.0)
    }

    /// Thousandths of an ether, e.g. `Wei::from_milliether(100)` is 0.1 ether.
    pub const fn from_milliether(milli: u64) -> Self {
        Self(milli as u128 * (Self::ETHER.0 / 1_000))
    }

    pub fn raw(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }
}

impl fmt::Display for Wei {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} wei", self.0)
    }
}

impl From<u128> for Wei {
    fn from(raw: u128) -> Self {
        Self(raw)
    }
}

impl std::iter::Sum for Wei {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        Self(iter.map(|w| w.0).sum())
    }
}
