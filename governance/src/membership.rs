//! Membership ledger — cumulative contributions and the roles derived from them.
//!
//! Roles are never stored. They are recomputed from `contribution_total` on
//! every read, and since contributions only ever grow, promotion is one-way.

use crate::error::GovernanceError;
use coffer_types::{Address, Timestamp, Wei};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Role derived from a member's cumulative contribution.
///
/// Ordered: every stakeholder is also a collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    None,
    Collaborator,
    Stakeholder,
}

impl Role {
    /// Derive the role for a contribution total against the minimum stake.
    pub fn for_contribution(total: Wei, min_stake: Wei) -> Self {
        if total >= min_stake && !total.is_zero() {
            Self::Stakeholder
        } else if !total.is_zero() {
            Self::Collaborator
        } else {
            Self::None
        }
    }

    pub fn is_collaborator(&self) -> bool {
        *self >= Self::Collaborator
    }

    pub fn is_stakeholder(&self) -> bool {
        *self == Self::Stakeholder
    }

    /// Tag carried in emitted events.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Collaborator => "COLLABORATOR",
            Self::Stakeholder => "STAKEHOLDER",
        }
    }

    /// Name used in authorization errors.
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Collaborator => "collaborator",
            Self::Stakeholder => "stakeholder",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A party that has contributed at least once.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub address: Address,
    pub contribution_total: Wei,
    pub first_contribution_at: Timestamp,
}

/// Outcome of a single contribution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Contribution {
    pub contribution_total: Wei,
    pub role: Role,
    /// The contribution crossed the minimum stake.
    pub promoted: bool,
}

/// Per-address contribution totals. Members are created on first
/// contribution and never removed.
#[derive(Clone, Debug, Default)]
pub struct MembershipLedger {
    members: BTreeMap<Address, Member>,
    min_stake: Wei,
}

impl MembershipLedger {
    pub fn new(min_stake: Wei) -> Self {
        Self {
            members: BTreeMap::new(),
            min_stake,
        }
    }

    pub fn min_stake(&self) -> Wei {
        self.min_stake
    }

    /// Work out the effect of contributing `amount` without applying it.
    pub fn preview(&self, address: &Address, amount: Wei) -> Result<Contribution, GovernanceError> {
        let before = self.contribution_of(address);
        let total = before.checked_add(amount).ok_or(GovernanceError::Overflow)?;
        let role = Role::for_contribution(total, self.min_stake);
        Ok(Contribution {
            contribution_total: total,
            role,
            promoted: role.is_stakeholder() && !self.role_of(address).is_stakeholder(),
        })
    }

    /// Record an already-previewed contribution.
    pub fn apply(&mut self, address: &Address, contribution: &Contribution, now: Timestamp) {
        self.members
            .entry(*address)
            .and_modify(|m| m.contribution_total = contribution.contribution_total)
            .or_insert_with(|| Member {
                address: *address,
                contribution_total: contribution.contribution_total,
                first_contribution_at: now,
            });
    }

    pub fn contribution_of(&self, address: &Address) -> Wei {
        self.members
            .get(address)
            .map(|m| m.contribution_total)
            .unwrap_or(Wei::ZERO)
    }

    pub fn role_of(&self, address: &Address) -> Role {
        Role::for_contribution(self.contribution_of(address), self.min_stake)
    }

    pub fn get(&self, address: &Address) -> Option<&Member> {
        self.members.get(address)
    }

    /// Members in address order.
    pub fn iter(&self) -> impl Iterator<Item = &Member> {
        self.members.values()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Sum of every member's contributions.
    pub fn total_contributed(&self) -> Result<Wei, GovernanceError> {
        self.members.values().try_fold(Wei::ZERO, |acc, m| {
            acc.checked_add(m.contribution_total)
                .ok_or(GovernanceError::Overflow)
        })
    }

    /// Require at least `required` for `caller`, returning the caller's role.
    pub fn authorize(&self, caller: &Address, required: Role) -> Result<Role, GovernanceError> {
        let role = self.role_of(caller);
        if role >= required {
            Ok(role)
        } else {
            Err(GovernanceError::Unauthorized {
                caller: *caller,
                required: required.name(),
            })
        }
    }

    pub(crate) fn insert(&mut self, member: Member) {
        self.members.insert(member.address, member);
    }
}
