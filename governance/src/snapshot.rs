//! Treasury snapshots — capture the full engine state at a point in time.
//!
//! A snapshot is plain serde data, so it can be written out as JSON and later
//! restored into a fresh engine. Restoring re-checks the accounting
//! invariants instead of trusting the stored totals.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use coffer_types::{Address, ProposalId, Timestamp, Wei};

use crate::engine::EngineState;
use crate::error::GovernanceError;
use crate::event::TreasuryEvent;
use crate::membership::{Member, MembershipLedger};
use crate::proposal::{Proposal, ProposalRegistry};
use crate::treasury::TreasuryLedger;
use crate::vote::{VoteChoice, VoteJournal, VoteRecord};

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreasurySnapshot {
    pub version: u32,
    pub deployer: Address,
    pub taken_at: Timestamp,
    /// Members in address order.
    pub members: Vec<Member>,
    /// Proposals in id order.
    pub proposals: Vec<Proposal>,
    /// Votes in casting order.
    pub votes: Vec<VoteRecord>,
    pub treasury: TreasuryLedger,
    pub events: Vec<TreasuryEvent>,
}

impl TreasurySnapshot {
    pub(crate) fn capture(state: &EngineState, deployer: Address, taken_at: Timestamp) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            deployer,
            taken_at,
            members: state.members.iter().cloned().collect(),
            proposals: state.proposals.all().to_vec(),
            votes: state.votes.iter().cloned().collect(),
            treasury: state.treasury.clone(),
            events: state.events.clone(),
        }
    }

    pub fn to_json(&self) -> Result<String, GovernanceError> {
        serde_json::to_string_pretty(self).map_err(|e| GovernanceError::Snapshot(e.to_string()))
    }

    pub fn from_json(s: &str) -> Result<Self, GovernanceError> {
        serde_json::from_str(s).map_err(|e| GovernanceError::Snapshot(e.to_string()))
    }

    /// Validate and rebuild the engine state.
    pub(crate) fn into_state(self, min_stake: Wei) -> Result<EngineState, GovernanceError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(GovernanceError::Snapshot(format!(
                "unsupported snapshot version {}",
                self.version
            )));
        }

        let mut members = MembershipLedger::new(min_stake);
        for member in self.members {
            if member.contribution_total.is_zero() {
                return Err(GovernanceError::Snapshot(format!(
                    "member {} has no contributions",
                    member.address
                )));
            }
            members.insert(member);
        }

        let proposals = ProposalRegistry::from_proposals(self.proposals)?;

        let mut votes = VoteJournal::new();
        let mut tallies: HashMap<ProposalId, (u64, u64)> = HashMap::new();
        for record in self.votes {
            proposals.get(record.proposal).map_err(|_| {
                GovernanceError::Snapshot(format!(
                    "vote by {} references unknown proposal {}",
                    record.voter, record.proposal
                ))
            })?;
            if votes.has_voted(&record.voter, record.proposal) {
                return Err(GovernanceError::Snapshot(format!(
                    "{} voted twice on proposal {}",
                    record.voter, record.proposal
                )));
            }
            let tally = tallies.entry(record.proposal).or_default();
            match record.choice {
                VoteChoice::Approve => tally.0 += 1,
                VoteChoice::Reject => tally.1 += 1,
            }
            votes.record(record);
        }
        for index in 0..proposals.len() {
            let id = ProposalId::new(index as u64);
            let proposal = proposals.get(id)?;
            let (up, down) = tallies.get(&id).copied().unwrap_or_default();
            if (proposal.up_votes, proposal.down_votes) != (up, down) {
                return Err(GovernanceError::Snapshot(format!(
                    "proposal {} tally {}/{} does not match {} recorded votes",
                    id,
                    proposal.up_votes,
                    proposal.down_votes,
                    up + down
                )));
            }
        }

        let treasury = self.treasury;
        if !treasury.is_conserved() {
            return Err(GovernanceError::Snapshot(
                "balance does not equal contributions minus disbursements".into(),
            ));
        }
        if members.total_contributed()? != treasury.total_contributed() {
            return Err(GovernanceError::Snapshot(
                "member contributions do not add up to the treasury total".into(),
            ));
        }
        if proposals.total_paid()? != treasury.total_disbursed() {
            return Err(GovernanceError::Snapshot(
                "paid proposals do not add up to the disbursed total".into(),
            ));
        }

        Ok(EngineState {
            members,
            proposals,
            votes,
            treasury,
            events: self.events,
        })
    }
}
