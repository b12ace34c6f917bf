//! Vote journal — append-only vote records plus the per-voter index used to
//! refuse a second vote on the same proposal.

use crate::error::GovernanceError;
use coffer_types::{Address, ProposalId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoteChoice {
    Approve,
    Reject,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub proposal: ProposalId,
    pub voter: Address,
    pub timestamp: Timestamp,
    pub choice: VoteChoice,
}

#[derive(Clone, Debug, Default)]
pub struct VoteJournal {
    /// proposal → votes in casting order.
    by_proposal: HashMap<ProposalId, Vec<VoteRecord>>,
    /// voter → proposals voted on, in casting order.
    by_voter: HashMap<Address, Vec<ProposalId>>,
    /// O(1) double-vote lookup.
    cast: HashSet<(Address, ProposalId)>,
    /// Global casting order, kept for snapshots.
    order: Vec<(ProposalId, usize)>,
}

impl VoteJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_voted(&self, voter: &Address, proposal: ProposalId) -> bool {
        self.cast.contains(&(*voter, proposal))
    }

    /// Fail with `DoubleVote` if `voter` already voted on `proposal`.
    pub fn check_not_voted(&self, voter: &Address, proposal: ProposalId) -> Result<(), GovernanceError> {
        if self.has_voted(voter, proposal) {
            return Err(GovernanceError::DoubleVote {
                voter: *voter,
                proposal,
            });
        }
        Ok(())
    }

    /// Append a vote. Callers must have checked [`Self::check_not_voted`].
    pub fn record(&mut self, record: VoteRecord) -> &VoteRecord {
        self.cast.insert((record.voter, record.proposal));
        self.by_voter
            .entry(record.voter)
            .or_default()
            .push(record.proposal);
        let proposal = record.proposal;
        let votes = self.by_proposal.entry(proposal).or_default();
        votes.push(record);
        let index = votes.len() - 1;
        self.order.push((proposal, index));
        &votes[index]
    }

    /// Votes on `proposal` in casting order.
    pub fn votes_for(&self, proposal: ProposalId) -> &[VoteRecord] {
        self.by_proposal
            .get(&proposal)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Proposals `voter` has voted on, in casting order.
    pub fn voted_by(&self, voter: &Address) -> &[ProposalId] {
        self.by_voter.get(voter).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every vote in global casting order.
    pub fn iter(&self) -> impl Iterator<Item = &VoteRecord> + '_ {
        self.order
            .iter()
            .map(move |(proposal, index)| &self.by_proposal[proposal][*index])
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
