//! Spending proposals and the registry that stores them.

use crate::error::GovernanceError;
use coffer_types::{Address, ProposalId, Timestamp, Wei};
use serde::{Deserialize, Serialize};

/// Request to raise a new proposal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewProposal {
    pub title: String,
    pub description: String,
    pub beneficiary: Address,
    pub amount: Wei,
}

/// A request to disburse a fixed amount from the treasury to a beneficiary.
///
/// Everything except the tallies and the closing/payment fields is fixed at
/// creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub amount: Wei,
    pub title: String,
    pub description: String,
    pub up_votes: u64,
    pub down_votes: u64,
    pub created_at: Timestamp,
    /// Votes are accepted strictly before this instant.
    pub deadline: Timestamp,
    /// Latched once a vote is attempted at or after the deadline. Never cleared.
    pub closed: bool,
    /// false → true exactly once.
    pub paid: bool,
    pub beneficiary: Address,
    pub proposer: Address,
    /// Whoever triggered the disbursement. `None` until `paid`.
    pub executor: Option<Address>,
    pub paid_at: Option<Timestamp>,
}

impl Proposal {
    /// Whether a vote cast at `now` would be accepted by the window check.
    pub fn accepts_votes(&self, now: Timestamp) -> bool {
        !self.closed && !self.deadline.has_passed(now)
    }

    /// Strict majority approval. A tie does not pass.
    pub fn has_majority(&self) -> bool {
        self.up_votes > self.down_votes
    }
}

/// Dense arena of proposals indexed by [`ProposalId`].
#[derive(Clone, Debug, Default)]
pub struct ProposalRegistry {
    proposals: Vec<Proposal>,
}

impl ProposalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The id the next proposal will receive.
    pub fn next_id(&self) -> ProposalId {
        ProposalId::new(self.proposals.len() as u64)
    }

    /// Store a new proposal with zero tallies and the voting window starting at `now`.
    pub fn create(
        &mut self,
        proposer: &Address,
        request: NewProposal,
        now: Timestamp,
        voting_period_secs: u64,
    ) -> &Proposal {
        let id = self.next_id();
        self.proposals.push(Proposal {
            id,
            amount: request.amount,
            title: request.title,
            description: request.description,
            up_votes: 0,
            down_votes: 0,
            created_at: now,
            deadline: now.plus_secs(voting_period_secs),
            closed: false,
            paid: false,
            beneficiary: request.beneficiary,
            proposer: *proposer,
            executor: None,
            paid_at: None,
        });
        &self.proposals[id.index()]
    }

    pub fn get(&self, id: ProposalId) -> Result<&Proposal, GovernanceError> {
        self.proposals
            .get(id.index())
            .ok_or(GovernanceError::NotFound(id))
    }

    pub fn get_mut(&mut self, id: ProposalId) -> Result<&mut Proposal, GovernanceError> {
        self.proposals
            .get_mut(id.index())
            .ok_or(GovernanceError::NotFound(id))
    }

    /// Every proposal in ascending id order.
    pub fn all(&self) -> &[Proposal] {
        &self.proposals
    }

    pub fn len(&self) -> usize {
        self.proposals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proposals.is_empty()
    }

    /// Sum of the amounts of every paid proposal.
    pub fn total_paid(&self) -> Result<Wei, GovernanceError> {
        self.proposals
            .iter()
            .filter(|p| p.paid)
            .try_fold(Wei::ZERO, |acc, p| {
                acc.checked_add(p.amount).ok_or(GovernanceError::Overflow)
            })
    }

    /// Rebuild from stored proposals, which must be dense and in id order.
    pub(crate) fn from_proposals(proposals: Vec<Proposal>) -> Result<Self, GovernanceError> {
        for (index, p) in proposals.iter().enumerate() {
            if p.id.index() != index {
                return Err(GovernanceError::Snapshot(format!(
                    "proposal {} stored at position {}",
                    p.id, index
                )));
            }
            if p.paid != p.executor.is_some() {
                return Err(GovernanceError::Snapshot(format!(
                    "proposal {} has an executor without payment or vice versa",
                    p.id
                )));
            }
        }
        Ok(Self { proposals })
    }
}
