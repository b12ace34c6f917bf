use coffer_types::{Address, PaymentError, ProposalId, Wei};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GovernanceError {
    #[error("{caller} does not hold the {required} role")]
    Unauthorized {
        caller: Address,
        required: &'static str,
    },

    #[error("amount must be greater than zero")]
    InvalidAmount,

    #[error("proposal {0} not found")]
    NotFound(ProposalId),

    #[error("proposal {0} has already been paid")]
    AlreadyPaid(ProposalId),

    #[error("{voter} has already voted on proposal {proposal}")]
    DoubleVote { voter: Address, proposal: ProposalId },

    #[error("voting on proposal {0} is closed")]
    VotingClosed(ProposalId),

    #[error("proposal lacks a majority: {up} up, {down} down")]
    InsufficientVotes { up: u64, down: u64 },

    #[error("insufficient treasury funds: need {needed}, have {available}")]
    InsufficientFunds { needed: Wei, available: Wei },

    #[error("payment failed: {0}")]
    PaymentFailed(#[from] PaymentError),

    #[error("a disbursement is already in progress")]
    Reentrancy,

    #[error("arithmetic overflow in treasury accounting")]
    Overflow,

    #[error("config error: {0}")]
    Config(String),

    #[error("snapshot error: {0}")]
    Snapshot(String),
}

/// Coarse classification of a [`GovernanceError`], for callers that branch
/// on the class rather than the exact variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Authorization,
    Validation,
    StateConflict,
    ExternalFailure,
    Concurrency,
    Internal,
}

impl GovernanceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized { .. } => ErrorKind::Authorization,
            Self::InvalidAmount | Self::NotFound(_) => ErrorKind::Validation,
            Self::AlreadyPaid(_)
            | Self::DoubleVote { .. }
            | Self::VotingClosed(_)
            | Self::InsufficientVotes { .. }
            | Self::InsufficientFunds { .. } => ErrorKind::StateConflict,
            Self::PaymentFailed(_) => ErrorKind::ExternalFailure,
            Self::Reentrancy => ErrorKind::Concurrency,
            Self::Overflow | Self::Config(_) | Self::Snapshot(_) => ErrorKind::Internal,
        }
    }

    /// Short stable name of the variant, used as a log field.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized { .. } => "unauthorized",
            Self::InvalidAmount => "invalid_amount",
            Self::NotFound(_) => "not_found",
            Self::AlreadyPaid(_) => "already_paid",
            Self::DoubleVote { .. } => "double_vote",
            Self::VotingClosed(_) => "voting_closed",
            Self::InsufficientVotes { .. } => "insufficient_votes",
            Self::InsufficientFunds { .. } => "insufficient_funds",
            Self::PaymentFailed(_) => "payment_failed",
            Self::Reentrancy => "reentrancy",
            Self::Overflow => "overflow",
            Self::Config(_) => "config",
            Self::Snapshot(_) => "snapshot",
        }
    }
}
