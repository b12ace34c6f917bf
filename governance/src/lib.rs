//! Membership-gated treasury governance.
//!
//! Parties contribute value and earn a role from their cumulative
//! contribution. Stakeholders raise spending proposals against the pooled
//! treasury and vote on them within a fixed window; the deployer releases
//! funds for a proposal with a strict majority, exactly once.
//!
//! Key principle: one stakeholder = one vote (not contribution-weighted).
//! Funds are pooled, not earmarked: passed proposals compete for the balance.

pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod guard;
pub mod membership;
pub mod proposal;
pub mod snapshot;
pub mod treasury;
pub mod vote;

pub use config::GovernanceConfig;
pub use engine::{ContributionReceipt, TreasuryEngine};
pub use error::{ErrorKind, GovernanceError};
pub use event::{EventBus, EventKind, TreasuryEvent};
pub use guard::{GuardToken, ReentrancyGuard};
pub use membership::{Member, MembershipLedger, Role};
pub use proposal::{NewProposal, Proposal, ProposalRegistry};
pub use snapshot::{TreasurySnapshot, SNAPSHOT_VERSION};
pub use treasury::TreasuryLedger;
pub use vote::{VoteChoice, VoteJournal, VoteRecord};
