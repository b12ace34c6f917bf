//! Audit events emitted on every successful state mutation.

use crate::membership::Role;
use crate::vote::VoteChoice;
use coffer_types::{Address, ProposalId, Timestamp, Wei};
use serde::{Deserialize, Serialize};

/// A durable audit record for indexers and dashboards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreasuryEvent {
    /// Who performed the action.
    pub actor: Address,
    /// The actor's role after the action.
    pub role: Role,
    pub description: String,
    /// Beneficiary, or the treasury itself for contributions.
    pub target: Address,
    pub at: Timestamp,
    pub kind: EventKind,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Contribution {
        amount: Wei,
        balance: Wei,
    },
    ProposalCreated {
        id: ProposalId,
        amount: Wei,
    },
    VoteCast {
        id: ProposalId,
        choice: VoteChoice,
        up_votes: u64,
        down_votes: u64,
    },
    Payment {
        id: ProposalId,
        amount: Wei,
        balance: Wei,
    },
}

impl TreasuryEvent {
    /// Render as a single JSON object.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Synchronous fan-out event bus for treasury events.
///
/// Listeners are invoked inline on the calling thread after the mutation has
/// been committed.
pub struct EventBus {
    listeners: Vec<Box<dyn Fn(&TreasuryEvent)>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&TreasuryEvent)>) {
        self.listeners.push(listener);
    }

    pub fn emit(&self, event: &TreasuryEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn sample() -> TreasuryEvent {
        TreasuryEvent {
            actor: Address::new([1; 20]),
            role: Role::Stakeholder,
            description: "payment transferred".into(),
            target: Address::new([2; 20]),
            at: Timestamp::new(50),
            kind: EventKind::Payment {
                id: ProposalId::new(3),
                amount: Wei::new(10),
                balance: Wei::new(90),
            },
        }
    }

    #[test]
    fn test_all_listeners_receive_event() {
        let mut bus = EventBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        for _ in 0..2 {
            let seen = seen.clone();
            bus.subscribe(Box::new(move |e| seen.borrow_mut().push(e.clone())));
        }
        bus.emit(&sample());
        assert_eq!(bus.listener_count(), 2);
        assert_eq!(seen.borrow().len(), 2);
    }

    #[test]
    fn test_json_shape() {
        let json = sample().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["role"], "Stakeholder");
        assert_eq!(value["kind"]["payment"]["id"], 3);
        assert_eq!(value["kind"]["payment"]["balance"], 90);
        assert_eq!(value["actor"], format!("0x{}", "01".repeat(20)));
    }
}
