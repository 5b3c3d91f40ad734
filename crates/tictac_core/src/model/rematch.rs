//! # Rematch Negotiation Record
//!
//! Two `(player, decision)` pairs. The negotiation status is always derived
//! from the two decisions, never stored separately.

use serde::{Deserialize, Serialize};

use super::ids::{PlayerId, RematchId};

/// One party's answer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decision {
    /// No answer yet.
    #[default]
    Undecided,
    /// Wants a rematch.
    Yes,
    /// Declines.
    No,
}

/// Status derived from both decisions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RematchStatus {
    /// At least one party is undecided and nobody declined.
    Pending,
    /// Both said yes.
    Confirmed,
    /// Someone said no.
    Cancelled,
}

/// A rematch offer between the two participants of a finished game.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rematch {
    /// Rematch id.
    pub id: RematchId,
    parties: [(PlayerId, Decision); 2],
}

impl Rematch {
    /// Creates an offer with both decisions undecided.
    #[must_use]
    pub fn new(id: RematchId, first: PlayerId, second: PlayerId) -> Self {
        Self {
            id,
            parties: [(first, Decision::Undecided), (second, Decision::Undecided)],
        }
    }

    /// The two parties, in offer order.
    #[must_use]
    pub fn parties(&self) -> [&PlayerId; 2] {
        [&self.parties[0].0, &self.parties[1].0]
    }

    /// Decision of a party, `None` if `player` is not a party.
    #[must_use]
    pub fn decision_of(&self, player: &PlayerId) -> Option<Decision> {
        self.parties
            .iter()
            .find(|(party, _)| party == player)
            .map(|(_, decision)| *decision)
    }

    /// The other party.
    #[must_use]
    pub fn other_party(&self, player: &PlayerId) -> Option<&PlayerId> {
        match &self.parties {
            [(first, _), (second, _)] if first == player => Some(second),
            [(first, _), (second, _)] if second == player => Some(first),
            _ => None,
        }
    }

    /// Records a decision. Returns false if `player` is not a party.
    pub fn decide(&mut self, player: &PlayerId, decision: Decision) -> bool {
        match self.parties.iter_mut().find(|(party, _)| party == player) {
            Some(slot) => {
                slot.1 = decision;
                true
            }
            None => false,
        }
    }

    /// Derives the negotiation status from the two decisions.
    #[must_use]
    pub fn status(&self) -> RematchStatus {
        let decisions = [self.parties[0].1, self.parties[1].1];
        if decisions.contains(&Decision::No) {
            RematchStatus::Cancelled
        } else if decisions == [Decision::Yes, Decision::Yes] {
            RematchStatus::Confirmed
        } else {
            RematchStatus::Pending
        }
    }
}
