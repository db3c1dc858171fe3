use serde::{Deserialize, Serialize};

use crate::domain::person::PersonId;
use crate::domain::round::RoundId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchId(pub i64);

/// A pairing between two people in a round. The pair is unordered; which
/// person lands in which slot is an artifact of pair formation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub round_id: RoundId,
    pub person_1: PersonId,
    pub person_2: PersonId,
    /// Slack group DM opened for this pair, once known.
    pub conversation_id: Option<String>,
    /// Whether the pair actually met. `None` means no feedback yet.
    pub met: Option<bool>,
}

impl Match {
    pub fn involves(&self, person: PersonId) -> bool {
        self.person_1 == person || self.person_2 == person
    }

    /// The counterpart of `person` in this match, if they are part of it.
    pub fn other_person(&self, person: PersonId) -> Option<PersonId> {
        if self.person_1 == person {
            Some(self.person_2)
        } else if self.person_2 == person {
            Some(self.person_1)
        } else {
            None
        }
    }
}
