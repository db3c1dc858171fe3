use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::pool::PoolId;
use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoundId(pub i64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundStatus {
    Created,
    AvailabilityRequested,
    ParticipantsSelected,
    PairsFormed,
    Closed,
}

impl RoundStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::AvailabilityRequested => "availability_requested",
            Self::ParticipantsSelected => "participants_selected",
            Self::PairsFormed => "pairs_formed",
            Self::Closed => "closed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "created" => Some(Self::Created),
            "availability_requested" => Some(Self::AvailabilityRequested),
            "participants_selected" => Some(Self::ParticipantsSelected),
            "pairs_formed" => Some(Self::PairsFormed),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }
}

/// One pairing cycle for a pool.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    pub id: RoundId,
    pub pool_id: PoolId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: RoundStatus,
    pub created_at: DateTime<Utc>,
}

/// Rounds typically start on a Monday and end on the Friday four days later.
pub fn default_end_date(start_date: NaiveDate) -> NaiveDate {
    start_date.checked_add_days(Days::new(4)).unwrap_or(start_date)
}

impl Round {
    pub fn can_transition_to(&self, next: RoundStatus) -> bool {
        matches!(
            (self.status, next),
            (RoundStatus::Created, RoundStatus::AvailabilityRequested)
                | (RoundStatus::AvailabilityRequested, RoundStatus::ParticipantsSelected)
                | (RoundStatus::ParticipantsSelected, RoundStatus::PairsFormed)
                | (RoundStatus::Created, RoundStatus::Closed)
                | (RoundStatus::AvailabilityRequested, RoundStatus::Closed)
                | (RoundStatus::ParticipantsSelected, RoundStatus::Closed)
                | (RoundStatus::PairsFormed, RoundStatus::Closed)
        )
    }

    pub fn transition_to(&mut self, next: RoundStatus) -> Result<(), DomainError> {
        if self.can_transition_to(next) {
            self.status = next;
            return Ok(());
        }

        Err(DomainError::InvalidRoundTransition { from: self.status, to: next })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};

    use crate::domain::pool::PoolId;
    use crate::errors::DomainError;

    use super::{default_end_date, Round, RoundId, RoundStatus};

    fn round(status: RoundStatus) -> Round {
        let start_date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        Round {
            id: RoundId(1),
            pool_id: PoolId(1),
            start_date,
            end_date: default_end_date(start_date),
            status,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn default_round_spans_monday_to_friday() {
        let start = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        assert_eq!(default_end_date(start), NaiveDate::from_ymd_opt(2026, 3, 6).unwrap());
    }

    #[test]
    fn allows_full_lifecycle_in_order() {
        let mut round = round(RoundStatus::Created);
        round.transition_to(RoundStatus::AvailabilityRequested).expect("created -> availability");
        round.transition_to(RoundStatus::ParticipantsSelected).expect("availability -> selected");
        round.transition_to(RoundStatus::PairsFormed).expect("selected -> paired");
        round.transition_to(RoundStatus::Closed).expect("paired -> closed");
        assert_eq!(round.status, RoundStatus::Closed);
    }

    #[test]
    fn blocks_skipping_lifecycle_steps() {
        let mut round = round(RoundStatus::Created);
        let error = round
            .transition_to(RoundStatus::PairsFormed)
            .expect_err("created -> paired should fail");
        assert!(matches!(error, DomainError::InvalidRoundTransition { .. }));
        assert_eq!(round.status, RoundStatus::Created);
    }

    #[test]
    fn any_open_round_can_be_closed() {
        for status in [
            RoundStatus::Created,
            RoundStatus::AvailabilityRequested,
            RoundStatus::ParticipantsSelected,
            RoundStatus::PairsFormed,
        ] {
            let mut round = round(status);
            round.transition_to(RoundStatus::Closed).expect("close should succeed");
        }
    }

    #[test]
    fn status_round_trips_through_storage_form() {
        for status in [
            RoundStatus::Created,
            RoundStatus::AvailabilityRequested,
            RoundStatus::ParticipantsSelected,
            RoundStatus::PairsFormed,
            RoundStatus::Closed,
        ] {
            assert_eq!(RoundStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(RoundStatus::parse("paired"), None);
    }
}
