use thiserror::Error;

use crate::domain::round::RoundStatus;
use crate::matching::SelectionError;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid round transition from {from:?} to {to:?}")]
    InvalidRoundTransition { from: RoundStatus, to: RoundStatus },
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("integration failure: {0}")]
    Integration(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

#[cfg(test)]
mod tests {
    use crate::errors::{ApplicationError, DomainError};
    use crate::matching::SelectionError;

    #[test]
    fn selection_errors_lift_into_application_errors() {
        let error = ApplicationError::from(DomainError::from(
            SelectionError::NoExcludableParticipant { pool: "2026 interns".to_owned() },
        ));

        assert!(error.to_string().contains("2026 interns"));
    }

    #[test]
    fn invariant_violations_carry_their_message() {
        let error = DomainError::InvariantViolation("participant set must be even".to_owned());
        assert!(error.to_string().contains("participant set must be even"));
    }
}
