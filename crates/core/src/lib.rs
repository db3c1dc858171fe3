pub mod config;
pub mod domain;
pub mod errors;
pub mod matching;
pub mod text;

pub use domain::matchup::{Match, MatchId};
pub use domain::person::{LastQuery, Person, PersonId};
pub use domain::pool::{Pool, PoolId, PoolMembership};
pub use domain::round::{default_end_date, Round, RoundId, RoundStatus};
pub use errors::{ApplicationError, DomainError};
pub use matching::{
    pair_key, pair_participants, select_participants, PairHistory, SelectionError,
};
