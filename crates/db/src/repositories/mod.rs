use async_trait::async_trait;
use thiserror::Error;

use matchbot_core::{
    Match, MatchId, PairHistory, Person, PersonId, Pool, PoolId, PoolMembership, Round, RoundId,
    RoundStatus,
};

pub mod matchup;
pub mod membership;
pub mod memory;
pub mod person;
pub mod pool;
pub mod round;

pub use matchup::SqlMatchRepository;
pub use membership::SqlMembershipRepository;
pub use memory::InMemoryStore;
pub use person::SqlPersonRepository;
pub use pool::SqlPoolRepository;
pub use round::SqlRoundRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

#[async_trait]
pub trait PersonRepository: Send + Sync {
    async fn find_by_id(&self, id: PersonId) -> Result<Option<Person>, RepositoryError>;
    async fn find_by_user_id(&self, user_id: &str) -> Result<Option<Person>, RepositoryError>;
    async fn find_by_ids(&self, ids: &[PersonId]) -> Result<Vec<Person>, RepositoryError>;
    /// Insert a new person; the returned value carries the assigned id.
    async fn create(&self, person: Person) -> Result<Person, RepositoryError>;
    async fn update(&self, person: &Person) -> Result<(), RepositoryError>;
    /// Pool members who have written an intro, in membership (join) order.
    async fn list_with_intro_for_pool(&self, pool_id: PoolId)
        -> Result<Vec<Person>, RepositoryError>;
    /// Pool members marked available for the active round, in membership
    /// (join) order so exclusion draws are reproducible.
    async fn list_available_for_pool(&self, pool_id: PoolId)
        -> Result<Vec<Person>, RepositoryError>;
}

#[async_trait]
pub trait PoolRepository: Send + Sync {
    async fn find_by_id(&self, id: PoolId) -> Result<Option<Pool>, RepositoryError>;
    async fn find_by_channel_id(&self, channel_id: &str) -> Result<Option<Pool>, RepositoryError>;
    async fn find_by_channel_name(&self, channel_name: &str)
        -> Result<Option<Pool>, RepositoryError>;
    async fn find_by_name(&self, name: &str) -> Result<Option<Pool>, RepositoryError>;
    async fn create(&self, pool: Pool) -> Result<Pool, RepositoryError>;
    async fn list_all(&self) -> Result<Vec<Pool>, RepositoryError>;
}

#[async_trait]
pub trait MembershipRepository: Send + Sync {
    async fn find(
        &self,
        person_id: PersonId,
        pool_id: PoolId,
    ) -> Result<Option<PoolMembership>, RepositoryError>;
    /// Create the membership if it does not exist yet; availability starts
    /// unknown.
    async fn add(&self, person_id: PersonId, pool_id: PoolId) -> Result<(), RepositoryError>;
    async fn remove(&self, person_id: PersonId, pool_id: PoolId) -> Result<(), RepositoryError>;
    async fn set_available(
        &self,
        person_id: PersonId,
        pool_id: PoolId,
        available: Option<bool>,
    ) -> Result<(), RepositoryError>;
    /// Mark every membership of a person available. Used when a person
    /// finishes onboarding.
    async fn set_available_everywhere(
        &self,
        person_id: PersonId,
        available: bool,
    ) -> Result<(), RepositoryError>;
    /// Reset every membership of a pool to unknown availability at the start
    /// of a round.
    async fn reset_availability_for_pool(&self, pool_id: PoolId) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait RoundRepository: Send + Sync {
    async fn find_by_id(&self, id: RoundId) -> Result<Option<Round>, RepositoryError>;
    /// Insert a new round; the returned value carries the assigned id.
    async fn create(&self, round: Round) -> Result<Round, RepositoryError>;
    async fn update_status(&self, id: RoundId, status: RoundStatus)
        -> Result<(), RepositoryError>;
    async fn latest_for_pool(&self, pool_id: PoolId) -> Result<Option<Round>, RepositoryError>;
    async fn count_for_pool(&self, pool_id: PoolId) -> Result<i64, RepositoryError>;
}

#[async_trait]
pub trait MatchRepository: Send + Sync {
    async fn find_by_id(&self, id: MatchId) -> Result<Option<Match>, RepositoryError>;
    /// Insert a new match; the returned value carries the assigned id.
    async fn create(&self, matchup: Match) -> Result<Match, RepositoryError>;
    async fn update(&self, matchup: &Match) -> Result<(), RepositoryError>;
    /// How many times two people have been paired, in any pool.
    async fn count_between_persons(
        &self,
        a: PersonId,
        b: PersonId,
    ) -> Result<u32, RepositoryError>;
    /// All historical pairing counts within a pool, for repeat avoidance.
    async fn pair_history_for_pool(&self, pool_id: PoolId)
        -> Result<PairHistory, RepositoryError>;
    /// The person's most recent match in a pool, by round end date.
    async fn latest_for_person_in_pool(
        &self,
        person_id: PersonId,
        pool_id: PoolId,
    ) -> Result<Option<Match>, RepositoryError>;
    async fn list_for_pool_excluding_round(
        &self,
        pool_id: PoolId,
        round_id: RoundId,
    ) -> Result<Vec<Match>, RepositoryError>;
}
