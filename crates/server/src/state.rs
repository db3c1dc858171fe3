use std::sync::Arc;

use matchbot_core::config::AppConfig;
use matchbot_db::repositories::{
    MatchRepository, MembershipRepository, PersonRepository, PoolRepository, RoundRepository,
    SqlMatchRepository, SqlMembershipRepository, SqlPersonRepository, SqlPoolRepository,
    SqlRoundRepository,
};
use matchbot_db::DbPool;
use matchbot_slack::delivery::Deliverer;

use crate::flows::ConversationFlows;
use crate::rounds::RoundService;
use crate::webhook::RequestVerifier;

/// One handle per aggregate so flows can be exercised against either the SQL
/// repositories or the in-memory store.
pub struct Repositories {
    pub persons: Arc<dyn PersonRepository>,
    pub pools: Arc<dyn PoolRepository>,
    pub memberships: Arc<dyn MembershipRepository>,
    pub rounds: Arc<dyn RoundRepository>,
    pub matches: Arc<dyn MatchRepository>,
}

impl Repositories {
    pub fn sql(pool: &DbPool) -> Self {
        Self {
            persons: Arc::new(SqlPersonRepository::new(pool.clone())),
            pools: Arc::new(SqlPoolRepository::new(pool.clone())),
            memberships: Arc::new(SqlMembershipRepository::new(pool.clone())),
            rounds: Arc::new(SqlRoundRepository::new(pool.clone())),
            matches: Arc::new(SqlMatchRepository::new(pool.clone())),
        }
    }

    pub fn in_memory() -> Self {
        let store = Arc::new(matchbot_db::repositories::InMemoryStore::new());
        Self {
            persons: store.clone(),
            pools: store.clone(),
            memberships: store.clone(),
            rounds: store.clone(),
            matches: store,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db_pool: DbPool,
    pub repos: Arc<Repositories>,
    pub deliverer: Deliverer,
    pub flows: Arc<ConversationFlows>,
    pub rounds: Arc<RoundService>,
    pub verifier: Arc<dyn RequestVerifier>,
}
