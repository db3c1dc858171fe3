use async_trait::async_trait;
use tokio::sync::RwLock;

use matchbot_core::{
    pair_key, Match, MatchId, PairHistory, Person, PersonId, Pool, PoolId, PoolMembership, Round,
    RoundId, RoundStatus,
};

use super::{
    MatchRepository, MembershipRepository, PersonRepository, PoolRepository, RepositoryError,
    RoundRepository,
};

/// In-memory implementation of every repository trait, for flow tests and
/// scaffolding. Insertion order stands in for the SQL membership join order.
#[derive(Default)]
pub struct InMemoryStore {
    persons: RwLock<Vec<Person>>,
    pools: RwLock<Vec<Pool>>,
    memberships: RwLock<Vec<PoolMembership>>,
    rounds: RwLock<Vec<Round>>,
    matches: RwLock<Vec<Match>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PersonRepository for InMemoryStore {
    async fn find_by_id(&self, id: PersonId) -> Result<Option<Person>, RepositoryError> {
        let persons = self.persons.read().await;
        Ok(persons.iter().find(|person| person.id == id).cloned())
    }

    async fn find_by_user_id(&self, user_id: &str) -> Result<Option<Person>, RepositoryError> {
        let persons = self.persons.read().await;
        Ok(persons.iter().find(|person| person.user_id == user_id).cloned())
    }

    async fn find_by_ids(&self, ids: &[PersonId]) -> Result<Vec<Person>, RepositoryError> {
        let persons = self.persons.read().await;
        let mut found: Vec<Person> =
            persons.iter().filter(|person| ids.contains(&person.id)).cloned().collect();
        found.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        Ok(found)
    }

    async fn create(&self, person: Person) -> Result<Person, RepositoryError> {
        let mut persons = self.persons.write().await;
        let person = Person { id: PersonId(persons.len() as i64 + 1), ..person };
        persons.push(person.clone());
        Ok(person)
    }

    async fn update(&self, person: &Person) -> Result<(), RepositoryError> {
        let mut persons = self.persons.write().await;
        if let Some(stored) = persons.iter_mut().find(|stored| stored.id == person.id) {
            *stored = person.clone();
        }
        Ok(())
    }

    async fn list_with_intro_for_pool(
        &self,
        pool_id: PoolId,
    ) -> Result<Vec<Person>, RepositoryError> {
        self.members_matching(pool_id, |person, _| person.has_intro()).await
    }

    async fn list_available_for_pool(
        &self,
        pool_id: PoolId,
    ) -> Result<Vec<Person>, RepositoryError> {
        self.members_matching(pool_id, |_, membership| membership.available == Some(true)).await
    }
}

impl InMemoryStore {
    async fn members_matching(
        &self,
        pool_id: PoolId,
        keep: impl Fn(&Person, &PoolMembership) -> bool,
    ) -> Result<Vec<Person>, RepositoryError> {
        let memberships = self.memberships.read().await;
        let persons = self.persons.read().await;
        Ok(memberships
            .iter()
            .filter(|membership| membership.pool_id == pool_id)
            .filter_map(|membership| {
                persons
                    .iter()
                    .find(|person| person.id == membership.person_id)
                    .filter(|person| keep(person, membership))
                    .cloned()
            })
            .collect())
    }
}

#[async_trait]
impl PoolRepository for InMemoryStore {
    async fn find_by_id(&self, id: PoolId) -> Result<Option<Pool>, RepositoryError> {
        let pools = self.pools.read().await;
        Ok(pools.iter().find(|pool| pool.id == id).cloned())
    }

    async fn find_by_channel_id(&self, channel_id: &str) -> Result<Option<Pool>, RepositoryError> {
        let pools = self.pools.read().await;
        Ok(pools.iter().find(|pool| pool.channel_id == channel_id).cloned())
    }

    async fn find_by_channel_name(
        &self,
        channel_name: &str,
    ) -> Result<Option<Pool>, RepositoryError> {
        let pools = self.pools.read().await;
        Ok(pools.iter().find(|pool| pool.channel_name == channel_name).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Pool>, RepositoryError> {
        let pools = self.pools.read().await;
        Ok(pools.iter().find(|pool| pool.name == name).cloned())
    }

    async fn create(&self, pool: Pool) -> Result<Pool, RepositoryError> {
        let mut pools = self.pools.write().await;
        let pool = Pool { id: PoolId(pools.len() as i64 + 1), ..pool };
        pools.push(pool.clone());
        Ok(pool)
    }

    async fn list_all(&self) -> Result<Vec<Pool>, RepositoryError> {
        let pools = self.pools.read().await;
        let mut listed: Vec<Pool> = pools.clone();
        listed.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(listed)
    }
}

#[async_trait]
impl MembershipRepository for InMemoryStore {
    async fn find(
        &self,
        person_id: PersonId,
        pool_id: PoolId,
    ) -> Result<Option<PoolMembership>, RepositoryError> {
        let memberships = self.memberships.read().await;
        Ok(memberships
            .iter()
            .find(|membership| {
                membership.person_id == person_id && membership.pool_id == pool_id
            })
            .cloned())
    }

    async fn add(&self, person_id: PersonId, pool_id: PoolId) -> Result<(), RepositoryError> {
        let mut memberships = self.memberships.write().await;
        let exists = memberships
            .iter()
            .any(|membership| membership.person_id == person_id && membership.pool_id == pool_id);
        if !exists {
            memberships.push(PoolMembership { person_id, pool_id, available: None });
        }
        Ok(())
    }

    async fn remove(&self, person_id: PersonId, pool_id: PoolId) -> Result<(), RepositoryError> {
        let mut memberships = self.memberships.write().await;
        memberships.retain(|membership| {
            !(membership.person_id == person_id && membership.pool_id == pool_id)
        });
        Ok(())
    }

    async fn set_available(
        &self,
        person_id: PersonId,
        pool_id: PoolId,
        available: Option<bool>,
    ) -> Result<(), RepositoryError> {
        let mut memberships = self.memberships.write().await;
        for membership in memberships.iter_mut() {
            if membership.person_id == person_id && membership.pool_id == pool_id {
                membership.available = available;
            }
        }
        Ok(())
    }

    async fn set_available_everywhere(
        &self,
        person_id: PersonId,
        available: bool,
    ) -> Result<(), RepositoryError> {
        let mut memberships = self.memberships.write().await;
        for membership in memberships.iter_mut() {
            if membership.person_id == person_id {
                membership.available = Some(available);
            }
        }
        Ok(())
    }

    async fn reset_availability_for_pool(&self, pool_id: PoolId) -> Result<(), RepositoryError> {
        let mut memberships = self.memberships.write().await;
        for membership in memberships.iter_mut() {
            if membership.pool_id == pool_id {
                membership.available = None;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl RoundRepository for InMemoryStore {
    async fn find_by_id(&self, id: RoundId) -> Result<Option<Round>, RepositoryError> {
        let rounds = self.rounds.read().await;
        Ok(rounds.iter().find(|round| round.id == id).cloned())
    }

    async fn create(&self, round: Round) -> Result<Round, RepositoryError> {
        let mut rounds = self.rounds.write().await;
        let round = Round { id: RoundId(rounds.len() as i64 + 1), ..round };
        rounds.push(round.clone());
        Ok(round)
    }

    async fn update_status(
        &self,
        id: RoundId,
        status: RoundStatus,
    ) -> Result<(), RepositoryError> {
        let mut rounds = self.rounds.write().await;
        if let Some(round) = rounds.iter_mut().find(|round| round.id == id) {
            round.status = status;
        }
        Ok(())
    }

    async fn latest_for_pool(&self, pool_id: PoolId) -> Result<Option<Round>, RepositoryError> {
        let rounds = self.rounds.read().await;
        Ok(rounds
            .iter()
            .filter(|round| round.pool_id == pool_id)
            .max_by_key(|round| (round.end_date, round.id.0))
            .cloned())
    }

    async fn count_for_pool(&self, pool_id: PoolId) -> Result<i64, RepositoryError> {
        let rounds = self.rounds.read().await;
        Ok(rounds.iter().filter(|round| round.pool_id == pool_id).count() as i64)
    }
}

#[async_trait]
impl MatchRepository for InMemoryStore {
    async fn find_by_id(&self, id: MatchId) -> Result<Option<Match>, RepositoryError> {
        let matches = self.matches.read().await;
        Ok(matches.iter().find(|matchup| matchup.id == id).cloned())
    }

    async fn create(&self, matchup: Match) -> Result<Match, RepositoryError> {
        let mut matches = self.matches.write().await;
        let matchup = Match { id: MatchId(matches.len() as i64 + 1), ..matchup };
        matches.push(matchup.clone());
        Ok(matchup)
    }

    async fn update(&self, matchup: &Match) -> Result<(), RepositoryError> {
        let mut matches = self.matches.write().await;
        if let Some(stored) = matches.iter_mut().find(|stored| stored.id == matchup.id) {
            *stored = matchup.clone();
        }
        Ok(())
    }

    async fn count_between_persons(
        &self,
        a: PersonId,
        b: PersonId,
    ) -> Result<u32, RepositoryError> {
        let matches = self.matches.read().await;
        Ok(matches
            .iter()
            .filter(|matchup| pair_key(matchup.person_1, matchup.person_2) == pair_key(a, b))
            .count() as u32)
    }

    async fn pair_history_for_pool(
        &self,
        pool_id: PoolId,
    ) -> Result<PairHistory, RepositoryError> {
        let matches = self.matches.read().await;
        let rounds = self.rounds.read().await;
        let mut history = PairHistory::new();
        for matchup in matches.iter() {
            let in_pool = rounds
                .iter()
                .any(|round| round.id == matchup.round_id && round.pool_id == pool_id);
            if in_pool {
                *history.entry(pair_key(matchup.person_1, matchup.person_2)).or_insert(0) += 1;
            }
        }
        Ok(history)
    }

    async fn latest_for_person_in_pool(
        &self,
        person_id: PersonId,
        pool_id: PoolId,
    ) -> Result<Option<Match>, RepositoryError> {
        let matches = self.matches.read().await;
        let rounds = self.rounds.read().await;
        Ok(matches
            .iter()
            .filter(|matchup| matchup.involves(person_id))
            .filter_map(|matchup| {
                rounds
                    .iter()
                    .find(|round| round.id == matchup.round_id && round.pool_id == pool_id)
                    .map(|round| (round.end_date, matchup))
            })
            .max_by_key(|(end_date, matchup)| (*end_date, matchup.id.0))
            .map(|(_, matchup)| matchup.clone()))
    }

    async fn list_for_pool_excluding_round(
        &self,
        pool_id: PoolId,
        round_id: RoundId,
    ) -> Result<Vec<Match>, RepositoryError> {
        let matches = self.matches.read().await;
        let rounds = self.rounds.read().await;
        Ok(matches
            .iter()
            .filter(|matchup| matchup.round_id != round_id)
            .filter(|matchup| {
                rounds
                    .iter()
                    .any(|round| round.id == matchup.round_id && round.pool_id == pool_id)
            })
            .cloned()
            .collect())
    }
}
