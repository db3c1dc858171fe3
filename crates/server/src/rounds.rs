//! Round orchestration: starting a round, broadcasting the availability
//! question (with a membership sync against the live channel), forming
//! matches, and opening the pair group DMs.
//!
//! The ordering contract: a round row is durably created before any
//! availability message refers to it, and a match row is durably created
//! before its group DM opens. Broadcast work runs fire-and-forget so the
//! admin request returns promptly.

use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use thiserror::Error;
use tracing::{error, info, warn};

use matchbot_core::{
    default_end_date, pair_participants, select_participants, DomainError, Match, MatchId, Person,
    Pool, Round, RoundId, RoundStatus, SelectionError,
};
use matchbot_db::repositories::RepositoryError;
use matchbot_slack::blocks;
use matchbot_slack::client::{ChatApiError, MessageContent};
use matchbot_slack::delivery::{Deliverer, DeliveryError};
use matchbot_slack::messages;

use crate::state::Repositories;

#[derive(Debug, Error)]
pub enum RoundError {
    #[error("no pool found: {0}")]
    PoolNotFound(String),
    #[error("no round with id {0}")]
    RoundNotFound(i64),
    #[error(transparent)]
    InvalidTransition(DomainError),
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error("persistence failure: {0}")]
    Repository(String),
    #[error("slack integration failure: {0}")]
    Integration(String),
}

impl From<RepositoryError> for RoundError {
    fn from(error: RepositoryError) -> Self {
        Self::Repository(error.to_string())
    }
}

impl From<ChatApiError> for RoundError {
    fn from(error: ChatApiError) -> Self {
        Self::Integration(error.to_string())
    }
}

impl From<DeliveryError> for RoundError {
    fn from(error: DeliveryError) -> Self {
        Self::Integration(error.to_string())
    }
}

#[derive(Clone)]
pub struct RoundService {
    repos: Arc<Repositories>,
    deliverer: Deliverer,
}

impl RoundService {
    pub fn new(repos: Arc<Repositories>, deliverer: Deliverer) -> Self {
        Self { repos, deliverer }
    }

    /// Create a round for the named pool and kick off the availability
    /// broadcast. The broadcast runs in the background; the returned round is
    /// already in `availability_requested`.
    pub async fn start_round(&self, pool_name: &str) -> Result<Round, RoundError> {
        let pool = self
            .repos
            .pools
            .find_by_name(pool_name)
            .await?
            .ok_or_else(|| RoundError::PoolNotFound(pool_name.to_owned()))?;

        let start_date = Utc::now().date_naive();
        let mut round = self
            .repos
            .rounds
            .create(Round {
                id: RoundId(0),
                pool_id: pool.id,
                start_date,
                end_date: default_end_date(start_date),
                status: RoundStatus::Created,
                created_at: Utc::now(),
            })
            .await?;

        round
            .transition_to(RoundStatus::AvailabilityRequested)
            .map_err(RoundError::InvalidTransition)?;
        self.repos.rounds.update_status(round.id, round.status).await?;
        info!(
            event_name = "rounds.started",
            round_id = round.id.0,
            pool = %pool,
            "round created; requesting availability"
        );

        // The round row exists; the broadcast may now reference it.
        let service = self.clone();
        let broadcast_round = round.clone();
        tokio::spawn(async move {
            if let Err(broadcast_error) =
                service.ask_availability(&broadcast_round, &pool).await
            {
                error!(
                    round_id = broadcast_round.id.0,
                    error = %broadcast_error,
                    "availability broadcast failed"
                );
            }
        });

        Ok(round)
    }

    /// Message every pool member to ask availability for the round, syncing
    /// the pool membership against the live Slack channel membership first.
    pub async fn ask_availability(&self, round: &Round, pool: &Pool) -> Result<(), RoundError> {
        let channel_members = self.deliverer.chat().channel_members(&pool.channel_id).await?;

        // Everyone starts the round with unknown availability.
        self.repos.memberships.reset_availability_for_pool(pool.id).await?;

        // People who have not written an intro yet are skipped here: their
        // next free-text reply is still expected to be the intro, and someone
        // who never answered the onboarding question is presumed
        // uninterested.
        let people = self.repos.persons.list_with_intro_for_pool(pool.id).await?;
        for person in people {
            if channel_members.iter().any(|member| member == &person.user_id) {
                self.send_availability_question(person, pool).await?;
            } else {
                self.repos.memberships.remove(person.id, pool.id).await?;
                info!(person = %person, pool = %pool, "removed from pool; left the channel");
            }
        }

        for user_id in &channel_members {
            match self.repos.persons.find_by_user_id(user_id).await? {
                Some(person) => {
                    if self.repos.memberships.find(person.id, pool.id).await?.is_some() {
                        continue;
                    }
                    self.repos.memberships.add(person.id, pool.id).await?;
                    info!(person = %person, pool = %pool, "added to pool");
                    if person.has_intro() {
                        self.send_availability_question(person, pool).await?;
                    } else {
                        self.welcome(person, pool).await?;
                    }
                }
                None => {
                    if let Some(person) = self.onboard_channel_member(user_id, pool).await? {
                        self.welcome(person, pool).await?;
                    }
                }
            }
        }

        info!(
            event_name = "rounds.availability_requested",
            round_id = round.id.0,
            pool = %pool,
            "sent availability requests"
        );
        Ok(())
    }

    async fn send_availability_question(
        &self,
        mut person: Person,
        pool: &Pool,
    ) -> Result<(), RoundError> {
        let template = blocks::ask_if_available(&person, pool);
        self.deliverer
            .send_msg(&person.user_id, None, &MessageContent::Blocks(template))
            .await?;
        // The answer arrives as a block action, not free text.
        person.last_query = None;
        self.repos.persons.update(&person).await?;
        Ok(())
    }

    async fn welcome(&self, mut person: Person, pool: &Pool) -> Result<(), RoundError> {
        self.deliverer
            .send_msg(
                &person.user_id,
                None,
                &MessageContent::text(messages::welcome_intro(&person, pool)),
            )
            .await?;
        person.last_query = Some(matchbot_core::LastQuery::AddIntro);
        self.repos.persons.update(&person).await?;
        Ok(())
    }

    /// Create a Person for a channel member the bot has never seen. Bots are
    /// skipped, as are users without a profile name (they get an apology so
    /// they know why).
    async fn onboard_channel_member(
        &self,
        user_id: &str,
        pool: &Pool,
    ) -> Result<Option<Person>, RoundError> {
        let profile = match self.deliverer.chat().user_info(user_id).await {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                warn!(user_id, "channel member not found via users.info; skipping");
                return Ok(None);
            }
            Err(lookup_error) => {
                error!(
                    user_id,
                    error = %lookup_error,
                    "failed to retrieve user info; this member is skipped for the round"
                );
                return Ok(None);
            }
        };
        if profile.is_bot {
            return Ok(None);
        }
        let Some(real_name) = profile.real_name.filter(|name| !name.trim().is_empty()) else {
            self.deliverer
                .send_msg(user_id, None, &MessageContent::text(messages::PERSON_MISSING_NAME))
                .await?;
            warn!(user_id, "profile has no name set; asked the user to add one");
            return Ok(None);
        };

        let person = self
            .repos
            .persons
            .create(Person::new(user_id, profile.user_name, real_name))
            .await?;
        self.repos.memberships.add(person.id, pool.id).await?;
        info!(person = %person, pool = %pool, "added to pool");
        Ok(Some(person))
    }

    /// Select the round's participants, pair them, persist the matches, and
    /// open a group DM per pair. A selection failure leaves the round (and
    /// everything else) untouched so an operator can fix the pool and retry.
    pub async fn form_matches<R: Rng + Send>(
        &self,
        round_id: RoundId,
        rng: &mut R,
    ) -> Result<Vec<Match>, RoundError> {
        let mut round = self
            .repos
            .rounds
            .find_by_id(round_id)
            .await?
            .ok_or(RoundError::RoundNotFound(round_id.0))?;
        let pool = self
            .repos
            .pools
            .find_by_id(round.pool_id)
            .await?
            .ok_or_else(|| RoundError::PoolNotFound(format!("id {}", round.pool_id.0)))?;

        let candidates = self.repos.persons.list_available_for_pool(pool.id).await?;
        let participants = select_participants(&pool.name, &candidates, rng)?;

        round
            .transition_to(RoundStatus::ParticipantsSelected)
            .map_err(RoundError::InvalidTransition)?;
        self.repos.rounds.update_status(round.id, round.status).await?;
        info!(
            event_name = "rounds.participants_selected",
            round_id = round.id.0,
            pool = %pool,
            participant_count = participants.len(),
            "participants selected"
        );

        let history = self.repos.matches.pair_history_for_pool(pool.id).await?;
        let pairs = pair_participants(&participants, &history, rng);

        let mut created = Vec::with_capacity(pairs.len());
        for (person_1, person_2) in pairs {
            let matchup = self
                .repos
                .matches
                .create(Match {
                    id: MatchId(0),
                    round_id: round.id,
                    person_1: person_1.id,
                    person_2: person_2.id,
                    conversation_id: None,
                    met: None,
                })
                .await?;

            // The match row exists; the DM may now reference it.
            let service = self.clone();
            let dm_match = matchup.clone();
            let dm_pool = pool.clone();
            tokio::spawn(async move {
                if let Err(dm_error) =
                    service.open_match_dm(dm_match, person_1, person_2, dm_pool).await
                {
                    error!(error = %dm_error, "failed to open match group DM");
                }
            });

            created.push(matchup);
        }

        round.transition_to(RoundStatus::PairsFormed).map_err(RoundError::InvalidTransition)?;
        self.repos.rounds.update_status(round.id, round.status).await?;
        info!(
            event_name = "rounds.pairs_formed",
            round_id = round.id.0,
            pool = %pool,
            match_count = created.len(),
            "matches created"
        );

        Ok(created)
    }

    /// Open a group DM between a pair and introduce them to each other.
    pub async fn open_match_dm(
        &self,
        mut matchup: Match,
        person_1: Person,
        person_2: Person,
        pool: Pool,
    ) -> Result<(), RoundError> {
        let conversation_id = self
            .deliverer
            .chat()
            .open_conversation(&[person_1.user_id.clone(), person_2.user_id.clone()])
            .await?;
        matchup.conversation_id = Some(conversation_id.clone());
        self.repos.matches.update(&matchup).await?;

        self.deliverer
            .send_msg(
                &conversation_id,
                None,
                &MessageContent::text(messages::match_intro(&person_1, &person_2, &pool)),
            )
            .await?;
        info!(
            event_name = "rounds.match_dm_opened",
            match_id = matchup.id.0,
            conversation_id = %conversation_id,
            "introduced pair"
        );
        Ok(())
    }
}
