//! Conversation flows: what the bot does with a classified event or button
//! answer. Everything here talks to the repositories and the deliverer; the
//! routing crates stay free of persistence.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use matchbot_core::text::{self, Intent};
use matchbot_core::{LastQuery, MatchId, Person, Pool, PoolId};
use matchbot_db::repositories::RepositoryError;
use matchbot_slack::actions::{ActionError, ActionPayload, AvailabilityService, MetService};
use matchbot_slack::blocks;
use matchbot_slack::client::MessageContent;
use matchbot_slack::delivery::{Deliverer, DeliveryError};
use matchbot_slack::events::{
    BroadcastService, EventContext, MessageEvent, RouterError, UserMessageService,
};
use matchbot_slack::messages;

use crate::state::Repositories;

#[derive(Clone)]
pub struct ConversationFlows {
    repos: Arc<Repositories>,
    deliverer: Deliverer,
    admin_user_id: Option<String>,
}

fn repo_router_err(error: RepositoryError) -> RouterError {
    RouterError::Service(error.to_string())
}

fn delivery_router_err(error: DeliveryError) -> RouterError {
    RouterError::Service(error.to_string())
}

fn repo_action_err(error: RepositoryError) -> ActionError {
    ActionError::Service(error.to_string())
}

fn delivery_action_err(error: DeliveryError) -> ActionError {
    ActionError::Service(error.to_string())
}

impl ConversationFlows {
    pub fn new(
        repos: Arc<Repositories>,
        deliverer: Deliverer,
        admin_user_id: Option<String>,
    ) -> Self {
        Self { repos, deliverer, admin_user_id }
    }

    async fn send_text(
        &self,
        channel: &str,
        message: impl Into<String>,
    ) -> Result<String, DeliveryError> {
        self.deliverer.send_msg(channel, None, &MessageContent::text(message.into())).await
    }

    /// First reply after onboarding: the message text becomes the intro, and
    /// the person is marked available everywhere for their first round.
    async fn add_intro(&self, text_body: &str, mut person: Person) -> Result<(), RouterError> {
        person.intro = text_body.to_owned();
        person.last_query = None;
        self.repos.persons.update(&person).await.map_err(repo_router_err)?;
        self.repos
            .memberships
            .set_available_everywhere(person.id, true)
            .await
            .map_err(repo_router_err)?;
        info!(event_name = "flows.intro_added", person = %person, "onboarded with intro");

        let mut message = messages::intro_received(&person);
        if self.admin_user_id.is_some() {
            message.push(' ');
            message.push_str(messages::INTRO_RECEIVED_QUESTIONS);
        }
        self.send_text(&person.user_id, message).await.map_err(delivery_router_err)?;
        Ok(())
    }

    async fn update_intro(&self, text_body: &str, mut person: Person) -> Result<(), RouterError> {
        person.intro = text_body.to_owned();
        person.last_query = None;
        self.repos.persons.update(&person).await.map_err(repo_router_err)?;
        info!(event_name = "flows.intro_updated", person = %person, "updated intro");

        self.send_text(&person.user_id, messages::intro_updated(&person))
            .await
            .map_err(delivery_router_err)?;
        Ok(())
    }

    async fn prompt_intro_update(&self, mut person: Person) -> Result<(), RouterError> {
        let instructions = messages::update_intro_instructions(&person);
        person.last_query = Some(LastQuery::UpdateIntro);
        self.repos.persons.update(&person).await.map_err(repo_router_err)?;

        self.send_text(&person.user_id, instructions).await.map_err(delivery_router_err)?;
        Ok(())
    }

    /// A message the bot cannot interpret: relay it to the admin when one is
    /// configured, otherwise apologize to the sender.
    async fn unknown_message(&self, user_id: &str, text_body: &str) -> Result<(), RouterError> {
        info!(
            event_name = "flows.unknown_message",
            user_id,
            text = text_body,
            "received message the bot cannot interpret"
        );
        match &self.admin_user_id {
            Some(admin_user_id) => {
                self.send_text(admin_user_id, messages::unknown_message_admin(user_id, text_body))
                    .await
                    .map_err(delivery_router_err)?;
            }
            None => {
                self.send_text(user_id, messages::UNKNOWN_MESSAGE_NO_ADMIN)
                    .await
                    .map_err(delivery_router_err)?;
            }
        }
        Ok(())
    }

    /// Follow up an availability answer by asking about the person's latest
    /// match in the pool, if its outcome is still unknown.
    pub(crate) async fn ask_if_met(
        &self,
        person: &Person,
        pool: &Pool,
    ) -> Result<(), ActionError> {
        let Some(latest) = self
            .repos
            .matches
            .latest_for_person_in_pool(person.id, pool.id)
            .await
            .map_err(repo_action_err)?
        else {
            return Ok(());
        };
        if latest.met.is_some() {
            return Ok(());
        }
        let Some(other_id) = latest.other_person(person.id) else {
            return Ok(());
        };
        let other = self
            .repos
            .persons
            .find_by_id(other_id)
            .await
            .map_err(repo_action_err)?
            .ok_or_else(|| {
                ActionError::Service(format!("match {} references a missing person", latest.id.0))
            })?;

        let template = blocks::ask_if_met(pool, &other, &latest);
        self.deliverer
            .send_msg(&person.user_id, None, &MessageContent::Blocks(template))
            .await
            .map_err(delivery_action_err)?;

        // Block answers carry their correlation in the block id, so any
        // pending text question is no longer expected.
        let mut person = person.clone();
        person.last_query = None;
        self.repos.persons.update(&person).await.map_err(repo_action_err)?;
        Ok(())
    }
}

#[async_trait]
impl UserMessageService for ConversationFlows {
    async fn respond(
        &self,
        event: &MessageEvent,
        _ctx: &EventContext,
    ) -> Result<(), RouterError> {
        // Some message variants arrive without a user id; there is nothing to
        // correlate them with, so they are dropped rather than rejected.
        let Some(user_id) = event.user.as_deref() else {
            debug!("message event without a user id; ignoring");
            return Ok(());
        };
        let text_body = event.text.clone().unwrap_or_default();

        let person = self
            .repos
            .persons
            .find_by_user_id(user_id)
            .await
            .map_err(repo_router_err)?
            .ok_or_else(|| RouterError::PersonNotFound { user_id: user_id.to_owned() })?;

        // A pending question always wins; otherwise intent is inferred from
        // the message text.
        match person.last_query {
            Some(LastQuery::AddIntro) => self.add_intro(&text_body, person).await,
            Some(LastQuery::UpdateIntro) => self.update_intro(&text_body, person).await,
            None => match text::infer_intent(&text_body) {
                Some(Intent::PromptIntroUpdate) => self.prompt_intro_update(person).await,
                None => self.unknown_message(user_id, &text_body).await,
            },
        }
    }
}

#[async_trait]
impl BroadcastService for ConversationFlows {
    async fn send_as_bot(&self, raw_text: &str, _ctx: &EventContext) -> Result<(), RouterError> {
        let Some(target) = text::first_mention(raw_text) else {
            return Ok(());
        };
        let message = text::strip_first_mention(raw_text);
        if message.is_empty() {
            return Ok(());
        }

        let target = target.to_owned();
        self.send_text(&target, message.clone()).await.map_err(delivery_router_err)?;
        info!(
            event_name = "flows.sent_as_bot",
            target = %target,
            message = %message,
            "sent admin message as bot"
        );
        Ok(())
    }
}

#[async_trait]
impl AvailabilityService for ConversationFlows {
    async fn update_availability(
        &self,
        payload: &ActionPayload,
        user_id: &str,
        pool_id: PoolId,
        available: bool,
        _ctx: &EventContext,
    ) -> Result<(), ActionError> {
        let pool = self
            .repos
            .pools
            .find_by_id(pool_id)
            .await
            .map_err(repo_action_err)?
            .ok_or(ActionError::PoolNotFound(pool_id.0))?;
        let person = self
            .repos
            .persons
            .find_by_user_id(user_id)
            .await
            .map_err(repo_action_err)?
            .ok_or_else(|| ActionError::PersonNotFound { user_id: user_id.to_owned() })?;
        self.repos
            .memberships
            .find(person.id, pool.id)
            .await
            .map_err(repo_action_err)?
            .ok_or_else(|| {
                ActionError::Malformed(format!("no membership for {person} in pool {pool}"))
            })?;

        self.repos
            .memberships
            .set_available(person.id, pool.id, Some(available))
            .await
            .map_err(repo_action_err)?;
        info!(
            event_name = "flows.availability_updated",
            person = %person,
            pool = %pool,
            available,
            "availability recorded"
        );

        let confirmation = if available {
            messages::UPDATED_AVAILABLE
        } else {
            messages::UPDATED_UNAVAILABLE
        };
        // The confirmation answers the pressed button (freezing it); the
        // met question must land after it, so the follow-up chain starts
        // only once the confirmation has been sent.
        self.deliverer
            .send_msg(user_id, Some(payload), &MessageContent::text(confirmation))
            .await
            .map_err(delivery_action_err)?;

        let flows = self.clone();
        tokio::spawn(async move {
            if let Err(error) = flows.ask_if_met(&person, &pool).await {
                warn!(person = %person, error = %error, "met follow-up failed");
            }
        });

        Ok(())
    }
}

#[async_trait]
impl MetService for ConversationFlows {
    async fn update_met(
        &self,
        payload: &ActionPayload,
        user_id: &str,
        match_id: MatchId,
        met: bool,
        _ctx: &EventContext,
    ) -> Result<(), ActionError> {
        let matchup = self
            .repos
            .matches
            .find_by_id(match_id)
            .await
            .map_err(repo_action_err)?
            .ok_or_else(|| ActionError::MatchNotFound {
                match_id: match_id.0,
                user_id: user_id.to_owned(),
            })?;
        let person = self
            .repos
            .persons
            .find_by_user_id(user_id)
            .await
            .map_err(repo_action_err)?
            .ok_or_else(|| ActionError::PersonNotFound { user_id: user_id.to_owned() })?;
        // A person may only answer for their own matches.
        let Some(other_id) = matchup.other_person(person.id) else {
            return Err(ActionError::MatchNotFound {
                match_id: match_id.0,
                user_id: user_id.to_owned(),
            });
        };

        if let Some(existing) = matchup.met {
            if existing != met {
                warn!(
                    match_id = matchup.id.0,
                    existing,
                    new = met,
                    person = %person,
                    "conflicting met feedback; keeping the newer answer"
                );
            }
        }

        let mut matchup = matchup;
        matchup.met = Some(met);
        self.repos.matches.update(&matchup).await.map_err(repo_action_err)?;
        info!(
            event_name = "flows.met_updated",
            match_id = matchup.id.0,
            met,
            "recorded met feedback"
        );

        let message = if met {
            let other = self
                .repos
                .persons
                .find_by_id(other_id)
                .await
                .map_err(repo_action_err)?
                .ok_or_else(|| {
                    ActionError::Service(format!(
                        "match {} references a missing person",
                        matchup.id.0
                    ))
                })?;
            messages::met(&other)
        } else {
            messages::DID_NOT_MEET.to_owned()
        };
        self.deliverer
            .send_msg(user_id, Some(payload), &MessageContent::text(message))
            .await
            .map_err(delivery_action_err)?;
        Ok(())
    }
}
