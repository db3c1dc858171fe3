//! Interactive-component (button answer) routing.
//!
//! Button blocks carry `block_id`s of the form `<kind>-<id>`, so an answer
//! arrives with everything needed to correlate it: the question kind and the
//! id of the pool or match it applies to, plus the pressed button's value.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use matchbot_core::{MatchId, PoolId};

use crate::events::{EventContext, RouterResponse};

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct ActionPayload {
    #[serde(default)]
    pub actions: Vec<ActionItem>,
    pub user: Option<ActionUser>,
    pub channel: Option<ActionChannel>,
    /// The original message the button lived on, verbatim. Used to rewrite
    /// its blocks once the answer is in.
    pub message: Option<Value>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct ActionItem {
    pub block_id: Option<String>,
    pub value: Option<String>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct ActionUser {
    pub id: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct ActionChannel {
    pub id: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionKind {
    Availability { pool_id: PoolId },
    Met { match_id: MatchId },
}

pub fn parse_block_id(block_id: &str) -> Option<ActionKind> {
    let (kind, id) = block_id.split_once('-')?;
    let id: i64 = id.parse().ok()?;
    match kind {
        "availability" => Some(ActionKind::Availability { pool_id: PoolId(id) }),
        "met" => Some(ActionKind::Met { match_id: MatchId(id) }),
        _ => None,
    }
}

fn parse_answer(value: &str) -> Option<bool> {
    match value {
        "yes" => Some(true),
        "no" => Some(false),
        _ => None,
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ActionError {
    #[error("malformed action payload: {0}")]
    Malformed(String),
    #[error("no person found for user id `{user_id}`")]
    PersonNotFound { user_id: String },
    #[error("no pool found with id {0}")]
    PoolNotFound(i64),
    #[error("no match with id {match_id} for user `{user_id}`")]
    MatchNotFound { match_id: i64, user_id: String },
    #[error("action handling failed: {0}")]
    Service(String),
}

/// Records a person's yes/no availability answer for a pool and follows up.
#[async_trait]
pub trait AvailabilityService: Send + Sync {
    async fn update_availability(
        &self,
        payload: &ActionPayload,
        user_id: &str,
        pool_id: PoolId,
        available: bool,
        ctx: &EventContext,
    ) -> Result<(), ActionError>;
}

#[async_trait]
impl<T: AvailabilityService + ?Sized> AvailabilityService for std::sync::Arc<T> {
    async fn update_availability(
        &self,
        payload: &ActionPayload,
        user_id: &str,
        pool_id: PoolId,
        available: bool,
        ctx: &EventContext,
    ) -> Result<(), ActionError> {
        (**self).update_availability(payload, user_id, pool_id, available, ctx).await
    }
}

/// Records whether a pair actually met.
#[async_trait]
pub trait MetService: Send + Sync {
    async fn update_met(
        &self,
        payload: &ActionPayload,
        user_id: &str,
        match_id: MatchId,
        met: bool,
        ctx: &EventContext,
    ) -> Result<(), ActionError>;
}

#[async_trait]
impl<T: MetService + ?Sized> MetService for std::sync::Arc<T> {
    async fn update_met(
        &self,
        payload: &ActionPayload,
        user_id: &str,
        match_id: MatchId,
        met: bool,
        ctx: &EventContext,
    ) -> Result<(), ActionError> {
        (**self).update_met(payload, user_id, match_id, met, ctx).await
    }
}

pub struct ActionRouter<A, M> {
    availability: A,
    met: M,
}

impl<A, M> ActionRouter<A, M>
where
    A: AvailabilityService,
    M: MetService,
{
    pub fn new(availability: A, met: M) -> Self {
        Self { availability, met }
    }

    pub async fn route(
        &self,
        payload: &ActionPayload,
        ctx: &EventContext,
    ) -> Result<RouterResponse, ActionError> {
        let action = payload
            .actions
            .first()
            .ok_or_else(|| ActionError::Malformed("payload is missing an action".to_owned()))?;
        let block_id = action
            .block_id
            .as_deref()
            .ok_or_else(|| ActionError::Malformed("action is missing a block id".to_owned()))?;
        let kind = parse_block_id(block_id)
            .ok_or_else(|| ActionError::Malformed(format!("unknown action `{block_id}`")))?;
        let value = action.value.as_deref().unwrap_or_default();
        let answer = parse_answer(value)
            .ok_or_else(|| ActionError::Malformed(format!("invalid action value `{value}`")))?;
        let user_id = payload
            .user
            .as_ref()
            .map(|user| user.id.as_str())
            .ok_or_else(|| ActionError::Malformed("payload is missing a user id".to_owned()))?;

        match kind {
            ActionKind::Availability { pool_id } => {
                self.availability
                    .update_availability(payload, user_id, pool_id, answer, ctx)
                    .await?
            }
            ActionKind::Met { match_id } => {
                self.met.update_met(payload, user_id, match_id, answer, ctx).await?
            }
        }

        Ok(RouterResponse::NoContent)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use matchbot_core::{MatchId, PoolId};

    use crate::events::{EventContext, RouterResponse};

    use super::{
        parse_block_id, ActionError, ActionItem, ActionKind, ActionPayload, ActionRouter,
        ActionUser, AvailabilityService, MetService,
    };

    #[derive(Default)]
    struct Recording {
        availability: Mutex<Vec<(String, PoolId, bool)>>,
        met: Mutex<Vec<(String, MatchId, bool)>>,
    }

    #[async_trait]
    impl AvailabilityService for &Recording {
        async fn update_availability(
            &self,
            _payload: &ActionPayload,
            user_id: &str,
            pool_id: PoolId,
            available: bool,
            _ctx: &EventContext,
        ) -> Result<(), ActionError> {
            self.availability.lock().expect("lock").push((user_id.to_owned(), pool_id, available));
            Ok(())
        }
    }

    #[async_trait]
    impl MetService for &Recording {
        async fn update_met(
            &self,
            _payload: &ActionPayload,
            user_id: &str,
            match_id: MatchId,
            met: bool,
            _ctx: &EventContext,
        ) -> Result<(), ActionError> {
            self.met.lock().expect("lock").push((user_id.to_owned(), match_id, met));
            Ok(())
        }
    }

    fn payload(block_id: &str, value: &str) -> ActionPayload {
        ActionPayload {
            actions: vec![ActionItem {
                block_id: Some(block_id.to_owned()),
                value: Some(value.to_owned()),
            }],
            user: Some(ActionUser { id: "U1".to_owned() }),
            channel: None,
            message: None,
        }
    }

    #[test]
    fn block_ids_parse_into_action_kinds() {
        assert_eq!(
            parse_block_id("availability-12"),
            Some(ActionKind::Availability { pool_id: PoolId(12) })
        );
        assert_eq!(parse_block_id("met-44"), Some(ActionKind::Met { match_id: MatchId(44) }));
        assert_eq!(parse_block_id("intro-1"), None);
        assert_eq!(parse_block_id("availability"), None);
        assert_eq!(parse_block_id("met-abc"), None);
    }

    #[tokio::test]
    async fn availability_answers_reach_the_availability_service() {
        let recording = Recording::default();
        let router = ActionRouter::new(&recording, &recording);

        let response = router
            .route(&payload("availability-12", "yes"), &EventContext::default())
            .await
            .expect("route");

        assert_eq!(response, RouterResponse::NoContent);
        assert_eq!(
            *recording.availability.lock().expect("lock"),
            vec![("U1".to_owned(), PoolId(12), true)]
        );
        assert!(recording.met.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn met_answers_reach_the_met_service() {
        let recording = Recording::default();
        let router = ActionRouter::new(&recording, &recording);

        router.route(&payload("met-44", "no"), &EventContext::default()).await.expect("route");

        assert_eq!(
            *recording.met.lock().expect("lock"),
            vec![("U1".to_owned(), MatchId(44), false)]
        );
    }

    #[tokio::test]
    async fn unknown_values_and_blocks_are_malformed() {
        let recording = Recording::default();
        let router = ActionRouter::new(&recording, &recording);
        let ctx = EventContext::default();

        let error =
            router.route(&payload("availability-12", "maybe"), &ctx).await.expect_err("fails");
        assert!(matches!(error, ActionError::Malformed(_)));

        let error = router.route(&payload("welcome-1", "yes"), &ctx).await.expect_err("fails");
        assert!(matches!(error, ActionError::Malformed(_)));

        let error = router
            .route(&ActionPayload::default(), &ctx)
            .await
            .expect_err("missing action fails");
        assert!(matches!(error, ActionError::Malformed(_)));
    }

    #[tokio::test]
    async fn missing_user_is_malformed() {
        let recording = Recording::default();
        let router = ActionRouter::new(&recording, &recording);
        let mut payload = payload("availability-12", "yes");
        payload.user = None;

        let error =
            router.route(&payload, &EventContext::default()).await.expect_err("fails");
        assert!(matches!(error, ActionError::Malformed(_)));
    }
}
