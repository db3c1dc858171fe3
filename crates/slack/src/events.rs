//! Inbound Events API routing.
//!
//! Classification happens in a fixed priority order over an explicit route
//! table, so the ordering guarantees are visible in one place and testable:
//! the verification challenge short-circuits everything, bot traffic is
//! dropped before any lookup, the admin broadcast shortcut runs before the
//! generic user path, and everything else lands on the user path. Payload
//! shapes we do not recognize degrade to the user path instead of failing.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use matchbot_core::text::first_mention;

/// Top-level Events API payload. `url_verification` payloads carry their
/// fields at the top level; everything else wraps a `MessageEvent`.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct EventPayload {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub challenge: Option<String>,
    pub event: Option<MessageEvent>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct MessageEvent {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub user: Option<String>,
    pub text: Option<String>,
    pub bot_id: Option<String>,
    pub channel: Option<String>,
    pub ts: Option<String>,
}

/// Where the route table sends a payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Disposition {
    UrlVerification,
    BotMessage,
    AdminBroadcast { mentioned_user_id: String },
    UserMessage,
}

struct ClassifyInput<'a> {
    payload: &'a EventPayload,
    admin_user_id: Option<&'a str>,
}

type RoutePredicate = fn(&ClassifyInput<'_>) -> Option<Disposition>;

fn url_verification_route(input: &ClassifyInput<'_>) -> Option<Disposition> {
    (input.payload.kind.as_deref() == Some("url_verification"))
        .then_some(Disposition::UrlVerification)
}

fn bot_message_route(input: &ClassifyInput<'_>) -> Option<Disposition> {
    let bot_id = input.payload.event.as_ref()?.bot_id.as_deref()?;
    (!bot_id.is_empty()).then_some(Disposition::BotMessage)
}

fn admin_broadcast_route(input: &ClassifyInput<'_>) -> Option<Disposition> {
    let admin_user_id = input.admin_user_id?;
    let event = input.payload.event.as_ref()?;
    if event.user.as_deref() != Some(admin_user_id) {
        return None;
    }
    let mentioned_user_id = first_mention(event.text.as_deref()?)?;
    Some(Disposition::AdminBroadcast { mentioned_user_id: mentioned_user_id.to_owned() })
}

fn user_message_route(_input: &ClassifyInput<'_>) -> Option<Disposition> {
    Some(Disposition::UserMessage)
}

/// Routes in priority order; the first predicate that matches wins.
const ROUTES: &[(&str, RoutePredicate)] = &[
    ("url_verification", url_verification_route),
    ("bot_message", bot_message_route),
    ("admin_broadcast", admin_broadcast_route),
    ("user_message", user_message_route),
];

pub fn classify(payload: &EventPayload, admin_user_id: Option<&str>) -> Disposition {
    let input = ClassifyInput { payload, admin_user_id };
    ROUTES
        .iter()
        .find_map(|(_, predicate)| predicate(&input))
        .unwrap_or(Disposition::UserMessage)
}

/// What the transport layer should answer with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RouterResponse {
    /// 200 with `{"challenge": ...}` echoed back.
    Challenge { challenge: String },
    /// 204, empty body.
    NoContent,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventContext {
    pub correlation_id: String,
}

impl Default for EventContext {
    fn default() -> Self {
        Self { correlation_id: "unknown-correlation-id".to_owned() }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouterError {
    #[error("no person found for user id `{user_id}`")]
    PersonNotFound { user_id: String },
    #[error("event handling failed: {0}")]
    Service(String),
}

/// Posts an admin's message to the mentioned user as if the bot had written
/// it.
#[async_trait]
pub trait BroadcastService: Send + Sync {
    async fn send_as_bot(&self, text: &str, ctx: &EventContext) -> Result<(), RouterError>;
}

#[async_trait]
impl<T: BroadcastService + ?Sized> BroadcastService for std::sync::Arc<T> {
    async fn send_as_bot(&self, text: &str, ctx: &EventContext) -> Result<(), RouterError> {
        (**self).send_as_bot(text, ctx).await
    }
}

/// Handles free-text messages from (known or unknown) users.
#[async_trait]
pub trait UserMessageService: Send + Sync {
    async fn respond(&self, event: &MessageEvent, ctx: &EventContext)
        -> Result<(), RouterError>;
}

#[async_trait]
impl<T: UserMessageService + ?Sized> UserMessageService for std::sync::Arc<T> {
    async fn respond(
        &self,
        event: &MessageEvent,
        ctx: &EventContext,
    ) -> Result<(), RouterError> {
        (**self).respond(event, ctx).await
    }
}

pub struct EventRouter<B, U> {
    admin_user_id: Option<String>,
    broadcast: B,
    users: U,
}

impl<B, U> EventRouter<B, U>
where
    B: BroadcastService,
    U: UserMessageService,
{
    pub fn new(admin_user_id: Option<String>, broadcast: B, users: U) -> Self {
        Self { admin_user_id, broadcast, users }
    }

    pub async fn route(
        &self,
        payload: &EventPayload,
        ctx: &EventContext,
    ) -> Result<RouterResponse, RouterError> {
        match classify(payload, self.admin_user_id.as_deref()) {
            Disposition::UrlVerification => Ok(RouterResponse::Challenge {
                challenge: payload.challenge.clone().unwrap_or_default(),
            }),
            Disposition::BotMessage => {
                // The bot must not talk to itself (or other bots); drop
                // without any lookup or delivery.
                tracing::debug!(correlation_id = %ctx.correlation_id, "ignoring bot message");
                Ok(RouterResponse::NoContent)
            }
            Disposition::AdminBroadcast { mentioned_user_id } => {
                tracing::info!(
                    event_name = "slack.events.admin_broadcast",
                    correlation_id = %ctx.correlation_id,
                    mentioned_user_id = %mentioned_user_id,
                    "forwarding admin message as bot"
                );
                let text = payload
                    .event
                    .as_ref()
                    .and_then(|event| event.text.as_deref())
                    .unwrap_or_default();
                self.broadcast.send_as_bot(text, ctx).await?;
                Ok(RouterResponse::NoContent)
            }
            Disposition::UserMessage => {
                let fallback = MessageEvent::default();
                let event = payload.event.as_ref().unwrap_or(&fallback);
                self.users.respond(event, ctx).await?;
                Ok(RouterResponse::NoContent)
            }
        }
    }
}

#[derive(Default)]
pub struct NoopBroadcastService;

#[async_trait]
impl BroadcastService for NoopBroadcastService {
    async fn send_as_bot(&self, _text: &str, _ctx: &EventContext) -> Result<(), RouterError> {
        Ok(())
    }
}

#[derive(Default)]
pub struct NoopUserMessageService;

#[async_trait]
impl UserMessageService for NoopUserMessageService {
    async fn respond(
        &self,
        _event: &MessageEvent,
        _ctx: &EventContext,
    ) -> Result<(), RouterError> {
        Ok(())
    }
}
