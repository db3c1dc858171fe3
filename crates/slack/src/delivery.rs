//! Outbound message delivery.
//!
//! `send_msg` is the one path every outgoing message takes. When the message
//! answers an interactive component it first tries to rewrite the original
//! question so the pressed button is shown as static text; that update is
//! best-effort and a failure there never stops the new message from going
//! out. Posting itself retries transient Web API failures with capped
//! exponential backoff.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::actions::ActionPayload;
use crate::blocks::highlight_selected;
use crate::client::{ChatApi, ChatApiError, MessageContent};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: 5, base_delay_ms: 1_000, max_delay_ms: 120_000 }
    }
}

impl RetryPolicy {
    fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(16);
        let multiplier = 1_u64 << exponent;
        let delay_ms = self.base_delay_ms.saturating_mul(multiplier).min(self.max_delay_ms);
        Duration::from_millis(delay_ms)
    }
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("message delivery to `{channel}` failed after {attempts} attempts: {source}")]
    Exhausted { channel: String, attempts: u32, source: ChatApiError },
}

#[derive(Clone)]
pub struct Deliverer {
    chat: Arc<dyn ChatApi>,
    policy: RetryPolicy,
}

impl Deliverer {
    pub fn new(chat: Arc<dyn ChatApi>, policy: RetryPolicy) -> Self {
        Self { chat, policy }
    }

    pub fn chat(&self) -> &Arc<dyn ChatApi> {
        &self.chat
    }

    /// Send a message to a user or channel as the bot.
    ///
    /// When `prior` references the interactive message being answered, the
    /// original question's blocks are rewritten first to freeze the selected
    /// button. Returns a short delivery summary: `<channel>: "<text>"`.
    pub async fn send_msg(
        &self,
        channel: &str,
        prior: Option<&ActionPayload>,
        content: &MessageContent,
    ) -> Result<String, DeliveryError> {
        if let Some(payload) = prior {
            self.update_prior_message(channel, payload).await;
        }

        self.post_with_retry(channel, content).await?;
        Ok(format!("{channel}: \"{}\"", content.summary_text()))
    }

    /// Best effort: log and move on when the original message cannot be
    /// updated, so the answer still gets its reply.
    async fn update_prior_message(&self, channel: &str, payload: &ActionPayload) {
        let selected_value =
            payload.actions.first().and_then(|action| action.value.as_deref()).unwrap_or_default();
        let Some(message) = payload.message.as_ref() else {
            warn!(channel, "no prior message found in payload; skipping update");
            return;
        };
        let Some(ts) = message.get("ts").and_then(Value::as_str) else {
            warn!(channel, "prior message has no ts; skipping update");
            return;
        };
        let blocks = message
            .get("blocks")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let message_channel = payload
            .channel
            .as_ref()
            .map(|channel| channel.id.as_str())
            .unwrap_or(channel);

        let rewritten = highlight_selected(blocks, selected_value);
        if let Err(error) = self.chat.update_message(message_channel, ts, &rewritten).await {
            warn!(
                channel = message_channel,
                ts,
                error = %error,
                "failed to update prior message; sending anyway"
            );
        }
    }

    async fn post_with_retry(
        &self,
        channel: &str,
        content: &MessageContent,
    ) -> Result<(), DeliveryError> {
        let mut attempt = 0;
        loop {
            match self.chat.post_message(channel, content).await {
                Ok(()) => return Ok(()),
                Err(error) => {
                    if attempt >= self.policy.max_retries {
                        return Err(DeliveryError::Exhausted {
                            channel: channel.to_owned(),
                            attempts: attempt + 1,
                            source: error,
                        });
                    }

                    let delay = self.policy.backoff(attempt);
                    warn!(
                        channel,
                        attempt,
                        retries_remaining = self.policy.max_retries - attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "failed to send message; retrying"
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
            }
        }
    }
}
