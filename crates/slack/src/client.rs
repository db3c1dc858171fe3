//! Slack Web API access behind the [`ChatApi`] trait so flows stay testable
//! without network access.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::blocks::MessageTemplate;

pub const DEFAULT_BASE_URL: &str = "https://slack.com/api";

#[derive(Clone, Debug)]
pub enum MessageContent {
    Text(String),
    Blocks(MessageTemplate),
}

impl MessageContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// The human-readable form used in delivery summaries and notification
    /// fallbacks.
    pub fn summary_text(&self) -> &str {
        match self {
            Self::Text(text) => text,
            Self::Blocks(template) => &template.fallback_text,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserProfile {
    pub user_id: String,
    pub user_name: String,
    /// Missing when the user has no name set on their profile.
    pub real_name: Option<String>,
    pub is_bot: bool,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ChatApiError {
    #[error("slack request failed: {0}")]
    Http(String),
    #[error("slack api `{method}` returned error: {error}")]
    Api { method: String, error: String },
}

#[async_trait]
pub trait ChatApi: Send + Sync {
    /// `chat.postMessage` to a channel, DM, or group DM.
    async fn post_message(
        &self,
        channel: &str,
        content: &MessageContent,
    ) -> Result<(), ChatApiError>;

    /// `chat.update` on an existing message, replacing its blocks.
    async fn update_message(
        &self,
        channel: &str,
        ts: &str,
        blocks: &[Value],
    ) -> Result<(), ChatApiError>;

    /// `conversations.open` for a group DM; returns the conversation id.
    async fn open_conversation(&self, user_ids: &[String]) -> Result<String, ChatApiError>;

    /// `users.info`; `None` when the user id is unknown to Slack.
    async fn user_info(&self, user_id: &str) -> Result<Option<UserProfile>, ChatApiError>;

    /// `conversations.members`, following cursor pagination to the end.
    async fn channel_members(&self, channel_id: &str) -> Result<Vec<String>, ChatApiError>;
}

pub struct HttpChatApi {
    http: reqwest::Client,
    bot_token: SecretString,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    ok: bool,
    error: Option<String>,
    channel: Option<ChannelField>,
    user: Option<UserField>,
    members: Option<Vec<String>>,
    response_metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ChannelField {
    Object { id: String },
    Id(String),
}

#[derive(Debug, Deserialize)]
struct UserField {
    id: String,
    name: String,
    #[serde(default)]
    is_bot: bool,
    profile: Option<UserProfileField>,
}

#[derive(Debug, Deserialize)]
struct UserProfileField {
    real_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMetadata {
    next_cursor: Option<String>,
}

impl HttpChatApi {
    pub fn new(bot_token: SecretString) -> Self {
        Self::with_base_url(bot_token, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(bot_token: SecretString, base_url: impl Into<String>) -> Self {
        Self { http: reqwest::Client::new(), bot_token, base_url: base_url.into() }
    }

    async fn call(&self, method: &str, body: Value) -> Result<ApiEnvelope, ChatApiError> {
        let url = format!("{}/{}", self.base_url, method);
        let response = self
            .http
            .post(&url)
            .bearer_auth(self.bot_token.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|error| ChatApiError::Http(error.to_string()))?;

        let envelope: ApiEnvelope =
            response.json().await.map_err(|error| ChatApiError::Http(error.to_string()))?;

        if !envelope.ok {
            return Err(ChatApiError::Api {
                method: method.to_owned(),
                error: envelope.error.unwrap_or_else(|| "unknown_error".to_owned()),
            });
        }

        Ok(envelope)
    }
}

#[async_trait]
impl ChatApi for HttpChatApi {
    async fn post_message(
        &self,
        channel: &str,
        content: &MessageContent,
    ) -> Result<(), ChatApiError> {
        let mut body = json!({ "channel": channel, "unfurl_links": false });
        match content {
            MessageContent::Text(text) => {
                body["text"] = Value::String(text.clone());
            }
            MessageContent::Blocks(template) => {
                body["text"] = Value::String(template.fallback_text.clone());
                body["blocks"] = serde_json::to_value(&template.blocks)
                    .map_err(|error| ChatApiError::Http(error.to_string()))?;
            }
        }

        self.call("chat.postMessage", body).await.map(|_| ())
    }

    async fn update_message(
        &self,
        channel: &str,
        ts: &str,
        blocks: &[Value],
    ) -> Result<(), ChatApiError> {
        let body = json!({ "channel": channel, "ts": ts, "blocks": blocks });
        self.call("chat.update", body).await.map(|_| ())
    }

    async fn open_conversation(&self, user_ids: &[String]) -> Result<String, ChatApiError> {
        let body = json!({ "users": user_ids.join(",") });
        let envelope = self.call("conversations.open", body).await?;
        match envelope.channel {
            Some(ChannelField::Object { id }) | Some(ChannelField::Id(id)) => Ok(id),
            None => Err(ChatApiError::Api {
                method: "conversations.open".to_owned(),
                error: "response is missing a channel".to_owned(),
            }),
        }
    }

    async fn user_info(&self, user_id: &str) -> Result<Option<UserProfile>, ChatApiError> {
        let envelope = match self.call("users.info", json!({ "user": user_id })).await {
            Ok(envelope) => envelope,
            Err(ChatApiError::Api { error, .. }) if error == "user_not_found" => return Ok(None),
            Err(error) => return Err(error),
        };

        Ok(envelope.user.map(|user| UserProfile {
            user_id: user.id,
            user_name: user.name,
            real_name: user.profile.and_then(|profile| profile.real_name),
            is_bot: user.is_bot,
        }))
    }

    async fn channel_members(&self, channel_id: &str) -> Result<Vec<String>, ChatApiError> {
        let mut members = Vec::new();
        let mut cursor = String::new();

        loop {
            let mut body = json!({ "channel": channel_id, "limit": 200 });
            if !cursor.is_empty() {
                body["cursor"] = Value::String(cursor.clone());
            }

            let envelope = self.call("conversations.members", body).await?;
            members.extend(envelope.members.unwrap_or_default());

            cursor = envelope
                .response_metadata
                .and_then(|metadata| metadata.next_cursor)
                .unwrap_or_default();
            if cursor.is_empty() {
                break;
            }
        }

        Ok(members)
    }
}

/// Stand-in for environments without Slack credentials; sends go nowhere.
#[derive(Default)]
pub struct NoopChatApi;

#[async_trait]
impl ChatApi for NoopChatApi {
    async fn post_message(
        &self,
        _channel: &str,
        _content: &MessageContent,
    ) -> Result<(), ChatApiError> {
        Ok(())
    }

    async fn update_message(
        &self,
        _channel: &str,
        _ts: &str,
        _blocks: &[Value],
    ) -> Result<(), ChatApiError> {
        Ok(())
    }

    async fn open_conversation(&self, _user_ids: &[String]) -> Result<String, ChatApiError> {
        Ok("noop-conversation".to_owned())
    }

    async fn user_info(&self, _user_id: &str) -> Result<Option<UserProfile>, ChatApiError> {
        Ok(None)
    }

    async fn channel_members(&self, _channel_id: &str) -> Result<Vec<String>, ChatApiError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::{ApiEnvelope, ChannelField, MessageContent};
    use crate::blocks::MessageTemplate;

    #[test]
    fn summary_text_prefers_fallback_for_block_messages() {
        let content = MessageContent::Blocks(MessageTemplate {
            fallback_text: "Want to meet?".to_owned(),
            blocks: Vec::new(),
        });
        assert_eq!(content.summary_text(), "Want to meet?");
        assert_eq!(MessageContent::text("hi").summary_text(), "hi");
    }

    #[test]
    fn envelope_decodes_conversation_open_response() {
        let envelope: ApiEnvelope =
            serde_json::from_str(r#"{"ok":true,"channel":{"id":"G123"}}"#).expect("decode");
        assert!(envelope.ok);
        assert!(matches!(envelope.channel, Some(ChannelField::Object { ref id }) if id == "G123"));
    }

    #[test]
    fn envelope_decodes_member_pages() {
        let envelope: ApiEnvelope = serde_json::from_str(
            r#"{"ok":true,"members":["U1","U2"],"response_metadata":{"next_cursor":"abc"}}"#,
        )
        .expect("decode");
        assert_eq!(envelope.members.as_deref(), Some(["U1".to_owned(), "U2".to_owned()].as_slice()));
        assert_eq!(
            envelope.response_metadata.and_then(|metadata| metadata.next_cursor).as_deref(),
            Some("abc")
        );
    }

    #[test]
    fn envelope_surfaces_api_errors() {
        let envelope: ApiEnvelope =
            serde_json::from_str(r#"{"ok":false,"error":"channel_not_found"}"#).expect("decode");
        assert!(!envelope.ok);
        assert_eq!(envelope.error.as_deref(), Some("channel_not_found"));
    }
}
