//! Shared test doubles for flow and route tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use matchbot_core::config::AppConfig;
use matchbot_core::{Pool, PoolId};
use matchbot_db::repositories::PoolRepository;
use matchbot_db::connect_with_settings;
use matchbot_slack::client::{ChatApi, ChatApiError, MessageContent, UserProfile};
use matchbot_slack::delivery::{Deliverer, RetryPolicy};

use crate::flows::ConversationFlows;
use crate::rounds::RoundService;
use crate::state::{AppState, Repositories};
use crate::webhook::AllowAllVerifier;

/// A `ChatApi` that records every call and answers from fixed fixtures.
#[derive(Default)]
pub struct RecordingChat {
    /// (channel, summary text) per posted message, in order.
    pub posted: Mutex<Vec<(String, String)>>,
    /// (channel, ts) per updated message.
    pub updated: Mutex<Vec<(String, String)>>,
    /// User ids per opened conversation.
    pub opened: Mutex<Vec<Vec<String>>>,
    /// Profiles served by `user_info`.
    pub profiles: HashMap<String, UserProfile>,
    /// Members served by `channel_members`.
    pub members: Vec<String>,
}

impl RecordingChat {
    pub fn with_members(members: &[&str]) -> Self {
        Self { members: members.iter().map(|id| (*id).to_owned()).collect(), ..Self::default() }
    }

    pub fn add_profile(
        &mut self,
        user_id: &str,
        user_name: &str,
        real_name: Option<&str>,
        is_bot: bool,
    ) {
        self.profiles.insert(
            user_id.to_owned(),
            UserProfile {
                user_id: user_id.to_owned(),
                user_name: user_name.to_owned(),
                real_name: real_name.map(str::to_owned),
                is_bot,
            },
        );
    }
}

#[async_trait]
impl ChatApi for RecordingChat {
    async fn post_message(
        &self,
        channel: &str,
        content: &MessageContent,
    ) -> Result<(), ChatApiError> {
        self.posted
            .lock()
            .expect("lock")
            .push((channel.to_owned(), content.summary_text().to_owned()));
        Ok(())
    }

    async fn update_message(
        &self,
        channel: &str,
        ts: &str,
        _blocks: &[Value],
    ) -> Result<(), ChatApiError> {
        self.updated.lock().expect("lock").push((channel.to_owned(), ts.to_owned()));
        Ok(())
    }

    async fn open_conversation(&self, user_ids: &[String]) -> Result<String, ChatApiError> {
        let mut opened = self.opened.lock().expect("lock");
        opened.push(user_ids.to_vec());
        Ok(format!("G{}", opened.len()))
    }

    async fn user_info(&self, user_id: &str) -> Result<Option<UserProfile>, ChatApiError> {
        Ok(self.profiles.get(user_id).cloned())
    }

    async fn channel_members(&self, _channel_id: &str) -> Result<Vec<String>, ChatApiError> {
        Ok(self.members.clone())
    }
}

pub struct TestState {
    pub state: AppState,
    pub chat: Arc<RecordingChat>,
    pub repos: Arc<Repositories>,
}

/// An [`AppState`] over in-memory repositories, a recording chat fake, and a
/// throwaway SQLite pool (for the health check only).
pub async fn test_state(admin_user_id: Option<&str>) -> TestState {
    test_state_with_chat(admin_user_id, RecordingChat::default()).await
}

pub async fn test_state_with_chat(
    admin_user_id: Option<&str>,
    chat: RecordingChat,
) -> TestState {
    let db_pool = connect_with_settings("sqlite::memory:", 1, 5).await.expect("connect");
    let repos = Arc::new(Repositories::in_memory());
    let chat = Arc::new(chat);
    let deliverer = Deliverer::new(
        chat.clone(),
        RetryPolicy { max_retries: 0, base_delay_ms: 0, max_delay_ms: 0 },
    );
    let mut config = AppConfig::default();
    config.slack.admin_user_id = admin_user_id.map(str::to_owned);
    let flows = Arc::new(ConversationFlows::new(
        repos.clone(),
        deliverer.clone(),
        config.slack.admin_user_id.clone(),
    ));
    let rounds = Arc::new(RoundService::new(repos.clone(), deliverer.clone()));

    TestState {
        state: AppState {
            config: Arc::new(config),
            db_pool,
            repos: repos.clone(),
            deliverer,
            flows,
            rounds,
            verifier: Arc::new(AllowAllVerifier),
        },
        chat,
        repos,
    }
}

pub async fn seed_pool(repos: &Repositories) -> Pool {
    repos
        .pools
        .create(Pool {
            id: PoolId(0),
            name: "2026 interns".to_owned(),
            channel_id: "C1".to_owned(),
            channel_name: "#interns-2026".to_owned(),
        })
        .await
        .expect("create pool")
}
