use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use matchbot_core::config::{AppConfig, ConfigError, LoadOptions};
use matchbot_db::{connect_with_settings, migrations};
use matchbot_slack::client::HttpChatApi;
use matchbot_slack::delivery::{Deliverer, RetryPolicy};

use crate::flows::ConversationFlows;
use crate::rounds::RoundService;
use crate::state::{AppState, Repositories};
use crate::webhook::AllowAllVerifier;

pub struct Application {
    pub state: AppState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let chat = Arc::new(HttpChatApi::new(config.slack.bot_token.clone()));
    let deliverer = Deliverer::new(chat, RetryPolicy::default());
    let repos = Arc::new(Repositories::sql(&db_pool));
    let flows = Arc::new(ConversationFlows::new(
        repos.clone(),
        deliverer.clone(),
        config.slack.admin_user_id.clone(),
    ));
    let rounds = Arc::new(RoundService::new(repos.clone(), deliverer.clone()));

    Ok(Application {
        state: AppState {
            config: Arc::new(config),
            db_pool,
            repos,
            deliverer,
            flows,
            rounds,
            verifier: Arc::new(AllowAllVerifier),
        },
    })
}

#[cfg(test)]
mod tests {
    use matchbot_core::config::{ConfigOverrides, LoadOptions};

    use crate::bootstrap::bootstrap;

    fn valid_overrides(database_url: &str) -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some(database_url.to_string()),
                slack_bot_token: Some("xoxb-test".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_fails_fast_without_a_valid_bot_token() {
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("sqlite::memory:".to_string()),
                slack_bot_token: Some("invalid-token".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await;

        assert!(result.is_err());
        let message = result.err().expect("error").to_string();
        assert!(message.contains("slack.bot_token"));
    }

    #[tokio::test]
    async fn bootstrap_applies_migrations() {
        let app = bootstrap(valid_overrides("sqlite::memory:?cache=shared"))
            .await
            .expect("bootstrap should succeed with valid overrides");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master \
             WHERE type = 'table' AND name IN ('pool', 'person', 'pool_membership', 'round', 'matchup')",
        )
        .fetch_one(&app.state.db_pool)
        .await
        .expect("expected baseline tables to be available after bootstrap");
        assert_eq!(table_count, 5, "bootstrap should expose the matching data path tables");

        app.state.db_pool.close().await;
    }
}
