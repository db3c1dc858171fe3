use crate::commands::CommandResult;
use matchbot_core::config::{AppConfig, LoadOptions};
use matchbot_db::connect_with_settings;
use matchbot_db::repositories::{PoolRepository, SqlPoolRepository};

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "pools",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "pools",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let result = runtime.block_on(async {
        let pool = connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;
        let pools = SqlPoolRepository::new(pool.clone())
            .list_all()
            .await
            .map_err(|error| ("query", error.to_string(), 5u8))?;
        pool.close().await;
        Ok::<_, (&'static str, String, u8)>(pools)
    });

    match result {
        Ok(pools) if pools.is_empty() => CommandResult::success("pools", "no pools configured"),
        Ok(pools) => {
            let listing = pools
                .iter()
                .map(|pool| format!("{} ({})", pool.name, pool.channel_name))
                .collect::<Vec<_>>()
                .join("; ");
            CommandResult::success("pools", listing)
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("pools", error_class, message, exit_code)
        }
    }
}
