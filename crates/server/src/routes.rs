use axum::middleware;
use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;
use crate::{admin, health, home, stats, webhook};

pub fn router(state: AppState) -> Router {
    let slack_routes = Router::new()
        .route("/slack/message", post(webhook::handle_message))
        .route("/slack/action", post(webhook::handle_action))
        .layer(middleware::from_fn_with_state(state.clone(), webhook::verify_request));

    Router::new()
        .route("/", get(home::home))
        .route("/health", get(health::health))
        .route("/pools/{channel_name}/stats", get(stats::pool_stats))
        .route("/admin/pools", post(admin::create_pool))
        .route("/admin/rounds", post(admin::start_round))
        .route("/admin/rounds/{round_id}/matches", post(admin::form_matches))
        .merge(slack_routes)
        .with_state(state)
}
