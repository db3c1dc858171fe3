//! Admin actions: pool creation, starting a round, forming a round's
//! matches. These endpoints are for operators; access control is a
//! deployment concern (reverse proxy / network policy).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use matchbot_core::{Pool, PoolId, Round, RoundId};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreatePoolRequest {
    pub name: String,
    pub channel_id: String,
    pub channel_name: String,
}

pub async fn create_pool(
    State(state): State<AppState>,
    Json(request): Json<CreatePoolRequest>,
) -> Result<(StatusCode, Json<Pool>), ApiError> {
    if request.name.trim().is_empty() {
        return Err(ApiError::BadRequest("pool name must not be empty".to_owned()));
    }
    let existing = state
        .repos
        .pools
        .find_by_name(&request.name)
        .await
        .map_err(|error| ApiError::Internal(error.to_string()))?;
    if existing.is_some() {
        return Err(ApiError::Conflict(format!("a pool named `{}` already exists", request.name)));
    }

    let pool = state
        .repos
        .pools
        .create(Pool {
            id: PoolId(0),
            name: request.name,
            channel_id: request.channel_id,
            channel_name: request.channel_name,
        })
        .await
        .map_err(|error| ApiError::Internal(error.to_string()))?;

    Ok((StatusCode::CREATED, Json(pool)))
}

#[derive(Debug, Deserialize)]
pub struct StartRoundRequest {
    pub pool_name: String,
}

pub async fn start_round(
    State(state): State<AppState>,
    Json(request): Json<StartRoundRequest>,
) -> Result<(StatusCode, Json<Round>), ApiError> {
    let round = state.rounds.start_round(&request.pool_name).await?;
    Ok((StatusCode::CREATED, Json(round)))
}

#[derive(Debug, Serialize)]
pub struct MatchSummary {
    pub id: i64,
    pub person_1: i64,
    pub person_2: i64,
}

#[derive(Debug, Serialize)]
pub struct FormMatchesResponse {
    pub round_id: i64,
    pub matches: Vec<MatchSummary>,
}

pub async fn form_matches(
    State(state): State<AppState>,
    Path(round_id): Path<i64>,
) -> Result<Json<FormMatchesResponse>, ApiError> {
    let mut rng = StdRng::from_entropy();
    let matches = state.rounds.form_matches(RoundId(round_id), &mut rng).await?;

    Ok(Json(FormMatchesResponse {
        round_id,
        matches: matches
            .into_iter()
            .map(|matchup| MatchSummary {
                id: matchup.id.0,
                person_1: matchup.person_1.0,
                person_2: matchup.person_2.0,
            })
            .collect(),
    }))
}
