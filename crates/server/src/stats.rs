//! Public pool statistics.

use std::collections::BTreeSet;

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use matchbot_core::PersonId;
use matchbot_db::repositories::RepositoryError;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct PersonSummary {
    pub id: i64,
    pub full_name: String,
}

#[derive(Debug, Serialize)]
pub struct MatchSummary {
    pub id: i64,
    pub person_1: i64,
    pub person_2: i64,
    pub met: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct PoolStats {
    pub name: String,
    pub participant_count: usize,
    pub people: Vec<PersonSummary>,
    pub round_count: i64,
    pub matches: Vec<MatchSummary>,
}

fn internal(error: RepositoryError) -> ApiError {
    ApiError::Internal(error.to_string())
}

/// Historical stats for a pool, looked up by channel name. The most recent
/// round is excluded: its "did you meet?" feedback is not in yet, and
/// counting it would skew the numbers.
pub async fn pool_stats(
    State(state): State<AppState>,
    Path(channel_name): Path<String>,
) -> Result<Json<PoolStats>, ApiError> {
    // Channel names are stored with their `#`; the URL form usually comes
    // without it.
    let mut pool =
        state.repos.pools.find_by_channel_name(&channel_name).await.map_err(internal)?;
    if pool.is_none() && !channel_name.starts_with('#') {
        pool = state
            .repos
            .pools
            .find_by_channel_name(&format!("#{channel_name}"))
            .await
            .map_err(internal)?;
    }
    let pool = pool.ok_or_else(|| {
        ApiError::NotFound(format!("pool with channel name {channel_name} does not exist"))
    })?;

    let Some(latest_round) =
        state.repos.rounds.latest_for_pool(pool.id).await.map_err(internal)?
    else {
        return Ok(Json(PoolStats {
            name: pool.name,
            participant_count: 0,
            people: Vec::new(),
            round_count: 0,
            matches: Vec::new(),
        }));
    };

    let matches = state
        .repos
        .matches
        .list_for_pool_excluding_round(pool.id, latest_round.id)
        .await
        .map_err(internal)?;

    let participant_ids: BTreeSet<PersonId> = matches
        .iter()
        .flat_map(|matchup| [matchup.person_1, matchup.person_2])
        .collect();
    let ids: Vec<PersonId> = participant_ids.iter().copied().collect();
    let people = state.repos.persons.find_by_ids(&ids).await.map_err(internal)?;

    let round_count =
        state.repos.rounds.count_for_pool(pool.id).await.map_err(internal)?.saturating_sub(1);

    Ok(Json(PoolStats {
        name: pool.name,
        participant_count: participant_ids.len(),
        people: people
            .into_iter()
            .map(|person| PersonSummary { id: person.id.0, full_name: person.full_name })
            .collect(),
        round_count,
        matches: matches
            .into_iter()
            .map(|matchup| MatchSummary {
                id: matchup.id.0,
                person_1: matchup.person_1.0,
                person_2: matchup.person_2.0,
                met: matchup.met,
            })
            .collect(),
    }))
}
