use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use matchbot_core::{PoolId, Round, RoundId, RoundStatus};

use super::{RepositoryError, RoundRepository};
use crate::DbPool;

pub struct SqlRoundRepository {
    pool: DbPool,
}

impl SqlRoundRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

pub(crate) fn round_from_row(row: &SqliteRow) -> Result<Round, RepositoryError> {
    let status_value: String = row.try_get("status")?;
    let status = RoundStatus::parse(&status_value).ok_or_else(|| {
        RepositoryError::Decode(format!("unknown round status `{status_value}`"))
    })?;

    Ok(Round {
        id: RoundId(row.try_get("id")?),
        pool_id: PoolId(row.try_get("pool_id")?),
        start_date: row.try_get("start_date")?,
        end_date: row.try_get("end_date")?,
        status,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl RoundRepository for SqlRoundRepository {
    async fn find_by_id(&self, id: RoundId) -> Result<Option<Round>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, pool_id, start_date, end_date, status, created_at FROM round \
             WHERE id = ?1",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(round_from_row).transpose()
    }

    async fn create(&self, round: Round) -> Result<Round, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO round (pool_id, start_date, end_date, status, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(round.pool_id.0)
        .bind(round.start_date)
        .bind(round.end_date)
        .bind(round.status.as_str())
        .bind(round.created_at)
        .execute(&self.pool)
        .await?;

        Ok(Round { id: RoundId(result.last_insert_rowid()), ..round })
    }

    async fn update_status(
        &self,
        id: RoundId,
        status: RoundStatus,
    ) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE round SET status = ?1 WHERE id = ?2")
            .bind(status.as_str())
            .bind(id.0)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn latest_for_pool(&self, pool_id: PoolId) -> Result<Option<Round>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, pool_id, start_date, end_date, status, created_at FROM round \
             WHERE pool_id = ?1 ORDER BY end_date DESC, id DESC LIMIT 1",
        )
        .bind(pool_id.0)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(round_from_row).transpose()
    }

    async fn count_for_pool(&self, pool_id: PoolId) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM round WHERE pool_id = ?1")
            .bind(pool_id.0)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
