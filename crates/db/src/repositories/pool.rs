use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use matchbot_core::{Pool, PoolId};

use super::{PoolRepository, RepositoryError};
use crate::DbPool;

pub struct SqlPoolRepository {
    pool: DbPool,
}

impl SqlPoolRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

pub(crate) fn pool_from_row(row: &SqliteRow) -> Result<Pool, RepositoryError> {
    Ok(Pool {
        id: PoolId(row.try_get("id")?),
        name: row.try_get("name")?,
        channel_id: row.try_get("channel_id")?,
        channel_name: row.try_get("channel_name")?,
    })
}

#[async_trait]
impl PoolRepository for SqlPoolRepository {
    async fn find_by_id(&self, id: PoolId) -> Result<Option<Pool>, RepositoryError> {
        let row = sqlx::query("SELECT id, name, channel_id, channel_name FROM pool WHERE id = ?1")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(pool_from_row).transpose()
    }

    async fn find_by_channel_id(&self, channel_id: &str) -> Result<Option<Pool>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, name, channel_id, channel_name FROM pool WHERE channel_id = ?1",
        )
        .bind(channel_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(pool_from_row).transpose()
    }

    async fn find_by_channel_name(
        &self,
        channel_name: &str,
    ) -> Result<Option<Pool>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, name, channel_id, channel_name FROM pool WHERE channel_name = ?1",
        )
        .bind(channel_name)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(pool_from_row).transpose()
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Pool>, RepositoryError> {
        let row = sqlx::query("SELECT id, name, channel_id, channel_name FROM pool WHERE name = ?1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(pool_from_row).transpose()
    }

    async fn create(&self, pool: Pool) -> Result<Pool, RepositoryError> {
        let result =
            sqlx::query("INSERT INTO pool (name, channel_id, channel_name) VALUES (?1, ?2, ?3)")
                .bind(&pool.name)
                .bind(&pool.channel_id)
                .bind(&pool.channel_name)
                .execute(&self.pool)
                .await?;

        Ok(Pool { id: PoolId(result.last_insert_rowid()), ..pool })
    }

    async fn list_all(&self) -> Result<Vec<Pool>, RepositoryError> {
        let rows =
            sqlx::query("SELECT id, name, channel_id, channel_name FROM pool ORDER BY name")
                .fetch_all(&self.pool)
                .await?;
        rows.iter().map(pool_from_row).collect()
    }
}
