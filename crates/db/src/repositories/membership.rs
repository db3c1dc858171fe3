use async_trait::async_trait;
use sqlx::Row;

use matchbot_core::{PersonId, PoolId, PoolMembership};

use super::{MembershipRepository, RepositoryError};
use crate::DbPool;

pub struct SqlMembershipRepository {
    pool: DbPool,
}

impl SqlMembershipRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MembershipRepository for SqlMembershipRepository {
    async fn find(
        &self,
        person_id: PersonId,
        pool_id: PoolId,
    ) -> Result<Option<PoolMembership>, RepositoryError> {
        let row = sqlx::query(
            "SELECT person_id, pool_id, available FROM pool_membership \
             WHERE person_id = ?1 AND pool_id = ?2",
        )
        .bind(person_id.0)
        .bind(pool_id.0)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| {
            Ok::<_, sqlx::Error>(PoolMembership {
                person_id: PersonId(row.try_get("person_id")?),
                pool_id: PoolId(row.try_get("pool_id")?),
                available: row.try_get("available")?,
            })
        })
        .transpose()?)
    }

    async fn add(&self, person_id: PersonId, pool_id: PoolId) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO pool_membership (person_id, pool_id, available) VALUES (?1, ?2, NULL) \
             ON CONFLICT (person_id, pool_id) DO NOTHING",
        )
        .bind(person_id.0)
        .bind(pool_id.0)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn remove(&self, person_id: PersonId, pool_id: PoolId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM pool_membership WHERE person_id = ?1 AND pool_id = ?2")
            .bind(person_id.0)
            .bind(pool_id.0)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn set_available(
        &self,
        person_id: PersonId,
        pool_id: PoolId,
        available: Option<bool>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE pool_membership SET available = ?1 WHERE person_id = ?2 AND pool_id = ?3",
        )
        .bind(available)
        .bind(person_id.0)
        .bind(pool_id.0)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn set_available_everywhere(
        &self,
        person_id: PersonId,
        available: bool,
    ) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE pool_membership SET available = ?1 WHERE person_id = ?2")
            .bind(available)
            .bind(person_id.0)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn reset_availability_for_pool(&self, pool_id: PoolId) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE pool_membership SET available = NULL WHERE pool_id = ?1")
            .bind(pool_id.0)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
