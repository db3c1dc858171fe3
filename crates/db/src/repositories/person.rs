use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row};

use matchbot_core::{LastQuery, Person, PersonId, PoolId};

use super::{PersonRepository, RepositoryError};
use crate::DbPool;

pub struct SqlPersonRepository {
    pool: DbPool,
}

impl SqlPersonRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

pub(crate) fn person_from_row(row: &SqliteRow) -> Result<Person, RepositoryError> {
    let last_query = match row.try_get::<Option<String>, _>("last_query")? {
        Some(value) => Some(LastQuery::parse(&value).ok_or_else(|| {
            RepositoryError::Decode(format!("unknown last_query value `{value}`"))
        })?),
        None => None,
    };

    Ok(Person {
        id: PersonId(row.try_get("id")?),
        user_id: row.try_get("user_id")?,
        user_name: row.try_get("user_name")?,
        full_name: row.try_get("full_name")?,
        casual_name: row.try_get("casual_name")?,
        intro: row.try_get("intro")?,
        can_be_excluded: row.try_get("can_be_excluded")?,
        last_query,
        joined_at: row.try_get("joined_at")?,
    })
}

const PERSON_COLUMNS: &str =
    "person.id, person.user_id, person.user_name, person.full_name, person.casual_name, \
     person.intro, person.can_be_excluded, person.last_query, person.joined_at";

#[async_trait]
impl PersonRepository for SqlPersonRepository {
    async fn find_by_id(&self, id: PersonId) -> Result<Option<Person>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {PERSON_COLUMNS} FROM person WHERE id = ?1"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(person_from_row).transpose()
    }

    async fn find_by_user_id(&self, user_id: &str) -> Result<Option<Person>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {PERSON_COLUMNS} FROM person WHERE user_id = ?1"))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(person_from_row).transpose()
    }

    async fn find_by_ids(&self, ids: &[PersonId]) -> Result<Vec<Person>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder = QueryBuilder::new(format!(
            "SELECT {PERSON_COLUMNS} FROM person WHERE person.id IN ("
        ));
        {
            let mut separated = builder.separated(", ");
            for id in ids {
                separated.push_bind(id.0);
            }
        }
        builder.push(") ORDER BY person.full_name");

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(person_from_row).collect()
    }

    async fn create(&self, person: Person) -> Result<Person, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO person \
             (user_id, user_name, full_name, casual_name, intro, can_be_excluded, last_query, joined_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(&person.user_id)
        .bind(&person.user_name)
        .bind(&person.full_name)
        .bind(&person.casual_name)
        .bind(&person.intro)
        .bind(person.can_be_excluded)
        .bind(person.last_query.map(|query| query.as_str()))
        .bind(person.joined_at)
        .execute(&self.pool)
        .await?;

        Ok(Person { id: PersonId(result.last_insert_rowid()), ..person })
    }

    async fn update(&self, person: &Person) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE person SET user_name = ?1, full_name = ?2, casual_name = ?3, intro = ?4, \
             can_be_excluded = ?5, last_query = ?6 WHERE id = ?7",
        )
        .bind(&person.user_name)
        .bind(&person.full_name)
        .bind(&person.casual_name)
        .bind(&person.intro)
        .bind(person.can_be_excluded)
        .bind(person.last_query.map(|query| query.as_str()))
        .bind(person.id.0)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_with_intro_for_pool(
        &self,
        pool_id: PoolId,
    ) -> Result<Vec<Person>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {PERSON_COLUMNS} FROM person \
             JOIN pool_membership ON pool_membership.person_id = person.id \
             WHERE pool_membership.pool_id = ?1 AND person.intro <> '' \
             ORDER BY pool_membership.id"
        ))
        .bind(pool_id.0)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(person_from_row).collect()
    }

    async fn list_available_for_pool(
        &self,
        pool_id: PoolId,
    ) -> Result<Vec<Person>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {PERSON_COLUMNS} FROM person \
             JOIN pool_membership ON pool_membership.person_id = person.id \
             WHERE pool_membership.pool_id = ?1 AND pool_membership.available = 1 \
             ORDER BY pool_membership.id"
        ))
        .bind(pool_id.0)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(person_from_row).collect()
    }
}
