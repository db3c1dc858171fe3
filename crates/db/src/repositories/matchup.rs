use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use matchbot_core::{pair_key, Match, MatchId, PairHistory, PersonId, PoolId, RoundId};

use super::{MatchRepository, RepositoryError};
use crate::DbPool;

pub struct SqlMatchRepository {
    pool: DbPool,
}

impl SqlMatchRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

pub(crate) fn match_from_row(row: &SqliteRow) -> Result<Match, RepositoryError> {
    Ok(Match {
        id: MatchId(row.try_get("id")?),
        round_id: RoundId(row.try_get("round_id")?),
        person_1: PersonId(row.try_get("person_1_id")?),
        person_2: PersonId(row.try_get("person_2_id")?),
        conversation_id: row.try_get("conversation_id")?,
        met: row.try_get("met")?,
    })
}

const MATCH_COLUMNS: &str =
    "matchup.id, matchup.round_id, matchup.person_1_id, matchup.person_2_id, \
     matchup.conversation_id, matchup.met";

#[async_trait]
impl MatchRepository for SqlMatchRepository {
    async fn find_by_id(&self, id: MatchId) -> Result<Option<Match>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {MATCH_COLUMNS} FROM matchup WHERE id = ?1"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(match_from_row).transpose()
    }

    async fn create(&self, matchup: Match) -> Result<Match, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO matchup (round_id, person_1_id, person_2_id, conversation_id, met) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(matchup.round_id.0)
        .bind(matchup.person_1.0)
        .bind(matchup.person_2.0)
        .bind(&matchup.conversation_id)
        .bind(matchup.met)
        .execute(&self.pool)
        .await?;

        Ok(Match { id: MatchId(result.last_insert_rowid()), ..matchup })
    }

    async fn update(&self, matchup: &Match) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE matchup SET conversation_id = ?1, met = ?2 WHERE id = ?3")
            .bind(&matchup.conversation_id)
            .bind(matchup.met)
            .bind(matchup.id.0)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn count_between_persons(
        &self,
        a: PersonId,
        b: PersonId,
    ) -> Result<u32, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM matchup \
             WHERE (person_1_id = ?1 AND person_2_id = ?2) \
                OR (person_1_id = ?2 AND person_2_id = ?1)",
        )
        .bind(a.0)
        .bind(b.0)
        .fetch_one(&self.pool)
        .await?;

        Ok(count as u32)
    }

    async fn pair_history_for_pool(
        &self,
        pool_id: PoolId,
    ) -> Result<PairHistory, RepositoryError> {
        let rows = sqlx::query(
            "SELECT matchup.person_1_id, matchup.person_2_id, COUNT(*) AS times FROM matchup \
             JOIN round ON round.id = matchup.round_id \
             WHERE round.pool_id = ?1 \
             GROUP BY matchup.person_1_id, matchup.person_2_id",
        )
        .bind(pool_id.0)
        .fetch_all(&self.pool)
        .await?;

        let mut history = PairHistory::new();
        for row in rows {
            let a = PersonId(row.try_get("person_1_id")?);
            let b = PersonId(row.try_get("person_2_id")?);
            let times: i64 = row.try_get("times")?;
            *history.entry(pair_key(a, b)).or_insert(0) += times as u32;
        }

        Ok(history)
    }

    async fn latest_for_person_in_pool(
        &self,
        person_id: PersonId,
        pool_id: PoolId,
    ) -> Result<Option<Match>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {MATCH_COLUMNS} FROM matchup \
             JOIN round ON round.id = matchup.round_id \
             WHERE round.pool_id = ?1 AND (matchup.person_1_id = ?2 OR matchup.person_2_id = ?2) \
             ORDER BY round.end_date DESC, matchup.id DESC LIMIT 1"
        ))
        .bind(pool_id.0)
        .bind(person_id.0)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(match_from_row).transpose()
    }

    async fn list_for_pool_excluding_round(
        &self,
        pool_id: PoolId,
        round_id: RoundId,
    ) -> Result<Vec<Match>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {MATCH_COLUMNS} FROM matchup \
             JOIN round ON round.id = matchup.round_id \
             WHERE round.pool_id = ?1 AND matchup.round_id <> ?2 \
             ORDER BY matchup.id"
        ))
        .bind(pool_id.0)
        .bind(round_id.0)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(match_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};

    use matchbot_core::{
        default_end_date, Match, MatchId, Person, Pool, PoolId, Round, RoundId, RoundStatus,
    };

    use crate::connect_with_settings;
    use crate::migrations::run_pending;
    use crate::repositories::{
        MatchRepository, MembershipRepository, PersonRepository, PoolRepository, RoundRepository,
        SqlMatchRepository, SqlMembershipRepository, SqlPersonRepository, SqlPoolRepository,
        SqlRoundRepository,
    };

    struct Fixture {
        pool: crate::DbPool,
        persons: SqlPersonRepository,
        pools: SqlPoolRepository,
        memberships: SqlMembershipRepository,
        rounds: SqlRoundRepository,
        matches: SqlMatchRepository,
    }

    async fn fixture() -> Fixture {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        run_pending(&pool).await.expect("run migrations");
        Fixture {
            persons: SqlPersonRepository::new(pool.clone()),
            pools: SqlPoolRepository::new(pool.clone()),
            memberships: SqlMembershipRepository::new(pool.clone()),
            rounds: SqlRoundRepository::new(pool.clone()),
            matches: SqlMatchRepository::new(pool.clone()),
            pool,
        }
    }

    async fn seed_pool(fixture: &Fixture) -> Pool {
        fixture
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

    async fn seed_person(fixture: &Fixture, user_id: &str, intro: &str) -> Person {
        let mut person = Person::new(user_id, user_id.to_ascii_lowercase(), format!("Person {user_id}"));
        person.intro = intro.to_owned();
        fixture.persons.create(person).await.expect("create person")
    }

    async fn seed_round(fixture: &Fixture, pool_id: PoolId, end: NaiveDate) -> Round {
        fixture
            .rounds
            .create(Round {
                id: RoundId(0),
                pool_id,
                start_date: end.pred_opt().unwrap_or(end),
                end_date: end,
                status: RoundStatus::Created,
                created_at: Utc::now(),
            })
            .await
            .expect("create round")
    }

    #[tokio::test]
    async fn person_round_trips_including_last_query() {
        let fixture = fixture().await;
        let mut person = seed_person(&fixture, "U1", "hello").await;
        person.last_query = Some(matchbot_core::LastQuery::UpdateIntro);
        person.can_be_excluded = false;
        fixture.persons.update(&person).await.expect("update person");

        let found = fixture
            .persons
            .find_by_user_id("U1")
            .await
            .expect("find person")
            .expect("person exists");

        assert_eq!(found.last_query, Some(matchbot_core::LastQuery::UpdateIntro));
        assert!(!found.can_be_excluded);
        assert_eq!(found.intro, "hello");

        fixture.pool.close().await;
    }

    #[tokio::test]
    async fn available_pool_members_come_back_in_join_order() {
        let fixture = fixture().await;
        let pool = seed_pool(&fixture).await;
        let first = seed_person(&fixture, "U1", "a").await;
        let second = seed_person(&fixture, "U2", "b").await;
        let third = seed_person(&fixture, "U3", "c").await;

        for person in [&first, &second, &third] {
            fixture.memberships.add(person.id, pool.id).await.expect("add membership");
        }
        fixture
            .memberships
            .set_available(first.id, pool.id, Some(true))
            .await
            .expect("set availability");
        fixture
            .memberships
            .set_available(second.id, pool.id, Some(false))
            .await
            .expect("set availability");
        fixture
            .memberships
            .set_available(third.id, pool.id, Some(true))
            .await
            .expect("set availability");

        let available =
            fixture.persons.list_available_for_pool(pool.id).await.expect("list available");

        let user_ids: Vec<_> = available.iter().map(|person| person.user_id.as_str()).collect();
        assert_eq!(user_ids, vec!["U1", "U3"]);

        fixture.memberships.reset_availability_for_pool(pool.id).await.expect("reset");
        let available =
            fixture.persons.list_available_for_pool(pool.id).await.expect("list available");
        assert!(available.is_empty());

        fixture.pool.close().await;
    }

    #[tokio::test]
    async fn members_without_intro_are_not_broadcast_targets() {
        let fixture = fixture().await;
        let pool = seed_pool(&fixture).await;
        let onboarded = seed_person(&fixture, "U1", "hi there").await;
        let pending = seed_person(&fixture, "U2", "").await;
        fixture.memberships.add(onboarded.id, pool.id).await.expect("add membership");
        fixture.memberships.add(pending.id, pool.id).await.expect("add membership");

        let with_intro =
            fixture.persons.list_with_intro_for_pool(pool.id).await.expect("list with intro");

        assert_eq!(with_intro.len(), 1);
        assert_eq!(with_intro[0].user_id, "U1");

        fixture.pool.close().await;
    }

    #[tokio::test]
    async fn match_counts_are_order_insensitive() {
        let fixture = fixture().await;
        let pool = seed_pool(&fixture).await;
        let a = seed_person(&fixture, "U1", "a").await;
        let b = seed_person(&fixture, "U2", "b").await;
        let round = seed_round(&fixture, pool.id, NaiveDate::from_ymd_opt(2026, 3, 6).unwrap()).await;

        fixture
            .matches
            .create(Match {
                id: MatchId(0),
                round_id: round.id,
                person_1: a.id,
                person_2: b.id,
                conversation_id: None,
                met: None,
            })
            .await
            .expect("create match");

        assert_eq!(fixture.matches.count_between_persons(a.id, b.id).await.expect("count"), 1);
        assert_eq!(fixture.matches.count_between_persons(b.id, a.id).await.expect("count"), 1);

        let history = fixture.matches.pair_history_for_pool(pool.id).await.expect("history");
        assert_eq!(history.get(&matchbot_core::pair_key(a.id, b.id)), Some(&1));

        fixture.pool.close().await;
    }

    #[tokio::test]
    async fn latest_match_follows_round_end_dates() {
        let fixture = fixture().await;
        let pool = seed_pool(&fixture).await;
        let a = seed_person(&fixture, "U1", "a").await;
        let b = seed_person(&fixture, "U2", "b").await;
        let c = seed_person(&fixture, "U3", "c").await;

        let earlier =
            seed_round(&fixture, pool.id, NaiveDate::from_ymd_opt(2026, 2, 27).unwrap()).await;
        let later =
            seed_round(&fixture, pool.id, NaiveDate::from_ymd_opt(2026, 3, 6).unwrap()).await;

        fixture
            .matches
            .create(Match {
                id: MatchId(0),
                round_id: earlier.id,
                person_1: a.id,
                person_2: b.id,
                conversation_id: None,
                met: Some(true),
            })
            .await
            .expect("create match");
        let recent = fixture
            .matches
            .create(Match {
                id: MatchId(0),
                round_id: later.id,
                person_1: c.id,
                person_2: a.id,
                conversation_id: None,
                met: None,
            })
            .await
            .expect("create match");

        let latest = fixture
            .matches
            .latest_for_person_in_pool(a.id, pool.id)
            .await
            .expect("latest")
            .expect("match exists");
        assert_eq!(latest.id, recent.id);
        assert_eq!(latest.other_person(a.id), Some(c.id));

        let historical = fixture
            .matches
            .list_for_pool_excluding_round(pool.id, later.id)
            .await
            .expect("list excluding round");
        assert_eq!(historical.len(), 1);
        assert_eq!(historical[0].round_id, earlier.id);

        fixture.pool.close().await;
    }

    #[tokio::test]
    async fn round_status_persists_through_updates() {
        let fixture = fixture().await;
        let pool = seed_pool(&fixture).await;
        let round =
            seed_round(&fixture, pool.id, NaiveDate::from_ymd_opt(2026, 3, 6).unwrap()).await;

        fixture
            .rounds
            .update_status(round.id, RoundStatus::AvailabilityRequested)
            .await
            .expect("update status");

        let found =
            fixture.rounds.find_by_id(round.id).await.expect("find round").expect("round exists");
        assert_eq!(found.status, RoundStatus::AvailabilityRequested);
        assert_eq!(fixture.rounds.count_for_pool(pool.id).await.expect("count"), 1);

        let latest =
            fixture.rounds.latest_for_pool(pool.id).await.expect("latest").expect("round exists");
        assert_eq!(latest.id, round.id);

        fixture.pool.close().await;
    }

    #[tokio::test]
    async fn default_end_date_lands_four_days_out() {
        let start = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        assert_eq!(default_end_date(start), NaiveDate::from_ymd_opt(2026, 3, 6).unwrap());
    }
}
