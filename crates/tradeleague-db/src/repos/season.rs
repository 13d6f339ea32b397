//! Season singleton and archive repository

use sqlx::PgPool;

use crate::{DbError, DbResult, DbSeason, DbSeasonArchive};

pub struct SeasonRepo {
    pool: PgPool,
}

impl SeasonRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn current(&self) -> DbResult<DbSeason> {
        sqlx::query_as::<_, DbSeason>(
            r#"
            SELECT number, state, started_at, version, in_flight_key, last_completed_key
            FROM current_season WHERE id = 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::NotFound("current_season row".to_string()))
    }

    /// Compare-and-set the season row; `VersionConflict` when stale
    pub async fn update(&self, next: &DbSeason, expected_version: i64) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE current_season
            SET number = $2, state = $3, started_at = $4, version = $5,
                in_flight_key = $6, last_completed_key = $7
            WHERE id = 1 AND version = $1
            "#,
        )
        .bind(expected_version)
        .bind(next.number)
        .bind(&next.state)
        .bind(next.started_at)
        .bind(next.version)
        .bind(&next.in_flight_key)
        .bind(&next.last_completed_key)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::VersionConflict);
        }
        Ok(())
    }

    pub async fn archive_exists(&self, rotation_key: &str) -> DbResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM season_archives WHERE rotation_key = $1)",
        )
        .bind(rotation_key)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Advance the season row, insert the archive and reset every account's
    /// season accumulators, all in one transaction.
    ///
    /// A duplicate season number or rotation key fails the archive insert
    /// with a unique violation and nothing is applied.
    pub async fn finish_rotation(
        &self,
        archive: &DbSeasonArchive,
        next: &DbSeason,
        expected_version: i64,
    ) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let advanced = sqlx::query(
            r#"
            UPDATE current_season
            SET number = $2, state = $3, started_at = $4, version = $5,
                in_flight_key = $6, last_completed_key = $7
            WHERE id = 1 AND version = $1
            "#,
        )
        .bind(expected_version)
        .bind(next.number)
        .bind(&next.state)
        .bind(next.started_at)
        .bind(next.version)
        .bind(&next.in_flight_key)
        .bind(&next.last_completed_key)
        .execute(&mut *tx)
        .await?;
        if advanced.rows_affected() == 0 {
            return Err(DbError::VersionConflict);
        }

        sqlx::query(
            r#"
            INSERT INTO season_archives (id, season_number, winner_account_id, winner_username, winning_pnl,
                participant_count, leaderboard, started_at, ended_at, rotation_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(archive.id)
        .bind(archive.season_number)
        .bind(archive.winner_account_id)
        .bind(&archive.winner_username)
        .bind(archive.winning_pnl)
        .bind(archive.participant_count)
        .bind(&archive.leaderboard)
        .bind(archive.started_at)
        .bind(archive.ended_at)
        .bind(&archive.rotation_key)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE accounts
            SET best_season_pnl = GREATEST(best_season_pnl, season_pnl),
                season_pnl = 0,
                season = season + 1
            "#,
        )
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn archives(&self, limit: i64) -> DbResult<Vec<DbSeasonArchive>> {
        let archives = sqlx::query_as::<_, DbSeasonArchive>(
            "SELECT * FROM season_archives ORDER BY season_number DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(archives)
    }
}
