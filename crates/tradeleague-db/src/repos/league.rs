//! Fantasy league repository

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{DbLeague, DbMembership, DbResult};

/// Outcome of a guarded membership insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberInsert {
    Added,
    LeagueMissing,
    AlreadyMember,
    Full,
}

pub struct LeagueRepo {
    pool: PgPool,
}

impl LeagueRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, league: &DbLeague) -> DbResult<DbLeague> {
        let l = sqlx::query_as::<_, DbLeague>(
            r#"
            INSERT INTO fantasy_leagues (id, name, invite_code, owner_id, starting_capital, starts_at,
                ends_at, max_members, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(league.id)
        .bind(&league.name)
        .bind(&league.invite_code)
        .bind(league.owner_id)
        .bind(league.starting_capital)
        .bind(league.starts_at)
        .bind(league.ends_at)
        .bind(league.max_members)
        .bind(league.created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(l)
    }

    pub async fn find(&self, id: Uuid) -> DbResult<Option<DbLeague>> {
        let league = sqlx::query_as::<_, DbLeague>("SELECT * FROM fantasy_leagues WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(league)
    }

    pub async fn find_by_invite_code(&self, code: &str) -> DbResult<Option<DbLeague>> {
        let league = sqlx::query_as::<_, DbLeague>("SELECT * FROM fantasy_leagues WHERE invite_code = $1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(league)
    }

    pub async fn list_for_account(&self, account_id: Uuid) -> DbResult<Vec<DbLeague>> {
        let leagues = sqlx::query_as::<_, DbLeague>(
            r#"
            SELECT l.* FROM fantasy_leagues l
            JOIN league_members m ON m.league_id = l.id
            WHERE m.account_id = $1
            ORDER BY l.created_at
            "#,
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(leagues)
    }

    /// Insert a member while holding the league row lock, so two joins can
    /// never both take the last seat
    pub async fn add_member(&self, member: &DbMembership, max_members: i32) -> DbResult<MemberInsert> {
        let mut tx = self.pool.begin().await?;

        let locked = sqlx::query_scalar::<_, Uuid>("SELECT id FROM fantasy_leagues WHERE id = $1 FOR UPDATE")
            .bind(member.league_id)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            return Ok(MemberInsert::LeagueMissing);
        }

        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM league_members WHERE league_id = $1 AND account_id = $2)",
        )
        .bind(member.league_id)
        .bind(member.account_id)
        .fetch_one(&mut *tx)
        .await?;
        if exists {
            return Ok(MemberInsert::AlreadyMember);
        }

        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM league_members WHERE league_id = $1")
            .bind(member.league_id)
            .fetch_one(&mut *tx)
            .await?;
        if count >= i64::from(max_members) {
            return Ok(MemberInsert::Full);
        }

        sqlx::query(
            r#"
            INSERT INTO league_members (league_id, account_id, username, baseline_value, starting_value,
                current_value, rank, joined_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(member.league_id)
        .bind(member.account_id)
        .bind(&member.username)
        .bind(member.baseline_value)
        .bind(member.starting_value)
        .bind(member.current_value)
        .bind(member.rank)
        .bind(member.joined_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(MemberInsert::Added)
    }

    pub async fn members(&self, league_id: Uuid) -> DbResult<Vec<DbMembership>> {
        let members = sqlx::query_as::<_, DbMembership>(
            "SELECT * FROM league_members WHERE league_id = $1 ORDER BY rank ASC NULLS LAST, joined_at",
        )
        .bind(league_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(members)
    }

    /// Write every member's value and rank in one transaction
    pub async fn save_standings(&self, league_id: Uuid, standings: &[(Uuid, Decimal, i32)]) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;
        for (account_id, current_value, rank) in standings {
            sqlx::query(
                "UPDATE league_members SET current_value = $3, rank = $4 WHERE league_id = $1 AND account_id = $2",
            )
            .bind(league_id)
            .bind(account_id)
            .bind(current_value)
            .bind(rank)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}
