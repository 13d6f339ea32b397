//! PostgreSQL implementation of the arena store traits

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tradeleague_arena::leagues::{FantasyLeague, LeagueMembership, MemberStanding};
use tradeleague_arena::models::{Account, Holding, LedgerEntry, LotChange, TradeCommit};
use tradeleague_arena::notifications::Notification;
use tradeleague_arena::season::{CurrentSeason, SeasonArchive, SeasonLeaderboardEntry};
use tradeleague_arena::store::{AccountStore, JobClaim, JobStore, LeagueStore, NotificationStore, SeasonStore};
use tradeleague_arena::{ArenaError, ArenaResult};
use tradeleague_types::{AccountId, LeagueId, LotId};

use crate::error::DbError;
use crate::models::{DbAccount, DbHolding, DbLeague, DbMembership, DbNotification, DbSeason, DbSeasonArchive, DbTransaction};
use crate::repos::{AccountRepo, DbLotChange, JobRepo, LeagueRepo, MemberInsert, NotificationRepo, SeasonRepo};

/// Arena store over one PostgreSQL pool
pub struct PgArenaStore {
    accounts: AccountRepo,
    leagues: LeagueRepo,
    seasons: SeasonRepo,
    jobs: JobRepo,
    notifications: NotificationRepo,
}

impl PgArenaStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            accounts: AccountRepo::new(pool.clone()),
            leagues: LeagueRepo::new(pool.clone()),
            seasons: SeasonRepo::new(pool.clone()),
            jobs: JobRepo::new(pool.clone()),
            notifications: NotificationRepo::new(pool),
        }
    }
}

fn collect<R, T>(rows: Vec<R>) -> ArenaResult<Vec<T>>
where
    T: TryFrom<R, Error = DbError>,
{
    rows.into_iter()
        .map(|row| T::try_from(row).map_err(ArenaError::from))
        .collect()
}

fn as_bind(value: u32) -> i64 {
    i64::from(value)
}

#[async_trait]
impl AccountStore for PgArenaStore {
    async fn ensure_account(&self, account: Account) -> ArenaResult<Account> {
        let row = self.accounts.ensure(&DbAccount::from(&account)).await?;
        Ok(Account::try_from(row)?)
    }

    async fn account(&self, id: AccountId) -> ArenaResult<Account> {
        let row = self
            .accounts
            .find(id.into_uuid())
            .await?
            .ok_or(ArenaError::AccountNotFound(id))?;
        Ok(Account::try_from(row)?)
    }

    async fn account_ids(&self) -> ArenaResult<Vec<AccountId>> {
        let ids = self.accounts.list_ids().await?;
        Ok(ids.into_iter().map(AccountId::from_uuid).collect())
    }

    async fn holdings(&self, id: AccountId) -> ArenaResult<Vec<Holding>> {
        collect(self.accounts.holdings(id.into_uuid()).await?)
    }

    async fn holding(&self, lot_id: LotId) -> ArenaResult<Option<Holding>> {
        match self.accounts.holding(lot_id.into_uuid()).await? {
            Some(row) => Ok(Some(Holding::try_from(row)?)),
            None => Ok(None),
        }
    }

    async fn realized_pnl_total(&self, id: AccountId) -> ArenaResult<Decimal> {
        Ok(self.accounts.realized_pnl_total(id.into_uuid()).await?)
    }

    async fn transactions(&self, id: AccountId, limit: u32, offset: u32) -> ArenaResult<Vec<LedgerEntry>> {
        collect(
            self.accounts
                .transactions(id.into_uuid(), as_bind(limit), as_bind(offset))
                .await?,
        )
    }

    async fn commit_trade(&self, commit: TradeCommit) -> ArenaResult<Account> {
        let lot_change = match &commit.lot_change {
            LotChange::Open(h) => DbLotChange::Open(DbHolding::from(h)),
            LotChange::Reduce { lot_id, remaining } => DbLotChange::Reduce {
                lot_id: lot_id.into_uuid(),
                remaining: *remaining,
            },
            LotChange::Close { lot_id } => DbLotChange::Close {
                lot_id: lot_id.into_uuid(),
            },
        };
        let expected_version = i64::try_from(commit.expected_version).map_err(|_| ArenaError::ConcurrentModification)?;

        let result = self
            .accounts
            .commit_trade(
                commit.account_id.into_uuid(),
                expected_version,
                &lot_change,
                &DbTransaction::from(&commit.entry),
                commit.season_pnl_delta,
                commit.xp_delta,
            )
            .await;

        match result {
            Ok(row) => Ok(Account::try_from(row)?),
            Err(DbError::VersionConflict) => {
                // a missing account also matches zero rows
                self.account(commit.account_id).await?;
                Err(ArenaError::ConcurrentModification)
            }
            Err(DbError::NotFound(msg)) => Err(ArenaError::InvalidLot(msg)),
            Err(e) => Err(e.into()),
        }
    }

    async fn add_xp(&self, id: AccountId, amount: i64) -> ArenaResult<Account> {
        let row = self
            .accounts
            .add_xp(id.into_uuid(), amount)
            .await?
            .ok_or(ArenaError::AccountNotFound(id))?;
        Ok(Account::try_from(row)?)
    }

    async fn balance_snapshot(&self, id: AccountId, period: &str) -> ArenaResult<Option<Decimal>> {
        let snapshot = self.accounts.snapshot(id.into_uuid(), period).await?;
        Ok(snapshot.map(|s| s.total_value))
    }

    async fn apply_rating(&self, id: AccountId, rating: i64, snapshot_period: &str, total: Decimal) -> ArenaResult<bool> {
        match self.accounts.apply_rating(id.into_uuid(), rating, snapshot_period, total).await {
            Ok(applied) => Ok(applied),
            Err(DbError::NotFound(_)) => Err(ArenaError::AccountNotFound(id)),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl LeagueStore for PgArenaStore {
    async fn insert_league(&self, league: FantasyLeague) -> ArenaResult<()> {
        match self.leagues.create(&DbLeague::from(&league)).await {
            Ok(_) => Ok(()),
            Err(e) if e.unique_violation() == Some("fantasy_leagues_invite_code_key") => {
                Err(ArenaError::InviteCodeTaken)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn league(&self, id: LeagueId) -> ArenaResult<Option<FantasyLeague>> {
        match self.leagues.find(id.into_uuid()).await? {
            Some(row) => Ok(Some(FantasyLeague::try_from(row)?)),
            None => Ok(None),
        }
    }

    async fn league_by_invite_code(&self, code: &str) -> ArenaResult<Option<FantasyLeague>> {
        match self.leagues.find_by_invite_code(code).await? {
            Some(row) => Ok(Some(FantasyLeague::try_from(row)?)),
            None => Ok(None),
        }
    }

    async fn add_member(&self, membership: LeagueMembership, max_members: u32) -> ArenaResult<()> {
        let max = i32::try_from(max_members).unwrap_or(i32::MAX);
        match self.leagues.add_member(&DbMembership::from(&membership), max).await? {
            MemberInsert::Added => Ok(()),
            MemberInsert::LeagueMissing => Err(ArenaError::LeagueNotFound(membership.league_id.to_string())),
            MemberInsert::AlreadyMember => Err(ArenaError::AlreadyMember),
            MemberInsert::Full => Err(ArenaError::LeagueFull { max: max_members }),
        }
    }

    async fn members(&self, league_id: LeagueId) -> ArenaResult<Vec<LeagueMembership>> {
        collect(self.leagues.members(league_id.into_uuid()).await?)
    }

    async fn leagues_for_account(&self, id: AccountId) -> ArenaResult<Vec<FantasyLeague>> {
        collect(self.leagues.list_for_account(id.into_uuid()).await?)
    }

    async fn save_standings(&self, league_id: LeagueId, standings: &[MemberStanding]) -> ArenaResult<()> {
        let rows: Vec<_> = standings
            .iter()
            .map(|s| {
                (
                    s.account_id.into_uuid(),
                    s.current_value,
                    i32::try_from(s.rank).unwrap_or(i32::MAX),
                )
            })
            .collect();
        Ok(self.leagues.save_standings(league_id.into_uuid(), &rows).await?)
    }
}

#[async_trait]
impl SeasonStore for PgArenaStore {
    async fn current_season(&self) -> ArenaResult<CurrentSeason> {
        Ok(CurrentSeason::try_from(self.seasons.current().await?)?)
    }

    async fn begin_rotation(&self, expected_version: u64, rotation_key: &str) -> ArenaResult<CurrentSeason> {
        if self.seasons.archive_exists(rotation_key).await? {
            return Err(ArenaError::AlreadyRotated {
                key: rotation_key.to_string(),
            });
        }
        let mut season = self.current_season().await?;
        if season.version != expected_version {
            return Err(ArenaError::ConcurrentModification);
        }
        season.begin(rotation_key)?;
        self.seasons
            .update(&DbSeason::from(&season), i64::try_from(expected_version).unwrap_or(i64::MAX))
            .await?;
        Ok(season)
    }

    async fn season_leaderboard(&self, limit: usize) -> ArenaResult<Vec<SeasonLeaderboardEntry>> {
        let rows = self
            .accounts
            .season_leaderboard(i64::try_from(limit).unwrap_or(i64::MAX))
            .await?;
        Ok(rows
            .into_iter()
            .enumerate()
            .map(|(i, a)| SeasonLeaderboardEntry {
                rank: i as u32 + 1,
                account_id: AccountId::from_uuid(a.id),
                username: a.username,
                season_pnl: a.season_pnl,
            })
            .collect())
    }

    async fn participant_count(&self) -> ArenaResult<u64> {
        let count = self.accounts.count().await?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn finish_rotation(
        &self,
        archive: &SeasonArchive,
        expected_version: u64,
        now: DateTime<Utc>,
    ) -> ArenaResult<CurrentSeason> {
        let mut season = self.current_season().await?;
        if season.version != expected_version {
            return Err(ArenaError::ConcurrentModification);
        }
        season.advance(now)?;

        let row = DbSeasonArchive::try_from(archive)?;
        let expected = i64::try_from(expected_version).unwrap_or(i64::MAX);
        match self.seasons.finish_rotation(&row, &DbSeason::from(&season), expected).await {
            Ok(()) => Ok(season),
            Err(e) if e.unique_violation().is_some() => Err(ArenaError::AlreadyRotated {
                key: archive.rotation_key.clone(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn archives(&self, limit: u32) -> ArenaResult<Vec<SeasonArchive>> {
        collect(self.seasons.archives(as_bind(limit)).await?)
    }
}

#[async_trait]
impl JobStore for PgArenaStore {
    async fn claim_job(&self, job: &str, period: &str) -> ArenaResult<JobClaim> {
        if self.jobs.claim(job, period).await? {
            return Ok(JobClaim::Claimed);
        }
        let run = self
            .jobs
            .find(job, period)
            .await?
            .ok_or_else(|| ArenaError::Storage(format!("job run {}/{} vanished after claim", job, period)))?;
        Ok(if run.status == "completed" {
            JobClaim::Completed
        } else {
            JobClaim::Resumed
        })
    }

    async fn complete_job(&self, job: &str, period: &str, summary: serde_json::Value) -> ArenaResult<()> {
        Ok(self.jobs.complete(job, period, &summary).await?)
    }
}

#[async_trait]
impl NotificationStore for PgArenaStore {
    async fn publish(&self, notification: Notification) -> ArenaResult<()> {
        Ok(self.notifications.insert(&DbNotification::try_from(&notification)?).await?)
    }

    async fn notifications(&self, id: AccountId, limit: u32) -> ArenaResult<Vec<Notification>> {
        collect(self.notifications.list(id.into_uuid(), as_bind(limit)).await?)
    }
}
