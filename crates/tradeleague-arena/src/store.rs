//! Persistence seams
//!
//! Services never see SQL. They depend on these traits, implemented by
//! `InMemoryArenaStore` here and by the PostgreSQL store in `tradeleague-db`.
//! Every method that must be atomic says so; implementations are expected
//! to honour that with a lock or a database transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tradeleague_types::{AccountId, LeagueId, LotId};

use crate::error::ArenaResult;
use crate::leagues::{FantasyLeague, LeagueMembership, MemberStanding};
use crate::models::{Account, Holding, LedgerEntry, TradeCommit};
use crate::notifications::Notification;
use crate::season::{CurrentSeason, SeasonArchive, SeasonLeaderboardEntry};

/// Accounts, holdings, ledger and balance snapshots
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Create the account if it does not exist yet, returning the stored row
    async fn ensure_account(&self, account: Account) -> ArenaResult<Account>;

    /// Fetch an account, `AccountNotFound` if absent
    async fn account(&self, id: AccountId) -> ArenaResult<Account>;

    async fn account_ids(&self) -> ArenaResult<Vec<AccountId>>;

    async fn holdings(&self, id: AccountId) -> ArenaResult<Vec<Holding>>;

    async fn holding(&self, lot_id: LotId) -> ArenaResult<Option<Holding>>;

    /// Sum of realized P&L over every ledger entry of the account
    async fn realized_pnl_total(&self, id: AccountId) -> ArenaResult<Decimal>;

    /// Newest first
    async fn transactions(&self, id: AccountId, limit: u32, offset: u32) -> ArenaResult<Vec<LedgerEntry>>;

    /// Atomically apply a trade if the account version still equals
    /// `commit.expected_version`; otherwise `ConcurrentModification`.
    async fn commit_trade(&self, commit: TradeCommit) -> ArenaResult<Account>;

    /// Atomically increment XP
    async fn add_xp(&self, id: AccountId, amount: i64) -> ArenaResult<Account>;

    async fn balance_snapshot(&self, id: AccountId, period: &str) -> ArenaResult<Option<Decimal>>;

    /// Set the rating and insert the `snapshot_period` snapshot in one write.
    /// Returns `false` and changes nothing when that snapshot already exists.
    async fn apply_rating(&self, id: AccountId, rating: i64, snapshot_period: &str, total: Decimal) -> ArenaResult<bool>;
}

/// Fantasy leagues and their memberships
#[async_trait]
pub trait LeagueStore: Send + Sync {
    /// `InviteCodeTaken` when the code collides
    async fn insert_league(&self, league: FantasyLeague) -> ArenaResult<()>;

    async fn league(&self, id: LeagueId) -> ArenaResult<Option<FantasyLeague>>;

    async fn league_by_invite_code(&self, code: &str) -> ArenaResult<Option<FantasyLeague>>;

    /// Atomically add a member, enforcing the cap (`LeagueFull`) and
    /// uniqueness (`AlreadyMember`)
    async fn add_member(&self, membership: LeagueMembership, max_members: u32) -> ArenaResult<()>;

    /// Ordered by rank, then join time
    async fn members(&self, league_id: LeagueId) -> ArenaResult<Vec<LeagueMembership>>;

    async fn leagues_for_account(&self, id: AccountId) -> ArenaResult<Vec<FantasyLeague>>;

    async fn save_standings(&self, league_id: LeagueId, standings: &[MemberStanding]) -> ArenaResult<()>;
}

/// The versioned season singleton and its archives
#[async_trait]
pub trait SeasonStore: Send + Sync {
    async fn current_season(&self) -> ArenaResult<CurrentSeason>;

    /// Move Active -> Archiving if the season version still matches,
    /// recording `rotation_key` as in flight
    async fn begin_rotation(&self, expected_version: u64, rotation_key: &str) -> ArenaResult<CurrentSeason>;

    /// Top accounts by season P&L, descending
    async fn season_leaderboard(&self, limit: usize) -> ArenaResult<Vec<SeasonLeaderboardEntry>>;

    async fn participant_count(&self) -> ArenaResult<u64>;

    /// In one atomic step: insert the archive, reset every account's season
    /// accumulators, and advance the season record to the next Active season
    async fn finish_rotation(
        &self,
        archive: &SeasonArchive,
        expected_version: u64,
        now: DateTime<Utc>,
    ) -> ArenaResult<CurrentSeason>;

    /// Newest first
    async fn archives(&self, limit: u32) -> ArenaResult<Vec<SeasonArchive>>;
}

/// State of a `(job, period)` run as seen by the caller claiming it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobClaim {
    /// No run existed; this call created it
    Claimed,
    /// An earlier run started but never completed
    Resumed,
    Completed,
}

/// Claims that make scheduled batches run once per period
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn claim_job(&self, job: &str, period: &str) -> ArenaResult<JobClaim>;

    async fn complete_job(&self, job: &str, period: &str, summary: serde_json::Value) -> ArenaResult<()>;
}

/// Persisted notifications
#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn publish(&self, notification: Notification) -> ArenaResult<()>;

    /// Newest first
    async fn notifications(&self, id: AccountId, limit: u32) -> ArenaResult<Vec<Notification>>;
}

/// Everything the arena services need from storage
pub trait ArenaStore: AccountStore + LeagueStore + SeasonStore + JobStore + NotificationStore {}

impl<T> ArenaStore for T where T: AccountStore + LeagueStore + SeasonStore + JobStore + NotificationStore {}
