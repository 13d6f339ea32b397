//! Database models - mapped from PostgreSQL tables
//!
//! Each row type converts into its arena record with `TryFrom`; text
//! columns holding symbols, currencies or states are re-validated on the
//! way out and surface as `DbError::Corrupt` when they do not parse.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tradeleague_arena::leagues::{FantasyLeague, LeagueMembership};
use tradeleague_arena::models::{Account, Holding, LedgerEntry};
use tradeleague_arena::notifications::{Notification, NotificationKind};
use tradeleague_arena::season::{CurrentSeason, SeasonArchive, SeasonLeaderboardEntry, SeasonState};
use tradeleague_types::{
    AccountId, ArchiveId, Currency, LeagueId, LotId, NotificationId, Symbol, TradeSide, TransactionId,
};
use uuid::Uuid;

use crate::error::{DbError, DbResult};

fn to_u32(value: i32, column: &str) -> DbResult<u32> {
    u32::try_from(value).map_err(|_| DbError::Corrupt(format!("{} = {} is negative", column, value)))
}

fn to_u64(value: i64, column: &str) -> DbResult<u64> {
    u64::try_from(value).map_err(|_| DbError::Corrupt(format!("{} = {} is negative", column, value)))
}

fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn symbol(raw: &str) -> DbResult<Symbol> {
    Symbol::new(raw).map_err(|e| DbError::Corrupt(e.to_string()))
}

fn currency(raw: &str) -> DbResult<Currency> {
    raw.parse().map_err(|e: tradeleague_types::TypesError| DbError::Corrupt(e.to_string()))
}

// ============================================================================
// Account Models
// ============================================================================

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbAccount {
    pub id: Uuid,
    pub username: String,
    pub xp: i64,
    pub rating: i64,
    pub season_pnl: Decimal,
    pub best_season_pnl: Decimal,
    pub season: i32,
    pub starting_capital: Decimal,
    pub version: i64,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<DbAccount> for Account {
    type Error = DbError;

    fn try_from(row: DbAccount) -> DbResult<Self> {
        Ok(Account {
            id: AccountId::from_uuid(row.id),
            username: row.username,
            xp: row.xp,
            rating: row.rating,
            season_pnl: row.season_pnl,
            best_season_pnl: row.best_season_pnl,
            season: to_u32(row.season, "accounts.season")?,
            starting_capital: row.starting_capital,
            version: to_u64(row.version, "accounts.version")?,
            created_at: row.created_at,
        })
    }
}

impl From<&Account> for DbAccount {
    fn from(a: &Account) -> Self {
        Self {
            id: a.id.into_uuid(),
            username: a.username.clone(),
            xp: a.xp,
            rating: a.rating,
            season_pnl: a.season_pnl,
            best_season_pnl: a.best_season_pnl,
            season: to_i32(a.season),
            starting_capital: a.starting_capital,
            version: to_i64(a.version),
            created_at: a.created_at,
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbHolding {
    pub lot_id: Uuid,
    pub account_id: Uuid,
    pub symbol: String,
    pub quantity: Decimal,
    pub acquisition_price: Decimal,
    pub currency: String,
    pub locked_until: Option<DateTime<Utc>>,
    pub acquired_at: DateTime<Utc>,
}

impl TryFrom<DbHolding> for Holding {
    type Error = DbError;

    fn try_from(row: DbHolding) -> DbResult<Self> {
        Ok(Holding {
            lot_id: LotId::from_uuid(row.lot_id),
            account_id: AccountId::from_uuid(row.account_id),
            symbol: symbol(&row.symbol)?,
            quantity: row.quantity,
            acquisition_price: row.acquisition_price,
            currency: currency(&row.currency)?,
            locked_until: row.locked_until,
            acquired_at: row.acquired_at,
        })
    }
}

impl From<&Holding> for DbHolding {
    fn from(h: &Holding) -> Self {
        Self {
            lot_id: h.lot_id.into_uuid(),
            account_id: h.account_id.into_uuid(),
            symbol: h.symbol.to_string(),
            quantity: h.quantity,
            acquisition_price: h.acquisition_price,
            currency: h.currency.to_string(),
            locked_until: h.locked_until,
            acquired_at: h.acquired_at,
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbTransaction {
    pub seq: i64,
    pub id: Uuid,
    pub account_id: Uuid,
    pub lot_id: Uuid,
    pub symbol: String,
    pub side: String,
    pub quantity: Decimal,
    pub price: Decimal,
    pub currency: String,
    pub fx_rate: Decimal,
    pub realized_pnl: Decimal,
    pub executed_at: DateTime<Utc>,
}

impl TryFrom<DbTransaction> for LedgerEntry {
    type Error = DbError;

    fn try_from(row: DbTransaction) -> DbResult<Self> {
        let side: TradeSide = row
            .side
            .parse()
            .map_err(|e: tradeleague_types::TypesError| DbError::Corrupt(e.to_string()))?;
        Ok(LedgerEntry {
            id: TransactionId::from_uuid(row.id),
            account_id: AccountId::from_uuid(row.account_id),
            lot_id: LotId::from_uuid(row.lot_id),
            symbol: symbol(&row.symbol)?,
            side,
            quantity: row.quantity,
            price: row.price,
            currency: currency(&row.currency)?,
            fx_rate: row.fx_rate,
            realized_pnl: row.realized_pnl,
            executed_at: row.executed_at,
        })
    }
}

/// `seq` is assigned by the database on insert
impl From<&LedgerEntry> for DbTransaction {
    fn from(e: &LedgerEntry) -> Self {
        Self {
            seq: 0,
            id: e.id.into_uuid(),
            account_id: e.account_id.into_uuid(),
            lot_id: e.lot_id.into_uuid(),
            symbol: e.symbol.to_string(),
            side: e.side.as_str().to_string(),
            quantity: e.quantity,
            price: e.price,
            currency: e.currency.to_string(),
            fx_rate: e.fx_rate,
            realized_pnl: e.realized_pnl,
            executed_at: e.executed_at,
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbBalanceSnapshot {
    pub account_id: Uuid,
    pub period: String,
    pub total_value: Decimal,
    pub recorded_at: DateTime<Utc>,
}

// ============================================================================
// League Models
// ============================================================================

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbLeague {
    pub id: Uuid,
    pub name: String,
    pub invite_code: String,
    pub owner_id: Uuid,
    pub starting_capital: Decimal,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub max_members: i32,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<DbLeague> for FantasyLeague {
    type Error = DbError;

    fn try_from(row: DbLeague) -> DbResult<Self> {
        Ok(FantasyLeague {
            id: LeagueId::from_uuid(row.id),
            name: row.name,
            invite_code: row.invite_code,
            owner_id: AccountId::from_uuid(row.owner_id),
            starting_capital: row.starting_capital,
            starts_at: row.starts_at,
            ends_at: row.ends_at,
            max_members: to_u32(row.max_members, "fantasy_leagues.max_members")?,
            created_at: row.created_at,
        })
    }
}

impl From<&FantasyLeague> for DbLeague {
    fn from(l: &FantasyLeague) -> Self {
        Self {
            id: l.id.into_uuid(),
            name: l.name.clone(),
            invite_code: l.invite_code.clone(),
            owner_id: l.owner_id.into_uuid(),
            starting_capital: l.starting_capital,
            starts_at: l.starts_at,
            ends_at: l.ends_at,
            max_members: to_i32(l.max_members),
            created_at: l.created_at,
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbMembership {
    pub league_id: Uuid,
    pub account_id: Uuid,
    pub username: String,
    pub baseline_value: Decimal,
    pub starting_value: Decimal,
    pub current_value: Decimal,
    pub rank: Option<i32>,
    pub joined_at: DateTime<Utc>,
}

impl TryFrom<DbMembership> for LeagueMembership {
    type Error = DbError;

    fn try_from(row: DbMembership) -> DbResult<Self> {
        Ok(LeagueMembership {
            league_id: LeagueId::from_uuid(row.league_id),
            account_id: AccountId::from_uuid(row.account_id),
            username: row.username,
            baseline_value: row.baseline_value,
            starting_value: row.starting_value,
            current_value: row.current_value,
            rank: row.rank.map(|r| to_u32(r, "league_members.rank")).transpose()?,
            joined_at: row.joined_at,
        })
    }
}

impl From<&LeagueMembership> for DbMembership {
    fn from(m: &LeagueMembership) -> Self {
        Self {
            league_id: m.league_id.into_uuid(),
            account_id: m.account_id.into_uuid(),
            username: m.username.clone(),
            baseline_value: m.baseline_value,
            starting_value: m.starting_value,
            current_value: m.current_value,
            rank: m.rank.map(to_i32),
            joined_at: m.joined_at,
        }
    }
}

// ============================================================================
// Season Models
// ============================================================================

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbSeason {
    pub number: i32,
    pub state: String,
    pub started_at: DateTime<Utc>,
    pub version: i64,
    pub in_flight_key: Option<String>,
    pub last_completed_key: Option<String>,
}

impl TryFrom<DbSeason> for CurrentSeason {
    type Error = DbError;

    fn try_from(row: DbSeason) -> DbResult<Self> {
        let state: SeasonState = row.state.parse().map_err(|_| DbError::Corrupt(format!("season state {}", row.state)))?;
        Ok(CurrentSeason {
            number: to_u32(row.number, "current_season.number")?,
            state,
            started_at: row.started_at,
            version: to_u64(row.version, "current_season.version")?,
            in_flight_key: row.in_flight_key,
            last_completed_key: row.last_completed_key,
        })
    }
}

impl From<&CurrentSeason> for DbSeason {
    fn from(s: &CurrentSeason) -> Self {
        Self {
            number: to_i32(s.number),
            state: s.state.as_str().to_string(),
            started_at: s.started_at,
            version: to_i64(s.version),
            in_flight_key: s.in_flight_key.clone(),
            last_completed_key: s.last_completed_key.clone(),
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbSeasonArchive {
    pub id: Uuid,
    pub season_number: i32,
    pub winner_account_id: Option<Uuid>,
    pub winner_username: Option<String>,
    pub winning_pnl: Option<Decimal>,
    pub participant_count: i64,
    pub leaderboard: serde_json::Value,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub rotation_key: String,
}

impl TryFrom<DbSeasonArchive> for SeasonArchive {
    type Error = DbError;

    fn try_from(row: DbSeasonArchive) -> DbResult<Self> {
        let leaderboard: Vec<SeasonLeaderboardEntry> = serde_json::from_value(row.leaderboard)?;
        Ok(SeasonArchive {
            id: ArchiveId::from_uuid(row.id),
            season_number: to_u32(row.season_number, "season_archives.season_number")?,
            winner_account_id: row.winner_account_id.map(AccountId::from_uuid),
            winner_username: row.winner_username,
            winning_pnl: row.winning_pnl,
            participant_count: to_u64(row.participant_count, "season_archives.participant_count")?,
            leaderboard,
            started_at: row.started_at,
            ended_at: row.ended_at,
            rotation_key: row.rotation_key,
        })
    }
}

impl TryFrom<&SeasonArchive> for DbSeasonArchive {
    type Error = DbError;

    fn try_from(a: &SeasonArchive) -> DbResult<Self> {
        Ok(Self {
            id: a.id.into_uuid(),
            season_number: to_i32(a.season_number),
            winner_account_id: a.winner_account_id.map(AccountId::into_uuid),
            winner_username: a.winner_username.clone(),
            winning_pnl: a.winning_pnl,
            participant_count: to_i64(a.participant_count),
            leaderboard: serde_json::to_value(&a.leaderboard)?,
            started_at: a.started_at,
            ended_at: a.ended_at,
            rotation_key: a.rotation_key.clone(),
        })
    }
}

// ============================================================================
// Jobs & Notifications
// ============================================================================

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbJobRun {
    pub job: String,
    pub period: String,
    pub status: String,
    pub summary: Option<serde_json::Value>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbNotification {
    pub id: Uuid,
    pub account_id: Uuid,
    pub kind: String,
    pub payload: serde_json::Value,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<DbNotification> for Notification {
    type Error = DbError;

    fn try_from(row: DbNotification) -> DbResult<Self> {
        let kind: NotificationKind = serde_json::from_value(row.payload)?;
        Ok(Notification {
            id: NotificationId::from_uuid(row.id),
            account_id: AccountId::from_uuid(row.account_id),
            kind,
            read: row.read,
            created_at: row.created_at,
        })
    }
}

impl TryFrom<&Notification> for DbNotification {
    type Error = DbError;

    fn try_from(n: &Notification) -> DbResult<Self> {
        Ok(Self {
            id: n.id.into_uuid(),
            account_id: n.account_id.into_uuid(),
            kind: n.kind.label().to_string(),
            payload: serde_json::to_value(&n.kind)?,
            read: n.read,
            created_at: n.created_at,
        })
    }
}
