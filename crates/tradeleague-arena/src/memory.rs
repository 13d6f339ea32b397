//! In-memory store
//!
//! Every method runs under one write lock, which makes each trait method
//! trivially atomic. Used by tests and by the server's `memory` backend.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use tradeleague_types::{AccountId, LeagueId, LotId};

use crate::error::{ArenaError, ArenaResult};
use crate::leagues::{FantasyLeague, LeagueMembership, MemberStanding};
use crate::models::{Account, Holding, LedgerEntry, LotChange, TradeCommit};
use crate::notifications::Notification;
use crate::season::{reset_account_season, CurrentSeason, SeasonArchive, SeasonLeaderboardEntry};
use crate::store::{AccountStore, JobClaim, JobStore, LeagueStore, NotificationStore, SeasonStore};

struct MemoryState {
    accounts: HashMap<AccountId, Account>,
    /// Insertion order, for deterministic iteration
    account_order: Vec<AccountId>,
    holdings: HashMap<LotId, Holding>,
    ledger: Vec<LedgerEntry>,
    snapshots: HashMap<(AccountId, String), Decimal>,
    leagues: HashMap<LeagueId, FantasyLeague>,
    memberships: HashMap<LeagueId, Vec<LeagueMembership>>,
    season: CurrentSeason,
    archives: Vec<SeasonArchive>,
    jobs: HashMap<(String, String), Option<serde_json::Value>>,
    notifications: Vec<Notification>,
    fail_rating_writes: bool,
}

/// Arena store backed by process memory
pub struct InMemoryArenaStore {
    state: RwLock<MemoryState>,
}

impl InMemoryArenaStore {
    pub fn new() -> Self {
        Self::with_season(CurrentSeason::first(Utc::now()))
    }

    /// Start from an explicit season record
    pub fn with_season(season: CurrentSeason) -> Self {
        Self {
            state: RwLock::new(MemoryState {
                accounts: HashMap::new(),
                account_order: Vec::new(),
                holdings: HashMap::new(),
                ledger: Vec::new(),
                snapshots: HashMap::new(),
                leagues: HashMap::new(),
                memberships: HashMap::new(),
                season,
                archives: Vec::new(),
                jobs: HashMap::new(),
                notifications: Vec::new(),
                fail_rating_writes: false,
            }),
        }
    }

    /// Overwrite season accumulators directly (fixtures)
    pub fn set_season_pnl(&self, id: AccountId, season_pnl: Decimal) -> ArenaResult<()> {
        let mut state = self.state.write();
        let account = state.accounts.get_mut(&id).ok_or(ArenaError::AccountNotFound(id))?;
        account.season_pnl = season_pnl;
        Ok(())
    }

    /// Make `apply_rating` fail with a storage error (fixtures)
    pub fn fail_rating_writes(&self, failing: bool) {
        self.state.write().fail_rating_writes = failing;
    }

    /// Every stored notification, oldest first
    pub fn all_notifications(&self) -> Vec<Notification> {
        self.state.read().notifications.clone()
    }
}

impl Default for InMemoryArenaStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccountStore for InMemoryArenaStore {
    async fn ensure_account(&self, account: Account) -> ArenaResult<Account> {
        let mut state = self.state.write();
        if let Some(existing) = state.accounts.get(&account.id) {
            return Ok(existing.clone());
        }
        state.account_order.push(account.id);
        state.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn account(&self, id: AccountId) -> ArenaResult<Account> {
        self.state
            .read()
            .accounts
            .get(&id)
            .cloned()
            .ok_or(ArenaError::AccountNotFound(id))
    }

    async fn account_ids(&self) -> ArenaResult<Vec<AccountId>> {
        Ok(self.state.read().account_order.clone())
    }

    async fn holdings(&self, id: AccountId) -> ArenaResult<Vec<Holding>> {
        let state = self.state.read();
        let mut holdings: Vec<Holding> = state
            .holdings
            .values()
            .filter(|h| h.account_id == id)
            .cloned()
            .collect();
        holdings.sort_by_key(|h| h.acquired_at);
        Ok(holdings)
    }

    async fn holding(&self, lot_id: LotId) -> ArenaResult<Option<Holding>> {
        Ok(self.state.read().holdings.get(&lot_id).cloned())
    }

    async fn realized_pnl_total(&self, id: AccountId) -> ArenaResult<Decimal> {
        Ok(self
            .state
            .read()
            .ledger
            .iter()
            .filter(|e| e.account_id == id)
            .map(|e| e.realized_pnl)
            .sum())
    }

    async fn transactions(&self, id: AccountId, limit: u32, offset: u32) -> ArenaResult<Vec<LedgerEntry>> {
        Ok(self
            .state
            .read()
            .ledger
            .iter()
            .rev()
            .filter(|e| e.account_id == id)
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn commit_trade(&self, commit: TradeCommit) -> ArenaResult<Account> {
        let mut state = self.state.write();
        let version = state
            .accounts
            .get(&commit.account_id)
            .map(|a| a.version)
            .ok_or(ArenaError::AccountNotFound(commit.account_id))?;
        if version != commit.expected_version {
            return Err(ArenaError::ConcurrentModification);
        }

        let owned_lot = |state: &MemoryState, lot_id: &LotId| {
            state
                .holdings
                .get(lot_id)
                .filter(|h| h.account_id == commit.account_id)
                .is_some()
        };
        match &commit.lot_change {
            LotChange::Open(holding) => {
                state.holdings.insert(holding.lot_id, holding.clone());
            }
            LotChange::Reduce { lot_id, remaining } => {
                if !owned_lot(&*state, lot_id) {
                    return Err(ArenaError::InvalidLot(lot_id.to_string()));
                }
                if let Some(h) = state.holdings.get_mut(lot_id) {
                    h.quantity = *remaining;
                }
            }
            LotChange::Close { lot_id } => {
                if !owned_lot(&*state, lot_id) {
                    return Err(ArenaError::InvalidLot(lot_id.to_string()));
                }
                state.holdings.remove(lot_id);
            }
        }

        state.ledger.push(commit.entry);
        let account = state
            .accounts
            .get_mut(&commit.account_id)
            .ok_or(ArenaError::AccountNotFound(commit.account_id))?;
        account.season_pnl += commit.season_pnl_delta;
        account.xp += commit.xp_delta;
        account.version += 1;
        Ok(account.clone())
    }

    async fn add_xp(&self, id: AccountId, amount: i64) -> ArenaResult<Account> {
        let mut state = self.state.write();
        let account = state.accounts.get_mut(&id).ok_or(ArenaError::AccountNotFound(id))?;
        account.xp = account.xp.saturating_add(amount);
        Ok(account.clone())
    }

    async fn balance_snapshot(&self, id: AccountId, period: &str) -> ArenaResult<Option<Decimal>> {
        Ok(self.state.read().snapshots.get(&(id, period.to_string())).copied())
    }

    async fn apply_rating(&self, id: AccountId, rating: i64, snapshot_period: &str, total: Decimal) -> ArenaResult<bool> {
        let mut state = self.state.write();
        if state.fail_rating_writes {
            return Err(ArenaError::Storage("rating write rejected".into()));
        }
        let key = (id, snapshot_period.to_string());
        if state.snapshots.contains_key(&key) {
            return Ok(false);
        }
        let account = state.accounts.get_mut(&id).ok_or(ArenaError::AccountNotFound(id))?;
        account.rating = rating;
        state.snapshots.insert(key, total);
        Ok(true)
    }
}

#[async_trait]
impl LeagueStore for InMemoryArenaStore {
    async fn insert_league(&self, league: FantasyLeague) -> ArenaResult<()> {
        let mut state = self.state.write();
        if state.leagues.values().any(|l| l.invite_code == league.invite_code) {
            return Err(ArenaError::InviteCodeTaken);
        }
        state.memberships.insert(league.id, Vec::new());
        state.leagues.insert(league.id, league);
        Ok(())
    }

    async fn league(&self, id: LeagueId) -> ArenaResult<Option<FantasyLeague>> {
        Ok(self.state.read().leagues.get(&id).cloned())
    }

    async fn league_by_invite_code(&self, code: &str) -> ArenaResult<Option<FantasyLeague>> {
        Ok(self
            .state
            .read()
            .leagues
            .values()
            .find(|l| l.invite_code == code)
            .cloned())
    }

    async fn add_member(&self, membership: LeagueMembership, max_members: u32) -> ArenaResult<()> {
        let mut state = self.state.write();
        let members = state
            .memberships
            .get_mut(&membership.league_id)
            .ok_or_else(|| ArenaError::LeagueNotFound(membership.league_id.to_string()))?;
        if members.iter().any(|m| m.account_id == membership.account_id) {
            return Err(ArenaError::AlreadyMember);
        }
        if members.len() as u32 >= max_members {
            return Err(ArenaError::LeagueFull { max: max_members });
        }
        members.push(membership);
        Ok(())
    }

    async fn members(&self, league_id: LeagueId) -> ArenaResult<Vec<LeagueMembership>> {
        let mut members = self
            .state
            .read()
            .memberships
            .get(&league_id)
            .cloned()
            .unwrap_or_default();
        members.sort_by_key(|m| (m.rank.unwrap_or(u32::MAX), m.joined_at));
        Ok(members)
    }

    async fn leagues_for_account(&self, id: AccountId) -> ArenaResult<Vec<FantasyLeague>> {
        let state = self.state.read();
        let mut leagues: Vec<FantasyLeague> = state
            .memberships
            .iter()
            .filter(|(_, members)| members.iter().any(|m| m.account_id == id))
            .filter_map(|(league_id, _)| state.leagues.get(league_id).cloned())
            .collect();
        leagues.sort_by_key(|l| l.created_at);
        Ok(leagues)
    }

    async fn save_standings(&self, league_id: LeagueId, standings: &[MemberStanding]) -> ArenaResult<()> {
        let mut state = self.state.write();
        let members = state
            .memberships
            .get_mut(&league_id)
            .ok_or_else(|| ArenaError::LeagueNotFound(league_id.to_string()))?;
        for standing in standings {
            if let Some(m) = members.iter_mut().find(|m| m.account_id == standing.account_id) {
                m.current_value = standing.current_value;
                m.rank = Some(standing.rank);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl SeasonStore for InMemoryArenaStore {
    async fn current_season(&self) -> ArenaResult<CurrentSeason> {
        Ok(self.state.read().season.clone())
    }

    async fn begin_rotation(&self, expected_version: u64, rotation_key: &str) -> ArenaResult<CurrentSeason> {
        let mut state = self.state.write();
        if state.archives.iter().any(|a| a.rotation_key == rotation_key) {
            return Err(ArenaError::AlreadyRotated {
                key: rotation_key.to_string(),
            });
        }
        if state.season.version != expected_version {
            return Err(ArenaError::ConcurrentModification);
        }
        state.season.begin(rotation_key)?;
        Ok(state.season.clone())
    }

    async fn season_leaderboard(&self, limit: usize) -> ArenaResult<Vec<SeasonLeaderboardEntry>> {
        let state = self.state.read();
        let mut accounts: Vec<&Account> = state
            .account_order
            .iter()
            .filter_map(|id| state.accounts.get(id))
            .collect();
        accounts.sort_by(|a, b| b.season_pnl.cmp(&a.season_pnl));
        Ok(accounts
            .into_iter()
            .take(limit)
            .enumerate()
            .map(|(i, a)| SeasonLeaderboardEntry {
                rank: i as u32 + 1,
                account_id: a.id,
                username: a.username.clone(),
                season_pnl: a.season_pnl,
            })
            .collect())
    }

    async fn participant_count(&self) -> ArenaResult<u64> {
        Ok(self.state.read().accounts.len() as u64)
    }

    async fn finish_rotation(
        &self,
        archive: &SeasonArchive,
        expected_version: u64,
        now: DateTime<Utc>,
    ) -> ArenaResult<CurrentSeason> {
        let mut state = self.state.write();
        if state.season.version != expected_version {
            return Err(ArenaError::ConcurrentModification);
        }
        if state
            .archives
            .iter()
            .any(|a| a.season_number == archive.season_number || a.rotation_key == archive.rotation_key)
        {
            return Err(ArenaError::AlreadyRotated {
                key: archive.rotation_key.clone(),
            });
        }

        let mut season = state.season.clone();
        season.advance(now)?;

        state.archives.push(archive.clone());
        for account in state.accounts.values_mut() {
            reset_account_season(account);
        }
        state.season = season.clone();
        Ok(season)
    }

    async fn archives(&self, limit: u32) -> ArenaResult<Vec<SeasonArchive>> {
        Ok(self
            .state
            .read()
            .archives
            .iter()
            .rev()
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl JobStore for InMemoryArenaStore {
    async fn claim_job(&self, job: &str, period: &str) -> ArenaResult<JobClaim> {
        let mut state = self.state.write();
        let key = (job.to_string(), period.to_string());
        Ok(match state.jobs.get(&key) {
            Some(Some(_)) => JobClaim::Completed,
            Some(None) => JobClaim::Resumed,
            None => {
                state.jobs.insert(key, None);
                JobClaim::Claimed
            }
        })
    }

    async fn complete_job(&self, job: &str, period: &str, summary: serde_json::Value) -> ArenaResult<()> {
        self.state
            .write()
            .jobs
            .insert((job.to_string(), period.to_string()), Some(summary));
        Ok(())
    }
}

#[async_trait]
impl NotificationStore for InMemoryArenaStore {
    async fn publish(&self, notification: Notification) -> ArenaResult<()> {
        self.state.write().notifications.push(notification);
        Ok(())
    }

    async fn notifications(&self, id: AccountId, limit: u32) -> ArenaResult<Vec<Notification>> {
        Ok(self
            .state
            .read()
            .notifications
            .iter()
            .rev()
            .filter(|n| n.account_id == id)
            .take(limit as usize)
            .cloned()
            .collect())
    }
}
