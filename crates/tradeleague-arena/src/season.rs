//! # Season Rotation
//!
//! One versioned season record exists for the whole system. A rotation
//! archives the season leaderboard, resets every account's season
//! accumulators and opens the next season:
//!
//! ```text
//! Active ──begin──▶ Archiving ──▶ Archived ──▶ Resetting ──▶ Active (n+1)
//! ```
//!
//! Each rotation carries a key (by default the ISO week it runs in). A key
//! that already completed is rejected, and a rotation interrupted after
//! `begin` resumes when retried with the same key.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tradeleague_types::{AccountId, ArchiveId};

use crate::error::{ArenaError, ArenaResult};
use crate::models::Account;
use crate::store::ArenaStore;

// ============================================================================
// Season State Machine
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeasonState {
    /// Trading counts toward the season
    Active,
    /// Leaderboard is being frozen
    Archiving,
    /// Archive written
    Archived,
    /// Accounts are being reset
    Resetting,
}

impl SeasonState {
    /// Get valid next states
    pub fn valid_transitions(&self) -> Vec<SeasonState> {
        match self {
            Self::Active => vec![Self::Archiving],
            Self::Archiving => vec![Self::Archived],
            Self::Archived => vec![Self::Resetting],
            Self::Resetting => vec![Self::Active],
        }
    }

    /// Check if transition to target state is valid
    pub fn can_transition_to(&self, target: SeasonState) -> bool {
        self.valid_transitions().contains(&target)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Archiving => "archiving",
            Self::Archived => "archived",
            Self::Resetting => "resetting",
        }
    }
}

impl fmt::Display for SeasonState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeasonState {
    type Err = ArenaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "archiving" => Ok(Self::Archiving),
            "archived" => Ok(Self::Archived),
            "resetting" => Ok(Self::Resetting),
            other => Err(ArenaError::Storage(format!("unknown season state {}", other))),
        }
    }
}

/// The system-wide season record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentSeason {
    pub number: u32,
    pub state: SeasonState,
    pub started_at: DateTime<Utc>,
    /// Bumped on every state change
    pub version: u64,
    pub in_flight_key: Option<String>,
    pub last_completed_key: Option<String>,
}

impl CurrentSeason {
    /// Season 1, active from `now`
    pub fn first(now: DateTime<Utc>) -> Self {
        Self {
            number: 1,
            state: SeasonState::Active,
            started_at: now,
            version: 0,
            in_flight_key: None,
            last_completed_key: None,
        }
    }

    /// Transition to a new state
    pub fn transition_to(&mut self, new_state: SeasonState) -> ArenaResult<()> {
        if !self.state.can_transition_to(new_state) {
            return Err(ArenaError::InvalidStateTransition {
                from: self.state.to_string(),
                to: new_state.to_string(),
            });
        }
        self.state = new_state;
        self.version += 1;
        Ok(())
    }

    /// Active -> Archiving under `rotation_key`
    pub fn begin(&mut self, rotation_key: &str) -> ArenaResult<()> {
        self.transition_to(SeasonState::Archiving)?;
        self.in_flight_key = Some(rotation_key.to_string());
        Ok(())
    }

    /// Archiving -> Archived -> Resetting -> Active, opening the next season
    pub fn advance(&mut self, now: DateTime<Utc>) -> ArenaResult<()> {
        self.transition_to(SeasonState::Archived)?;
        self.transition_to(SeasonState::Resetting)?;
        self.transition_to(SeasonState::Active)?;
        self.number += 1;
        self.started_at = now;
        self.last_completed_key = self.in_flight_key.take();
        Ok(())
    }
}

// ============================================================================
// Season Archive
// ============================================================================

/// One row of the season leaderboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonLeaderboardEntry {
    pub rank: u32,
    pub account_id: AccountId,
    pub username: String,
    pub season_pnl: Decimal,
}

/// Frozen record of a completed season
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonArchive {
    pub id: ArchiveId,
    pub season_number: u32,
    pub winner_account_id: Option<AccountId>,
    pub winner_username: Option<String>,
    pub winning_pnl: Option<Decimal>,
    pub participant_count: u64,
    pub leaderboard: Vec<SeasonLeaderboardEntry>,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub rotation_key: String,
}

impl SeasonArchive {
    /// Archive for `season` ending at `ended_at`. The top entrant wins only
    /// with a positive season P&L.
    pub fn build(
        season: &CurrentSeason,
        leaderboard: Vec<SeasonLeaderboardEntry>,
        participant_count: u64,
        ended_at: DateTime<Utc>,
        rotation_key: &str,
    ) -> Self {
        let winner = leaderboard
            .first()
            .filter(|top| top.season_pnl > Decimal::ZERO)
            .cloned();
        Self {
            id: ArchiveId::new(),
            season_number: season.number,
            winner_account_id: winner.as_ref().map(|w| w.account_id),
            winner_username: winner.as_ref().map(|w| w.username.clone()),
            winning_pnl: winner.map(|w| w.season_pnl),
            participant_count,
            leaderboard,
            started_at: season.started_at,
            ended_at,
            rotation_key: rotation_key.to_string(),
        }
    }
}

/// Reset one account's season accumulators
pub fn reset_account_season(account: &mut Account) {
    if account.season_pnl > account.best_season_pnl {
        account.best_season_pnl = account.season_pnl;
    }
    account.season_pnl = Decimal::ZERO;
    account.season += 1;
}

// ============================================================================
// Rotation Service
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RotationOutcome {
    pub archive: SeasonArchive,
    pub next_season: CurrentSeason,
    /// `true` when an interrupted rotation was completed
    pub resumed: bool,
}

#[derive(Clone)]
pub struct SeasonRotation {
    store: Arc<dyn ArenaStore>,
    leaderboard_size: usize,
}

impl SeasonRotation {
    pub fn new(store: Arc<dyn ArenaStore>, leaderboard_size: usize) -> Self {
        Self {
            store,
            leaderboard_size,
        }
    }

    pub async fn current(&self) -> ArenaResult<CurrentSeason> {
        self.store.current_season().await
    }

    /// Rotate the season under `rotation_key`
    pub async fn rotate(&self, rotation_key: &str, now: DateTime<Utc>) -> ArenaResult<RotationOutcome> {
        let rotation_key = rotation_key.trim();
        if rotation_key.is_empty() {
            return Err(ArenaError::Validation("rotation key must not be empty".into()));
        }

        let season = self.store.current_season().await?;
        if season.last_completed_key.as_deref() == Some(rotation_key) {
            return Err(ArenaError::AlreadyRotated {
                key: rotation_key.to_string(),
            });
        }

        let in_flight_key = season.in_flight_key.clone();
        let (season, resumed) = match (season.state, in_flight_key.as_deref()) {
            (SeasonState::Active, _) => (self.store.begin_rotation(season.version, rotation_key).await?, false),
            (_, Some(key)) if key == rotation_key => {
                tracing::warn!(season = season.number, key, "Resuming interrupted season rotation");
                (season, true)
            }
            (_, in_flight) => {
                return Err(ArenaError::RotationInProgress {
                    key: in_flight.unwrap_or_default().to_string(),
                })
            }
        };

        let leaderboard = self.store.season_leaderboard(self.leaderboard_size).await?;
        let participants = self.store.participant_count().await?;
        let archive = SeasonArchive::build(&season, leaderboard, participants, now, rotation_key);
        let next_season = self.store.finish_rotation(&archive, season.version, now).await?;

        tracing::info!(
            season = archive.season_number,
            next = next_season.number,
            winner = ?archive.winner_username,
            participants,
            "Season rotated"
        );
        Ok(RotationOutcome {
            archive,
            next_season,
            resumed,
        })
    }

    pub async fn archives(&self, limit: u32) -> ArenaResult<Vec<SeasonArchive>> {
        self.store.archives(limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn entry(rank: u32, pnl: Decimal) -> SeasonLeaderboardEntry {
        SeasonLeaderboardEntry {
            rank,
            account_id: AccountId::new(),
            username: format!("trader{}", rank),
            season_pnl: pnl,
        }
    }

    #[test]
    fn test_state_machine() {
        let mut season = CurrentSeason::first(Utc::now());
        assert!(season.transition_to(SeasonState::Resetting).is_err());

        season.begin("2026-W42").unwrap();
        assert_eq!(season.state, SeasonState::Archiving);
        assert_eq!(season.version, 1);

        assert!(season.begin("2026-W42").is_err());

        let later = Utc::now();
        season.advance(later).unwrap();
        assert_eq!(season.state, SeasonState::Active);
        assert_eq!(season.number, 2);
        assert_eq!(season.started_at, later);
        assert_eq!(season.version, 4);
        assert_eq!(season.in_flight_key, None);
        assert_eq!(season.last_completed_key.as_deref(), Some("2026-W42"));
    }

    #[test]
    fn test_advance_requires_archiving() {
        let mut season = CurrentSeason::first(Utc::now());
        assert!(matches!(
            season.advance(Utc::now()),
            Err(ArenaError::InvalidStateTransition { .. })
        ));
    }

    #[test]
    fn test_archive_winner_requires_positive_pnl() {
        let season = CurrentSeason::first(Utc::now());
        let archive = SeasonArchive::build(&season, vec![entry(1, dec!(420)), entry(2, dec!(10))], 7, Utc::now(), "k");
        assert_eq!(archive.winner_username.as_deref(), Some("trader1"));
        assert_eq!(archive.winning_pnl, Some(dec!(420)));
        assert_eq!(archive.participant_count, 7);

        let archive = SeasonArchive::build(&season, vec![entry(1, dec!(0)), entry(2, dec!(-50))], 2, Utc::now(), "k");
        assert!(archive.winner_account_id.is_none());
        assert!(archive.winning_pnl.is_none());

        let archive = SeasonArchive::build(&season, vec![], 0, Utc::now(), "k");
        assert!(archive.winner_account_id.is_none());
    }

    #[test]
    fn test_reset_account_season() {
        let mut account = Account::new(AccountId::new(), "ada", dec!(100000), Utc::now());
        account.season_pnl = dec!(250);
        account.best_season_pnl = dec!(100);
        reset_account_season(&mut account);
        assert_eq!(account.best_season_pnl, dec!(250));
        assert_eq!(account.season_pnl, dec!(0));
        assert_eq!(account.season, 2);

        account.season_pnl = dec!(-30);
        reset_account_season(&mut account);
        assert_eq!(account.best_season_pnl, dec!(250));
        assert_eq!(account.season, 3);
    }

    #[test]
    fn test_state_round_trips_through_label() {
        for state in [SeasonState::Active, SeasonState::Archiving, SeasonState::Archived, SeasonState::Resetting] {
            assert_eq!(state.as_str().parse::<SeasonState>().unwrap(), state);
        }
    }
}
