//! Season and tier DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tradeleague_arena::season::SeasonLeaderboardEntry;
use tradeleague_arena::{CurrentSeason, LeagueTier, SeasonArchive};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LeaderboardEntryInfo {
    pub rank: u32,
    pub account_id: Uuid,
    pub username: String,
    #[schema(value_type = String)]
    pub season_pnl: Decimal,
}

impl From<SeasonLeaderboardEntry> for LeaderboardEntryInfo {
    fn from(e: SeasonLeaderboardEntry) -> Self {
        Self {
            rank: e.rank,
            account_id: e.account_id.into_uuid(),
            username: e.username,
            season_pnl: e.season_pnl,
        }
    }
}

/// A completed season
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SeasonArchiveInfo {
    pub id: Uuid,
    pub season_number: u32,
    /// Absent when nobody finished with a positive P&L
    pub winner_account_id: Option<Uuid>,
    pub winner_username: Option<String>,
    #[schema(value_type = Option<String>)]
    pub winning_pnl: Option<Decimal>,
    pub participant_count: u64,
    pub leaderboard: Vec<LeaderboardEntryInfo>,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

impl From<SeasonArchive> for SeasonArchiveInfo {
    fn from(a: SeasonArchive) -> Self {
        Self {
            id: a.id.into_uuid(),
            season_number: a.season_number,
            winner_account_id: a.winner_account_id.map(|id| id.into_uuid()),
            winner_username: a.winner_username,
            winning_pnl: a.winning_pnl,
            participant_count: a.participant_count,
            leaderboard: a.leaderboard.into_iter().map(LeaderboardEntryInfo::from).collect(),
            started_at: a.started_at,
            ended_at: a.ended_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ArchivesQuery {
    #[serde(default = "default_archive_limit")]
    #[validate(range(min = 1, max = 50))]
    pub limit: u32,
}

fn default_archive_limit() -> u32 {
    10
}

/// The running season
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CurrentSeasonInfo {
    pub number: u32,
    /// `active` unless a rotation is under way
    pub state: String,
    pub started_at: DateTime<Utc>,
}

impl From<CurrentSeason> for CurrentSeasonInfo {
    fn from(s: CurrentSeason) -> Self {
        Self {
            number: s.number,
            state: s.state.as_str().to_string(),
            started_at: s.started_at,
        }
    }
}

/// One tier band
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TierInfo {
    pub name: String,
    pub min_rating: i64,
    /// Absent for the open-ended top tier
    pub max_rating: Option<i64>,
    pub color: String,
}

impl From<LeagueTier> for TierInfo {
    fn from(t: LeagueTier) -> Self {
        Self {
            name: t.display_name().to_string(),
            // ratings never drop below zero
            min_rating: t.min_rating().max(0),
            max_rating: t.max_rating(),
            color: t.color().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_table_is_contiguous() {
        let tiers: Vec<TierInfo> = LeagueTier::ALL.into_iter().map(TierInfo::from).collect();
        assert_eq!(tiers[0].min_rating, 0);
        for pair in tiers.windows(2) {
            assert_eq!(pair[0].max_rating, Some(pair[1].min_rating - 1));
        }
        assert_eq!(tiers[4].name, "Diamond");
        assert_eq!(tiers[4].max_rating, None);
    }
}
