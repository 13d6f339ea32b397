//! Scheduled job DTOs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tradeleague_arena::{RatingRunSummary, RotationOutcome};
use utoipa::ToSchema;
use uuid::Uuid;

/// Weekly rating run result
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RatingUpdateResponse {
    /// ISO week processed, e.g. `2026-W42`
    pub period: String,
    pub processed: u32,
    pub promotions: u32,
    pub relegations: u32,
    pub unchanged: u32,
    /// Accounts an interrupted run had already rated
    pub skipped: u32,
    pub failed: u32,
    /// `true` when an interrupted run was picked up again
    pub resumed: bool,
}

impl From<RatingRunSummary> for RatingUpdateResponse {
    fn from(s: RatingRunSummary) -> Self {
        Self {
            period: s.period,
            processed: s.processed,
            promotions: s.promotions,
            relegations: s.relegations,
            unchanged: s.unchanged,
            skipped: s.skipped,
            failed: s.failed,
            resumed: s.resumed,
        }
    }
}

/// Season rotation result
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SeasonResetResponse {
    pub rotation_key: String,
    pub archived_season: u32,
    pub winner_account_id: Option<Uuid>,
    pub winner_username: Option<String>,
    #[schema(value_type = Option<String>)]
    pub winning_pnl: Option<Decimal>,
    pub participant_count: u64,
    pub next_season: u32,
    /// `true` when an interrupted rotation was completed
    pub resumed: bool,
}

impl From<RotationOutcome> for SeasonResetResponse {
    fn from(o: RotationOutcome) -> Self {
        Self {
            rotation_key: o.archive.rotation_key,
            archived_season: o.archive.season_number,
            winner_account_id: o.archive.winner_account_id.map(|id| id.into_uuid()),
            winner_username: o.archive.winner_username,
            winning_pnl: o.archive.winning_pnl,
            participant_count: o.archive.participant_count,
            next_season: o.next_season.number,
            resumed: o.resumed,
        }
    }
}
