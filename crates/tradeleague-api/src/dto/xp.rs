//! XP award DTOs

use serde::{Deserialize, Serialize};
use tradeleague_arena::{XpAward, XpAwardOutcome, XpReason};
use utoipa::ToSchema;
use validator::Validate;

/// Grant XP for an activity
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct AwardXpRequest {
    /// Requested amount; capped server-side
    #[validate(range(min = 1))]
    pub amount: i64,
    /// Activity label, e.g. `post_published`
    #[validate(length(min = 1, max = 64))]
    pub reason: String,
}

impl AwardXpRequest {
    pub fn into_domain(self) -> XpAward {
        let reason = match self.reason.trim() {
            "trade_executed" => XpReason::TradeExecuted,
            "post_published" => XpReason::PostPublished,
            "comment_posted" => XpReason::CommentPosted,
            "challenge_completed" => XpReason::ChallengeCompleted,
            "daily_login" => XpReason::DailyLogin,
            other => XpReason::Custom(other.to_string()),
        };
        XpAward {
            amount: self.amount,
            reason,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AwardXpResponse {
    /// Amount granted after capping
    pub awarded: i64,
    pub total_xp: i64,
    pub level: u32,
    pub title: String,
    pub progress_percent: u8,
    pub leveled_up: bool,
}

impl From<XpAwardOutcome> for AwardXpResponse {
    fn from(o: XpAwardOutcome) -> Self {
        Self {
            awarded: o.awarded,
            total_xp: o.total_xp,
            level: o.progress.level,
            title: o.progress.title.display_name().to_string(),
            progress_percent: o.progress.progress_percent,
            leveled_up: o.leveled_up,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_reasons_map_to_variants() {
        let award = AwardXpRequest {
            amount: 25,
            reason: "post_published".into(),
        }
        .into_domain();
        assert_eq!(award.reason, XpReason::PostPublished);

        let custom = AwardXpRequest {
            amount: 5,
            reason: "streak_bonus".into(),
        }
        .into_domain();
        assert_eq!(custom.reason, XpReason::Custom("streak_bonus".into()));
    }

    #[test]
    fn test_non_positive_amount_fails_validation() {
        let req = AwardXpRequest {
            amount: 0,
            reason: "daily_login".into(),
        };
        assert!(req.validate().is_err());
    }
}
