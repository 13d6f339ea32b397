//! XP awards for social and trading activity

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tradeleague_types::AccountId;

use crate::error::{ArenaError, ArenaResult};
use crate::notifications::{publish_all, Notification, NotificationKind};
use crate::progression::{level_for_xp, LevelProgress};
use crate::store::ArenaStore;

/// Why XP was granted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum XpReason {
    TradeExecuted,
    PostPublished,
    CommentPosted,
    ChallengeCompleted,
    DailyLogin,
    Custom(String),
}

impl XpReason {
    pub fn label(&self) -> &str {
        match self {
            Self::TradeExecuted => "trade_executed",
            Self::PostPublished => "post_published",
            Self::CommentPosted => "comment_posted",
            Self::ChallengeCompleted => "challenge_completed",
            Self::DailyLogin => "daily_login",
            Self::Custom(reason) => reason,
        }
    }
}

/// Requested award
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XpAward {
    pub amount: i64,
    pub reason: XpReason,
}

/// Result of an award
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XpAwardOutcome {
    /// Amount actually granted after capping
    pub awarded: i64,
    pub total_xp: i64,
    pub progress: LevelProgress,
    pub leveled_up: bool,
}

/// Level-up notification if `before` and `after` straddle a threshold
pub(crate) fn level_up_notification(account_id: AccountId, before: i64, after: i64) -> Option<Notification> {
    let level = level_for_xp(after);
    (level > level_for_xp(before)).then(|| Notification::new(account_id, NotificationKind::LevelUp { level }))
}

#[derive(Clone)]
pub struct XpService {
    store: Arc<dyn ArenaStore>,
    max_award: i64,
}

impl XpService {
    pub fn new(store: Arc<dyn ArenaStore>, max_award: i64) -> Self {
        Self { store, max_award }
    }

    /// Grant XP, capping the amount at the configured maximum
    pub async fn award(&self, account_id: AccountId, award: XpAward) -> ArenaResult<XpAwardOutcome> {
        if award.amount <= 0 {
            return Err(ArenaError::Validation("XP amount must be positive".into()));
        }
        let awarded = award.amount.min(self.max_award);
        if awarded < award.amount {
            tracing::info!(%account_id, requested = award.amount, awarded, "XP award capped");
        }

        let account = self.store.add_xp(account_id, awarded).await?;
        let before = account.xp - awarded;
        let notification = level_up_notification(account_id, before, account.xp);
        let leveled_up = notification.is_some();
        publish_all(self.store.as_ref(), notification.into_iter().collect()).await;

        tracing::debug!(%account_id, awarded, reason = award.reason.label(), total = account.xp, "XP awarded");
        Ok(XpAwardOutcome {
            awarded,
            total_xp: account.xp,
            progress: account.level_progress(),
            leveled_up,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_up_detection() {
        let id = AccountId::new();
        assert!(level_up_notification(id, 0, 9).is_none());
        let n = level_up_notification(id, 9, 40).unwrap();
        assert_eq!(n.kind, NotificationKind::LevelUp { level: 2 });
    }

    #[test]
    fn test_reason_labels() {
        assert_eq!(XpReason::ChallengeCompleted.label(), "challenge_completed");
        assert_eq!(XpReason::Custom("streak_bonus".into()).label(), "streak_bonus");
        let parsed: XpReason = serde_json::from_str("\"daily_login\"").unwrap();
        assert_eq!(parsed, XpReason::DailyLogin);
    }
}
