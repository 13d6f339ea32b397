//! Notification records
//!
//! The arena only persists notifications; delivery to devices happens
//! elsewhere. Publishing never fails the operation that produced the event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tradeleague_types::{AccountId, LeagueId, NotificationId};

use crate::store::NotificationStore;
use crate::tiers::LeagueTier;

/// What happened
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationKind {
    Promotion { from: LeagueTier, to: LeagueTier },
    Relegation { from: LeagueTier, to: LeagueTier },
    PassedMember { league_id: LeagueId, passed_account: AccountId, passed_username: String },
    RankImproved { league_id: LeagueId, from: u32, to: u32 },
    LevelUp { level: u32 },
}

impl NotificationKind {
    /// Stable label stored alongside the payload
    pub fn label(&self) -> &'static str {
        match self {
            Self::Promotion { .. } => "promotion",
            Self::Relegation { .. } => "relegation",
            Self::PassedMember { .. } => "passed_member",
            Self::RankImproved { .. } => "rank_improved",
            Self::LevelUp { .. } => "level_up",
        }
    }

    /// Human-readable message
    pub fn message(&self) -> String {
        match self {
            Self::Promotion { to, .. } => format!("Promoted to {} league", to),
            Self::Relegation { to, .. } => format!("Relegated to {} league", to),
            Self::PassedMember { passed_username, .. } => format!("You passed @{}", passed_username),
            Self::RankImproved { to, .. } => format!("You moved up to #{}", to),
            Self::LevelUp { level } => format!("Level up! You reached level {}", level),
        }
    }
}

/// A notification addressed to one account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub account_id: AccountId,
    pub kind: NotificationKind,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(account_id: AccountId, kind: NotificationKind) -> Self {
        Self {
            id: NotificationId::new(),
            account_id,
            kind,
            read: false,
            created_at: Utc::now(),
        }
    }
}

/// Publish every notification, logging failures instead of returning them
pub async fn publish_all<S>(store: &S, notifications: Vec<Notification>)
where
    S: NotificationStore + ?Sized,
{
    for notification in notifications {
        let kind = notification.kind.label();
        let account_id = notification.account_id;
        if let Err(e) = store.publish(notification).await {
            tracing::warn!(%account_id, kind, error = %e, "Failed to publish notification");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_shape() {
        let kind = NotificationKind::Promotion {
            from: LeagueTier::Silver,
            to: LeagueTier::Gold,
        };
        let json = serde_json::to_value(&kind).unwrap();
        assert_eq!(json["type"], "promotion");
        assert_eq!(json["to"], "gold");
        assert_eq!(kind.message(), "Promoted to Gold league");
    }

    #[test]
    fn test_passed_message() {
        let kind = NotificationKind::PassedMember {
            league_id: LeagueId::new(),
            passed_account: AccountId::new(),
            passed_username: "grace".into(),
        };
        assert_eq!(kind.message(), "You passed @grace");
        assert_eq!(kind.label(), "passed_member");
    }
}
