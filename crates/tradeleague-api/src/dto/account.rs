//! Account, portfolio and notification DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tradeleague_arena::valuation::PositionValuation;
use tradeleague_arena::{Account, LedgerEntry, Notification, PortfolioValuation, PriceSource};
use utoipa::ToSchema;
use uuid::Uuid;

// =============================================================================
// Profile
// =============================================================================

/// Account profile with progression and league standing
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProfileResponse {
    pub account_id: Uuid,
    pub username: String,
    pub xp: i64,
    pub level: u32,
    /// Title for the current level band
    pub title: String,
    pub current_level_xp: i64,
    pub next_level_xp: i64,
    pub xp_to_next: i64,
    pub progress_percent: u8,
    pub rating: i64,
    pub tier: String,
    pub tier_color: String,
    /// `None` at the top tier
    pub next_tier: Option<String>,
    /// Rating still needed to reach `next_tier`
    pub rating_to_next_tier: Option<i64>,
    pub season: u32,
    #[schema(value_type = String)]
    pub season_pnl: Decimal,
    #[schema(value_type = String)]
    pub best_season_pnl: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<&Account> for ProfileResponse {
    fn from(account: &Account) -> Self {
        let progress = account.level_progress();
        let tier = account.tier();
        let next_tier = tier.next();
        Self {
            account_id: account.id.into_uuid(),
            username: account.username.clone(),
            xp: account.xp,
            level: progress.level,
            title: progress.title.display_name().to_string(),
            current_level_xp: progress.current_level_xp,
            next_level_xp: progress.next_level_xp,
            xp_to_next: progress.xp_to_next(),
            progress_percent: progress.progress_percent,
            rating: account.rating,
            tier: tier.display_name().to_string(),
            tier_color: tier.color().to_string(),
            next_tier: next_tier.map(|t| t.display_name().to_string()),
            rating_to_next_tier: next_tier.map(|t| t.min_rating() - account.rating),
            season: account.season,
            season_pnl: account.season_pnl,
            best_season_pnl: account.best_season_pnl,
            created_at: account.created_at,
        }
    }
}

// =============================================================================
// Portfolio
// =============================================================================

/// One valued lot
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PositionInfo {
    pub lot_id: Uuid,
    pub symbol: String,
    #[schema(value_type = String)]
    pub quantity: Decimal,
    pub currency: String,
    #[schema(value_type = String)]
    pub acquisition_price: Decimal,
    #[schema(value_type = String)]
    pub market_price: Decimal,
    /// `live` or `cost_basis`
    pub price_source: String,
    #[schema(value_type = String)]
    pub fx_rate: Decimal,
    #[schema(value_type = String)]
    pub cost_basis: Decimal,
    #[schema(value_type = String)]
    pub market_value: Decimal,
    #[schema(value_type = String)]
    pub unrealized_pnl: Decimal,
    pub locked_until: Option<DateTime<Utc>>,
}

impl From<PositionValuation> for PositionInfo {
    fn from(p: PositionValuation) -> Self {
        Self {
            lot_id: p.lot_id.into_uuid(),
            symbol: p.symbol.to_string(),
            quantity: p.quantity,
            currency: p.currency.to_string(),
            acquisition_price: p.acquisition_price,
            market_price: p.market_price,
            price_source: match p.price_source {
                PriceSource::Live => "live",
                PriceSource::CostBasis => "cost_basis",
            }
            .to_string(),
            fx_rate: p.fx_rate,
            cost_basis: p.cost_basis,
            market_value: p.market_value,
            unrealized_pnl: p.unrealized_pnl,
            locked_until: p.locked_until,
        }
    }
}

/// Net worth breakdown in the home currency
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PortfolioResponse {
    pub currency: String,
    #[schema(value_type = String)]
    pub cash: Decimal,
    #[schema(value_type = String)]
    pub holdings_value: Decimal,
    #[schema(value_type = String)]
    pub total: Decimal,
    #[schema(value_type = String)]
    pub realized_pnl: Decimal,
    #[schema(value_type = String)]
    pub unrealized_pnl: Decimal,
    pub positions: Vec<PositionInfo>,
}

impl PortfolioResponse {
    pub fn new(currency: String, valuation: PortfolioValuation) -> Self {
        Self {
            currency,
            cash: valuation.cash,
            holdings_value: valuation.holdings_value,
            total: valuation.total,
            realized_pnl: valuation.realized_pnl,
            unrealized_pnl: valuation.unrealized_pnl,
            positions: valuation.positions.into_iter().map(PositionInfo::from).collect(),
        }
    }
}

// =============================================================================
// Ledger
// =============================================================================

/// One ledger entry
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransactionInfo {
    pub id: Uuid,
    pub lot_id: Uuid,
    pub symbol: String,
    pub side: String,
    #[schema(value_type = String)]
    pub quantity: Decimal,
    #[schema(value_type = String)]
    pub price: Decimal,
    pub currency: String,
    #[schema(value_type = String)]
    pub fx_rate: Decimal,
    #[schema(value_type = String)]
    pub realized_pnl: Decimal,
    pub executed_at: DateTime<Utc>,
}

impl From<LedgerEntry> for TransactionInfo {
    fn from(e: LedgerEntry) -> Self {
        Self {
            id: e.id.into_uuid(),
            lot_id: e.lot_id.into_uuid(),
            symbol: e.symbol.to_string(),
            side: e.side.to_string(),
            quantity: e.quantity,
            price: e.price,
            currency: e.currency.to_string(),
            fx_rate: e.fx_rate,
            realized_pnl: e.realized_pnl,
            executed_at: e.executed_at,
        }
    }
}

/// A page of ledger entries, newest first
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransactionsResponse {
    pub data: Vec<TransactionInfo>,
    pub page: u32,
    pub limit: u32,
    pub has_more: bool,
}

// =============================================================================
// Notifications
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NotificationInfo {
    pub id: Uuid,
    /// Stable kind label, e.g. `promotion`
    pub kind: String,
    pub message: String,
    #[schema(value_type = Object)]
    pub payload: serde_json::Value,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Notification> for NotificationInfo {
    fn from(n: Notification) -> Self {
        Self {
            id: n.id.into_uuid(),
            kind: n.kind.label().to_string(),
            message: n.kind.message(),
            payload: serde_json::to_value(&n.kind).unwrap_or(serde_json::Value::Null),
            read: n.read,
            created_at: n.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tradeleague_arena::{AccountId, LeagueTier, NotificationKind};

    #[test]
    fn test_profile_from_new_account() {
        let account = Account::new(AccountId::new(), "ada", dec!(100000), Utc::now());
        let profile = ProfileResponse::from(&account);
        assert_eq!(profile.level, 0);
        assert_eq!(profile.tier, "Silver");
        assert_eq!(profile.next_level_xp, 10);
        assert_eq!(profile.xp_to_next, 10);
        assert_eq!(profile.season, 1);
        assert_eq!(profile.next_tier.as_deref(), Some("Gold"));
        assert_eq!(profile.rating_to_next_tier, Some(500));
    }

    #[test]
    fn test_profile_at_top_tier_has_no_next_tier() {
        let mut account = Account::new(AccountId::new(), "ada", dec!(100000), Utc::now());
        account.rating = 2700;
        let profile = ProfileResponse::from(&account);
        assert_eq!(profile.tier, "Diamond");
        assert_eq!(profile.next_tier, None);
        assert_eq!(profile.rating_to_next_tier, None);
    }

    #[test]
    fn test_notification_info_carries_label_and_payload() {
        let n = Notification::new(
            AccountId::new(),
            NotificationKind::Promotion {
                from: LeagueTier::Silver,
                to: LeagueTier::Gold,
            },
        );
        let info = NotificationInfo::from(n);
        assert_eq!(info.kind, "promotion");
        assert_eq!(info.payload["type"], "promotion");
        assert!(info.message.contains("Gold"));
    }
}
