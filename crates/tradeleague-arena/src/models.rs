//! Account, holding and ledger records

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tradeleague_types::{AccountId, Currency, LotId, Symbol, TradeSide, TransactionId};

use crate::progression::LevelProgress;
use crate::tiers::{LeagueTier, DEFAULT_RATING};

// ============================================================================
// Accounts
// ============================================================================

/// A trading account with its progression and season accumulators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub username: String,
    pub xp: i64,
    pub rating: i64,
    pub season_pnl: Decimal,
    pub best_season_pnl: Decimal,
    /// Season counter, advanced on every rotation
    pub season: u32,
    pub starting_capital: Decimal,
    /// Optimistic concurrency counter, bumped by every trade commit
    pub version: u64,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// A fresh account at the default rating
    pub fn new(id: AccountId, username: impl Into<String>, starting_capital: Decimal, now: DateTime<Utc>) -> Self {
        Self {
            id,
            username: username.into(),
            xp: 0,
            rating: DEFAULT_RATING,
            season_pnl: Decimal::ZERO,
            best_season_pnl: Decimal::ZERO,
            season: 1,
            starting_capital,
            version: 0,
            created_at: now,
        }
    }

    pub fn level_progress(&self) -> LevelProgress {
        LevelProgress::from_xp(self.xp)
    }

    pub fn tier(&self) -> LeagueTier {
        LeagueTier::from_rating(self.rating)
    }
}

// ============================================================================
// Holdings & Ledger
// ============================================================================

/// An open lot of a symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub lot_id: LotId,
    pub account_id: AccountId,
    pub symbol: Symbol,
    pub quantity: Decimal,
    /// Price per share in `currency` at purchase
    pub acquisition_price: Decimal,
    pub currency: Currency,
    pub locked_until: Option<DateTime<Utc>>,
    pub acquired_at: DateTime<Utc>,
}

impl Holding {
    pub fn is_locked_at(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.map_or(false, |until| now < until)
    }

    /// Cost basis in the holding currency
    pub fn cost_basis(&self) -> Decimal {
        self.quantity * self.acquisition_price
    }
}

/// Immutable record of one buy or sell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: TransactionId,
    pub account_id: AccountId,
    pub lot_id: LotId,
    pub symbol: Symbol,
    pub side: TradeSide,
    pub quantity: Decimal,
    pub price: Decimal,
    pub currency: Currency,
    pub fx_rate: Decimal,
    /// Home-currency profit locked in by a sell, zero for buys
    pub realized_pnl: Decimal,
    pub executed_at: DateTime<Utc>,
}

/// Lot mutation carried by a trade commit
#[derive(Debug, Clone, PartialEq)]
pub enum LotChange {
    Open(Holding),
    Reduce { lot_id: LotId, remaining: Decimal },
    Close { lot_id: LotId },
}

impl LotChange {
    pub fn lot_id(&self) -> LotId {
        match self {
            Self::Open(h) => h.lot_id,
            Self::Reduce { lot_id, .. } | Self::Close { lot_id } => *lot_id,
        }
    }
}

/// Everything a trade writes, applied atomically against `expected_version`
#[derive(Debug, Clone)]
pub struct TradeCommit {
    pub account_id: AccountId,
    pub expected_version: u64,
    pub lot_change: LotChange,
    pub entry: LedgerEntry,
    pub season_pnl_delta: Decimal,
    pub xp_delta: i64,
}

/// Portfolio total recorded at the start of a rating period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    pub account_id: AccountId,
    pub period: String,
    pub total_value: Decimal,
    pub recorded_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    #[test]
    fn test_new_account_defaults() {
        let account = Account::new(AccountId::new(), "ada", dec!(100000), Utc::now());
        assert_eq!(account.rating, 1000);
        assert_eq!(account.tier(), LeagueTier::Silver);
        assert_eq!(account.season, 1);
        assert_eq!(account.level_progress().level, 0);
    }

    #[test]
    fn test_lock_window() {
        let now = Utc::now();
        let holding = Holding {
            lot_id: LotId::new(),
            account_id: AccountId::new(),
            symbol: Symbol::new("AAPL").unwrap(),
            quantity: dec!(3),
            acquisition_price: dec!(100),
            currency: Currency::USD,
            locked_until: Some(now + Duration::days(2)),
            acquired_at: now,
        };
        assert!(holding.is_locked_at(now));
        assert!(!holding.is_locked_at(now + Duration::days(2)));
        assert_eq!(holding.cost_basis(), dec!(300));
    }
}
