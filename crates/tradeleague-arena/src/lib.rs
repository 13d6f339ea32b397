//! TradeLeague Arena - leagues, seasons and progression for paper trading
//!
//! This crate is the domain core of TradeLeague. It owns the arithmetic
//! (levels, tiers, rating deltas, valuations, standings) and the services
//! that apply it against a store.
//!
//! # Features
//!
//! - **Progression**: XP to level and progress percentage
//! - **Tiers**: rating to Bronze, Silver, Gold, Platinum or Diamond
//! - **Ratings**: weekly rating deltas from period returns, once per ISO week
//! - **Valuation**: mark-to-market net worth with per-symbol cost-basis fallback
//! - **Trading**: buy and sell lots with compare-and-set commits
//! - **Fantasy Leagues**: invite codes, member caps, live standings
//! - **Seasons**: versioned rotation that archives and resets exactly once per key
//!
//! # Example
//!
//! ```ignore
//! use tradeleague_arena::{Arena, ArenaConfig, InMemoryArenaStore};
//!
//! let arena = Arena::new(Arc::new(InMemoryArenaStore::new()), quotes, fx, ArenaConfig::default());
//!
//! let account = arena.ensure_account(account_id, "ada", Utc::now()).await?;
//! let receipt = arena.trades.execute(account.id, request, Utc::now()).await?;
//! let summary = arena.ratings.run(&PeriodKey::containing(Utc::now())).await?;
//! ```

pub mod awards;
pub mod config;
pub mod error;
pub mod leagues;
pub mod memory;
pub mod models;
pub mod notifications;
pub mod progression;
pub mod rating;
pub mod season;
pub mod standings;
pub mod store;
pub mod tiers;
pub mod trading;
pub mod valuation;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tradeleague_marketdata::{FxRateProvider, QuoteProvider};

pub use awards::{XpAward, XpAwardOutcome, XpReason, XpService};
pub use config::{ArenaConfig, MAX_SINGLE_XP_AWARD};
pub use error::{ArenaError, ArenaResult};
pub use leagues::{FantasyLeague, LeagueMembership, LeagueService, LeagueStatus, NewLeague};
pub use memory::InMemoryArenaStore;
pub use models::{Account, Holding, LedgerEntry};
pub use notifications::{Notification, NotificationKind};
pub use progression::{level_for_xp, progress_to_next_level, xp_for_level, LevelProgress, LevelTitle};
pub use rating::{PeriodKey, RatingRunSummary, RatingUpdater};
pub use season::{CurrentSeason, RotationOutcome, SeasonArchive, SeasonRotation, SeasonState};
pub use standings::{recalculate, StandingsOutcome};
pub use store::{ArenaStore, JobClaim};
pub use tiers::{LeagueTier, TierChange};
pub use trading::{TradeReceipt, TradeRequest, TradeService};
pub use valuation::{PortfolioValuation, PortfolioValuator, PriceSource};

pub use tradeleague_types::{AccountId, Currency, LeagueId, LotId, Symbol, TradeSide};

/// All arena services wired to one store and one set of market inputs
#[derive(Clone)]
pub struct Arena {
    pub store: Arc<dyn ArenaStore>,
    pub config: ArenaConfig,
    pub valuator: PortfolioValuator,
    pub leagues: LeagueService,
    pub trades: TradeService,
    pub xp: XpService,
    pub ratings: RatingUpdater,
    pub seasons: SeasonRotation,
}

impl Arena {
    pub fn new(
        store: Arc<dyn ArenaStore>,
        quotes: Arc<dyn QuoteProvider>,
        fx: Arc<dyn FxRateProvider>,
        config: ArenaConfig,
    ) -> Self {
        let valuator = PortfolioValuator::new(store.clone(), quotes.clone(), fx.clone());
        let leagues = LeagueService::new(store.clone(), valuator.clone());
        let trades = TradeService::new(
            store.clone(),
            quotes,
            fx,
            valuator.clone(),
            leagues.clone(),
            config.trade_xp,
            config.max_lock_days,
        );
        let xp = XpService::new(store.clone(), config.max_xp_award);
        let ratings = RatingUpdater::new(store.clone(), valuator.clone(), config.starting_capital);
        let seasons = SeasonRotation::new(store.clone(), config.season_leaderboard_size);

        Self {
            store,
            config,
            valuator,
            leagues,
            trades,
            xp,
            ratings,
            seasons,
        }
    }

    /// Fetch the account, creating it with the configured starting capital
    /// the first time an identity is seen
    pub async fn ensure_account(&self, id: AccountId, username: &str, now: DateTime<Utc>) -> ArenaResult<Account> {
        self.store
            .ensure_account(Account::new(id, username, self.config.starting_capital, now))
            .await
    }
}
