//! Arena tuning knobs

use std::collections::HashMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tradeleague_marketdata::{StaticFxRates, DEFAULT_CAD_USD_RATE};
use tradeleague_types::Currency;

/// Largest XP amount one award may grant
pub const MAX_SINGLE_XP_AWARD: i64 = 500;

/// Arena configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArenaConfig {
    /// Paper cash every account starts with
    #[serde(default = "default_starting_capital")]
    pub starting_capital: Decimal,

    /// Currency all valuations are expressed in
    #[serde(default)]
    pub home_currency: Currency,

    /// Conversion constants into the home currency
    #[serde(default = "default_fx_rates")]
    pub fx_rates: HashMap<Currency, Decimal>,

    /// Entries kept in a season archive
    #[serde(default = "default_leaderboard_size")]
    pub season_leaderboard_size: usize,

    /// XP granted for each executed trade
    #[serde(default = "default_trade_xp")]
    pub trade_xp: i64,

    /// Cap applied to a single XP award
    #[serde(default = "default_max_xp_award")]
    pub max_xp_award: i64,

    /// Longest lock a buyer may put on a lot
    #[serde(default = "default_max_lock_days")]
    pub max_lock_days: u32,
}

impl ArenaConfig {
    /// FX table used by the default valuator
    pub fn static_fx_rates(&self) -> StaticFxRates {
        self.fx_rates
            .iter()
            .fold(StaticFxRates::new(self.home_currency), |fx, (currency, rate)| {
                fx.with_rate(*currency, *rate)
            })
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            starting_capital: default_starting_capital(),
            home_currency: Currency::USD,
            fx_rates: default_fx_rates(),
            season_leaderboard_size: default_leaderboard_size(),
            trade_xp: default_trade_xp(),
            max_xp_award: default_max_xp_award(),
            max_lock_days: default_max_lock_days(),
        }
    }
}

fn default_starting_capital() -> Decimal {
    dec!(100000)
}

fn default_fx_rates() -> HashMap<Currency, Decimal> {
    HashMap::from([(Currency::CAD, DEFAULT_CAD_USD_RATE)])
}

fn default_leaderboard_size() -> usize {
    10
}

fn default_trade_xp() -> i64 {
    10
}

fn default_max_xp_award() -> i64 {
    MAX_SINGLE_XP_AWARD
}

fn default_max_lock_days() -> u32 {
    365
}
