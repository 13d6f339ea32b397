//! # Paper Trade Execution
//!
//! Buys open a new lot at the live price; sells close all or part of one
//! lot and realize `(price − acquisition) × quantity × fx` in the home
//! currency.
//!
//! The affordability check and the write are tied together by the account
//! version: a commit only applies if no other trade landed since the
//! account was read, so two racing buys can never jointly overdraw cash.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tradeleague_marketdata::{FxRateProvider, QuoteProvider};
use tradeleague_types::{AccountId, LotId, Symbol, TradeSide, TransactionId};

use crate::awards::level_up_notification;
use crate::error::{ArenaError, ArenaResult};
use crate::leagues::LeagueService;
use crate::models::{Account, Holding, LedgerEntry, LotChange, TradeCommit};
use crate::notifications::publish_all;
use crate::store::ArenaStore;
use crate::valuation::PortfolioValuator;

/// A buy or sell order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRequest {
    pub symbol: Symbol,
    pub quantity: Decimal,
    pub side: TradeSide,
    /// Lot to sell from; required for sells
    #[serde(default)]
    pub lot_id: Option<LotId>,
    /// Lock a bought lot against selling for this many days
    #[serde(default)]
    pub lock_days: Option<u32>,
}

/// Result of an executed trade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeReceipt {
    pub transaction: LedgerEntry,
    pub realized_pnl: Decimal,
    pub price: Decimal,
    pub cash_after: Decimal,
    pub xp_awarded: i64,
    pub leveled_up: bool,
}

/// Lot mutation, ledger entry and cash movement of a priced trade
struct PlannedTrade {
    lot_change: LotChange,
    entry: LedgerEntry,
    cash_after: Decimal,
}

#[derive(Clone)]
pub struct TradeService {
    store: Arc<dyn ArenaStore>,
    quotes: Arc<dyn QuoteProvider>,
    fx: Arc<dyn FxRateProvider>,
    valuator: PortfolioValuator,
    leagues: LeagueService,
    trade_xp: i64,
    max_lock_days: u32,
}

impl TradeService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn ArenaStore>,
        quotes: Arc<dyn QuoteProvider>,
        fx: Arc<dyn FxRateProvider>,
        valuator: PortfolioValuator,
        leagues: LeagueService,
        trade_xp: i64,
        max_lock_days: u32,
    ) -> Self {
        Self {
            store,
            quotes,
            fx,
            valuator,
            leagues,
            trade_xp,
            max_lock_days,
        }
    }

    /// Execute `request` for `account_id`
    pub async fn execute(&self, account_id: AccountId, request: TradeRequest, now: DateTime<Utc>) -> ArenaResult<TradeReceipt> {
        if request.quantity <= Decimal::ZERO {
            return Err(ArenaError::Validation("quantity must be positive".into()));
        }

        let account = self.store.account(account_id).await?;
        let cash = self.valuator.cash(&account).await?;
        let planned = match request.side {
            TradeSide::Buy => self.plan_buy(&account, &request, cash, now).await?,
            TradeSide::Sell => self.plan_sell(&account, &request, cash, now).await?,
        };

        let realized_pnl = planned.entry.realized_pnl;
        let price = planned.entry.price;
        let transaction = planned.entry.clone();
        let updated = self
            .store
            .commit_trade(TradeCommit {
                account_id,
                expected_version: account.version,
                lot_change: planned.lot_change,
                entry: planned.entry,
                season_pnl_delta: realized_pnl,
                xp_delta: self.trade_xp,
            })
            .await?;

        tracing::info!(
            %account_id,
            symbol = %request.symbol,
            side = %request.side,
            quantity = %request.quantity,
            %price,
            %realized_pnl,
            "Trade executed"
        );

        let level_up = level_up_notification(account_id, account.xp, updated.xp);
        let leveled_up = level_up.is_some();
        publish_all(self.store.as_ref(), level_up.into_iter().collect()).await;

        if let Err(e) = self.leagues.refresh_for_account(account_id, now).await {
            tracing::warn!(%account_id, error = %e, "League standings refresh failed after trade");
        }

        Ok(TradeReceipt {
            transaction,
            realized_pnl,
            price,
            cash_after: planned.cash_after,
            xp_awarded: self.trade_xp,
            leveled_up,
        })
    }

    async fn plan_buy(&self, account: &Account, request: &TradeRequest, cash: Decimal, now: DateTime<Utc>) -> ArenaResult<PlannedTrade> {
        if request.lot_id.is_some() {
            return Err(ArenaError::Validation("lot_id is only accepted for sells".into()));
        }
        let locked_until = match request.lock_days {
            Some(days) if days > self.max_lock_days => {
                return Err(ArenaError::Validation(format!(
                    "lock cannot exceed {} days",
                    self.max_lock_days
                )))
            }
            Some(0) | None => None,
            Some(days) => Some(now + Duration::days(days as i64)),
        };

        let quote = self.quotes.latest_quote(&request.symbol).await?;
        let fx_rate = self.fx.rate_to_home(quote.currency).await?;
        let cost = request.quantity * quote.price * fx_rate;
        if cost > cash {
            return Err(ArenaError::InsufficientFunds {
                required: cost,
                available: cash,
            });
        }

        let holding = Holding {
            lot_id: LotId::new(),
            account_id: account.id,
            symbol: request.symbol.clone(),
            quantity: request.quantity,
            acquisition_price: quote.price,
            currency: quote.currency,
            locked_until,
            acquired_at: now,
        };
        let entry = LedgerEntry {
            id: TransactionId::new(),
            account_id: account.id,
            lot_id: holding.lot_id,
            symbol: request.symbol.clone(),
            side: TradeSide::Buy,
            quantity: request.quantity,
            price: quote.price,
            currency: quote.currency,
            fx_rate,
            realized_pnl: Decimal::ZERO,
            executed_at: now,
        };
        Ok(PlannedTrade {
            lot_change: LotChange::Open(holding),
            entry,
            cash_after: cash - cost,
        })
    }

    async fn plan_sell(&self, account: &Account, request: &TradeRequest, cash: Decimal, now: DateTime<Utc>) -> ArenaResult<PlannedTrade> {
        let lot_id = request
            .lot_id
            .ok_or_else(|| ArenaError::Validation("lot_id is required to sell".into()))?;
        let lot = self
            .store
            .holding(lot_id)
            .await?
            .ok_or_else(|| ArenaError::InvalidLot(format!("lot {} does not exist", lot_id)))?;

        if lot.account_id != account.id {
            return Err(ArenaError::Forbidden(format!("lot {} belongs to another account", lot_id)));
        }
        if lot.symbol != request.symbol {
            return Err(ArenaError::InvalidLot(format!("lot {} holds {}, not {}", lot_id, lot.symbol, request.symbol)));
        }
        if let Some(until) = lot.locked_until.filter(|_| lot.is_locked_at(now)) {
            return Err(ArenaError::LockNotExpired { lot_id, until });
        }
        if request.quantity > lot.quantity {
            return Err(ArenaError::InvalidLot(format!(
                "lot {} holds {} shares, cannot sell {}",
                lot_id, lot.quantity, request.quantity
            )));
        }

        let quote = self.quotes.latest_quote(&request.symbol).await?;
        if quote.currency != lot.currency {
            tracing::warn!(%lot_id, quote = %quote.currency, lot = %lot.currency, "Quote currency differs from lot currency");
        }
        let fx_rate = self.fx.rate_to_home(lot.currency).await?;
        let realized_pnl = (quote.price - lot.acquisition_price) * request.quantity * fx_rate;

        let remaining = lot.quantity - request.quantity;
        let lot_change = if remaining.is_zero() {
            LotChange::Close { lot_id }
        } else {
            LotChange::Reduce { lot_id, remaining }
        };
        let entry = LedgerEntry {
            id: TransactionId::new(),
            account_id: account.id,
            lot_id,
            symbol: request.symbol.clone(),
            side: TradeSide::Sell,
            quantity: request.quantity,
            price: quote.price,
            currency: lot.currency,
            fx_rate,
            realized_pnl,
            executed_at: now,
        };
        Ok(PlannedTrade {
            lot_change,
            entry,
            cash_after: cash + request.quantity * quote.price * fx_rate,
        })
    }
}
