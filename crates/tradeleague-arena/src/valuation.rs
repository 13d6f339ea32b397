//! # Portfolio Valuation
//!
//! Mark-to-market net worth of a paper portfolio, in the home currency:
//!
//! ```text
//! cash           = starting_capital + Σ realized_pnl − Σ (qty × cost_basis × fx)
//! holdings_value = Σ (qty × market_price × fx)
//! total          = cash + holdings_value
//! ```
//!
//! A symbol without a live price is valued at its cost basis; only that
//! symbol degrades, the rest of the portfolio keeps live prices.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tradeleague_marketdata::{FxRateProvider, QuoteProvider};
use tradeleague_types::{AccountId, Currency, LotId, Symbol};

use crate::error::ArenaResult;
use crate::models::{Account, Holding};
use crate::store::ArenaStore;

// ============================================================================
// Pure valuation
// ============================================================================

/// Where a position's price came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSource {
    Live,
    CostBasis,
}

/// A holding paired with its market inputs
#[derive(Debug, Clone)]
pub struct PricedHolding {
    pub holding: Holding,
    /// `None` when the quote lookup failed
    pub market_price: Option<Decimal>,
    /// Holding currency to home currency
    pub fx_rate: Decimal,
}

/// Valuation of one lot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionValuation {
    pub lot_id: LotId,
    pub symbol: Symbol,
    pub quantity: Decimal,
    pub currency: Currency,
    pub acquisition_price: Decimal,
    pub market_price: Decimal,
    pub price_source: PriceSource,
    pub fx_rate: Decimal,
    /// Home currency
    pub cost_basis: Decimal,
    /// Home currency
    pub market_value: Decimal,
    pub unrealized_pnl: Decimal,
    pub locked_until: Option<DateTime<Utc>>,
}

/// Valuation of a whole account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioValuation {
    pub cash: Decimal,
    pub holdings_value: Decimal,
    pub total: Decimal,
    pub realized_pnl: Decimal,
    pub unrealized_pnl: Decimal,
    pub positions: Vec<PositionValuation>,
}

/// Value a portfolio from already-fetched inputs
pub fn value_portfolio(
    starting_capital: Decimal,
    realized_pnl_total: Decimal,
    holdings: &[PricedHolding],
) -> PortfolioValuation {
    let positions: Vec<PositionValuation> = holdings
        .iter()
        .map(|priced| {
            let h = &priced.holding;
            let (market_price, price_source) = match priced.market_price {
                Some(price) => (price, PriceSource::Live),
                None => (h.acquisition_price, PriceSource::CostBasis),
            };
            let cost_basis = h.quantity * h.acquisition_price * priced.fx_rate;
            let market_value = h.quantity * market_price * priced.fx_rate;
            PositionValuation {
                lot_id: h.lot_id,
                symbol: h.symbol.clone(),
                quantity: h.quantity,
                currency: h.currency,
                acquisition_price: h.acquisition_price,
                market_price,
                price_source,
                fx_rate: priced.fx_rate,
                cost_basis,
                market_value,
                unrealized_pnl: market_value - cost_basis,
                locked_until: h.locked_until,
            }
        })
        .collect();

    let invested: Decimal = positions.iter().map(|p| p.cost_basis).sum();
    let holdings_value: Decimal = positions.iter().map(|p| p.market_value).sum();
    let cash = starting_capital + realized_pnl_total - invested;

    PortfolioValuation {
        cash,
        holdings_value,
        total: cash + holdings_value,
        realized_pnl: realized_pnl_total,
        unrealized_pnl: holdings_value - invested,
        positions,
    }
}

/// Cash available to spend, from unpriced holdings
pub fn available_cash(starting_capital: Decimal, realized_pnl_total: Decimal, invested_home: Decimal) -> Decimal {
    starting_capital + realized_pnl_total - invested_home
}

// ============================================================================
// Valuator service
// ============================================================================

/// Values accounts against live quotes and FX rates
#[derive(Clone)]
pub struct PortfolioValuator {
    store: Arc<dyn ArenaStore>,
    quotes: Arc<dyn QuoteProvider>,
    fx: Arc<dyn FxRateProvider>,
}

impl PortfolioValuator {
    pub fn new(store: Arc<dyn ArenaStore>, quotes: Arc<dyn QuoteProvider>, fx: Arc<dyn FxRateProvider>) -> Self {
        Self { store, quotes, fx }
    }

    /// Resolve FX rates for every currency in `holdings`
    pub async fn fx_rates(&self, holdings: &[Holding]) -> ArenaResult<HashMap<Currency, Decimal>> {
        let currencies: HashSet<Currency> = holdings.iter().map(|h| h.currency).collect();
        let mut rates = HashMap::with_capacity(currencies.len());
        for currency in currencies {
            rates.insert(currency, self.fx.rate_to_home(currency).await?);
        }
        Ok(rates)
    }

    /// Latest price per distinct symbol; failed lookups are left out
    async fn live_prices(&self, holdings: &[Holding]) -> HashMap<Symbol, Decimal> {
        let symbols: HashSet<&Symbol> = holdings.iter().map(|h| &h.symbol).collect();
        let lookups = symbols.into_iter().map(|symbol| async move {
            match self.quotes.latest_quote(symbol).await {
                Ok(quote) => Some((symbol.clone(), quote.price)),
                Err(e) => {
                    tracing::warn!(
                        %symbol,
                        provider = self.quotes.name(),
                        error = %e,
                        "Quote unavailable, valuing at cost basis"
                    );
                    None
                }
            }
        });
        join_all(lookups).await.into_iter().flatten().collect()
    }

    /// Full valuation of `account`
    pub async fn value(&self, account: &Account) -> ArenaResult<PortfolioValuation> {
        let holdings = self.store.holdings(account.id).await?;
        let realized = self.store.realized_pnl_total(account.id).await?;
        let rates = self.fx_rates(&holdings).await?;
        let prices = self.live_prices(&holdings).await;

        let priced: Vec<PricedHolding> = holdings
            .into_iter()
            .map(|holding| PricedHolding {
                market_price: prices.get(&holding.symbol).copied(),
                fx_rate: rates.get(&holding.currency).copied().unwrap_or(Decimal::ONE),
                holding,
            })
            .collect();

        Ok(value_portfolio(account.starting_capital, realized, &priced))
    }

    /// Spendable cash of `account`; needs no quotes
    pub async fn cash(&self, account: &Account) -> ArenaResult<Decimal> {
        let holdings = self.store.holdings(account.id).await?;
        let realized = self.store.realized_pnl_total(account.id).await?;
        let rates = self.fx_rates(&holdings).await?;
        let invested: Decimal = holdings
            .iter()
            .map(|h| h.cost_basis() * rates.get(&h.currency).copied().unwrap_or(Decimal::ONE))
            .sum();
        Ok(available_cash(account.starting_capital, realized, invested))
    }

    /// Total net worth of the account with `id`
    pub async fn total(&self, id: AccountId) -> ArenaResult<Decimal> {
        let account = self.store.account(id).await?;
        Ok(self.value(&account).await?.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn lot(symbol: &str, qty: Decimal, price: Decimal, currency: Currency) -> Holding {
        Holding {
            lot_id: LotId::new(),
            account_id: AccountId::new(),
            symbol: Symbol::new(symbol).unwrap(),
            quantity: qty,
            acquisition_price: price,
            currency,
            locked_until: None,
            acquired_at: Utc::now(),
        }
    }

    #[test]
    fn test_empty_portfolio_is_all_cash() {
        let v = value_portfolio(dec!(100000), dec!(0), &[]);
        assert_eq!(v.cash, dec!(100000));
        assert_eq!(v.holdings_value, dec!(0));
        assert_eq!(v.total, dec!(100000));
    }

    #[test]
    fn test_mark_to_market_with_fx() {
        let holdings = vec![
            PricedHolding {
                holding: lot("AAPL", dec!(10), dec!(100), Currency::USD),
                market_price: Some(dec!(120)),
                fx_rate: dec!(1),
            },
            PricedHolding {
                holding: lot("SHOP.TO", dec!(4), dec!(50), Currency::CAD),
                market_price: Some(dec!(60)),
                fx_rate: dec!(0.73),
            },
        ];
        let v = value_portfolio(dec!(10000), dec!(250), &holdings);
        // invested = 1000 + 4*50*0.73 = 1146
        assert_eq!(v.cash, dec!(9104.00));
        // market = 1200 + 4*60*0.73 = 1375.2
        assert_eq!(v.holdings_value, dec!(1375.20));
        assert_eq!(v.total, dec!(10479.20));
        assert_eq!(v.unrealized_pnl, dec!(229.20));
    }

    #[test]
    fn test_missing_price_falls_back_per_symbol() {
        let holdings = vec![
            PricedHolding {
                holding: lot("AAPL", dec!(2), dec!(100), Currency::USD),
                market_price: None,
                fx_rate: dec!(1),
            },
            PricedHolding {
                holding: lot("MSFT", dec!(1), dec!(300), Currency::USD),
                market_price: Some(dec!(330)),
                fx_rate: dec!(1),
            },
        ];
        let v = value_portfolio(dec!(1000), dec!(0), &holdings);
        assert_eq!(v.positions[0].price_source, PriceSource::CostBasis);
        assert_eq!(v.positions[0].market_value, dec!(200));
        assert_eq!(v.positions[1].price_source, PriceSource::Live);
        assert_eq!(v.total, dec!(1030));
    }

    #[test]
    fn test_available_cash_matches_valuation() {
        let holdings = vec![PricedHolding {
            holding: lot("AAPL", dec!(3), dec!(10), Currency::USD),
            market_price: Some(dec!(11)),
            fx_rate: dec!(1),
        }];
        let v = value_portfolio(dec!(100), dec!(5), &holdings);
        assert_eq!(available_cash(dec!(100), dec!(5), dec!(30)), v.cash);
    }
}
