//! In-process quote table for tests and the memory-backed dev server

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use tradeleague_types::{Currency, Symbol};

use crate::error::{MarketDataError, MarketDataResult};
use crate::quote::{Quote, QuoteProvider};

/// Quote provider serving prices from a mutable table
#[derive(Debug, Default)]
pub struct StaticQuoteProvider {
    prices: RwLock<HashMap<Symbol, (Decimal, Currency)>>,
}

impl StaticQuoteProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or replace) the price of a symbol
    pub fn set_price(&self, symbol: Symbol, price: Decimal, currency: Currency) {
        self.prices.write().insert(symbol, (price, currency));
    }

    /// Remove a symbol so later lookups fail
    pub fn remove(&self, symbol: &Symbol) {
        self.prices.write().remove(symbol);
    }
}

#[async_trait]
impl QuoteProvider for StaticQuoteProvider {
    fn name(&self) -> &'static str {
        "STATIC"
    }

    async fn latest_quote(&self, symbol: &Symbol) -> MarketDataResult<Quote> {
        let (price, currency) = self
            .prices
            .read()
            .get(symbol)
            .copied()
            .ok_or_else(|| MarketDataError::SymbolNotFound(symbol.to_string()))?;
        Ok(Quote {
            symbol: symbol.clone(),
            price,
            currency,
            as_of: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_set_and_remove() {
        let provider = StaticQuoteProvider::new();
        let msft = Symbol::new("MSFT").unwrap();
        provider.set_price(msft.clone(), dec!(410), Currency::USD);
        assert_eq!(provider.latest_quote(&msft).await.unwrap().price, dec!(410));

        provider.remove(&msft);
        assert!(provider.latest_quote(&msft).await.unwrap_err().is_not_found());
    }
}
