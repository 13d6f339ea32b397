//! Currency conversion into the home currency

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tradeleague_types::Currency;

use crate::error::{MarketDataError, MarketDataResult};

/// Default CAD to USD conversion constant
pub const DEFAULT_CAD_USD_RATE: Decimal = dec!(0.73);

/// Source of conversion rates into a single home currency
#[async_trait]
pub trait FxRateProvider: Send + Sync {
    /// Currency every valuation is expressed in
    fn home_currency(&self) -> Currency;

    /// Multiplier converting one unit of `from` into the home currency
    async fn rate_to_home(&self, from: Currency) -> MarketDataResult<Decimal>;
}

/// Fixed conversion constants, one per foreign currency
#[derive(Debug, Clone)]
pub struct StaticFxRates {
    home: Currency,
    rates: HashMap<Currency, Decimal>,
}

impl StaticFxRates {
    /// Rates with no foreign currencies configured
    pub fn new(home: Currency) -> Self {
        Self {
            home,
            rates: HashMap::new(),
        }
    }

    /// Add a conversion constant for `from`
    pub fn with_rate(mut self, from: Currency, rate: Decimal) -> Self {
        self.rates.insert(from, rate);
        self
    }

    /// Look up a rate without going through the async trait
    pub fn get(&self, from: Currency) -> MarketDataResult<Decimal> {
        if from == self.home {
            return Ok(Decimal::ONE);
        }
        self.rates
            .get(&from)
            .copied()
            .ok_or(MarketDataError::MissingRate {
                from,
                to: self.home,
            })
    }

    /// Convert `amount` denominated in `from` into the home currency
    pub fn convert(&self, amount: Decimal, from: Currency) -> MarketDataResult<Decimal> {
        Ok(amount * self.get(from)?)
    }
}

impl Default for StaticFxRates {
    fn default() -> Self {
        Self::new(Currency::USD).with_rate(Currency::CAD, DEFAULT_CAD_USD_RATE)
    }
}

#[async_trait]
impl FxRateProvider for StaticFxRates {
    fn home_currency(&self) -> Currency {
        self.home
    }

    async fn rate_to_home(&self, from: Currency) -> MarketDataResult<Decimal> {
        self.get(from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_home_currency_rate_is_one() {
        let fx = StaticFxRates::default();
        assert_eq!(fx.get(Currency::USD).unwrap(), Decimal::ONE);
    }

    #[test]
    fn test_default_cad_constant() {
        let fx = StaticFxRates::default();
        assert_eq!(fx.convert(dec!(100), Currency::CAD).unwrap(), dec!(73.00));
    }

    #[test]
    fn test_missing_rate() {
        let fx = StaticFxRates::default();
        assert!(matches!(
            fx.get(Currency::JPY),
            Err(MarketDataError::MissingRate { from: Currency::JPY, to: Currency::USD })
        ));
    }

    #[tokio::test]
    async fn test_trait_lookup() {
        let fx = StaticFxRates::new(Currency::CAD).with_rate(Currency::USD, dec!(1.37));
        assert_eq!(fx.home_currency(), Currency::CAD);
        assert_eq!(fx.rate_to_home(Currency::USD).await.unwrap(), dec!(1.37));
    }
}
