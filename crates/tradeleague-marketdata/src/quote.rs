//! Quote model and provider trait

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tradeleague_types::{Currency, Symbol};

use crate::error::MarketDataResult;

/// Latest traded price of a symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: Symbol,
    pub price: Decimal,
    pub currency: Currency,
    pub as_of: DateTime<Utc>,
}

/// Source of latest prices
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Short provider name used in logs and errors
    fn name(&self) -> &'static str;

    /// Fetch the latest quote for `symbol`
    async fn latest_quote(&self, symbol: &Symbol) -> MarketDataResult<Quote>;
}
