//! Trade DTOs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tradeleague_arena::{LotId, Symbol, TradeReceipt, TradeRequest, TradeSide};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::account::TransactionInfo;
use crate::error::ApiResult;

/// Trade direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TradeSideDto {
    Buy,
    Sell,
}

impl From<TradeSideDto> for TradeSide {
    fn from(side: TradeSideDto) -> Self {
        match side {
            TradeSideDto::Buy => TradeSide::Buy,
            TradeSideDto::Sell => TradeSide::Sell,
        }
    }
}

/// Buy or sell at the latest quote
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct PlaceTradeRequest {
    /// Ticker, e.g. `AAPL` or `SHOP.TO`
    #[validate(length(min = 1, max = 15))]
    pub symbol: String,
    pub side: TradeSideDto,
    /// Shares; must be positive
    #[schema(value_type = String)]
    pub quantity: Decimal,
    /// Lot to sell from; required for sells
    #[serde(default)]
    pub lot_id: Option<Uuid>,
    /// Lock a bought lot against selling for this many days
    #[serde(default)]
    #[validate(range(min = 1))]
    pub lock_days: Option<u32>,
}

impl PlaceTradeRequest {
    pub fn into_domain(self) -> ApiResult<TradeRequest> {
        Ok(TradeRequest {
            symbol: Symbol::new(&self.symbol)?,
            quantity: self.quantity,
            side: self.side.into(),
            lot_id: self.lot_id.map(LotId::from_uuid),
            lock_days: self.lock_days,
        })
    }
}

/// Executed trade
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TradeResponse {
    pub transaction: TransactionInfo,
    #[schema(value_type = String)]
    pub price: Decimal,
    #[schema(value_type = String)]
    pub realized_pnl: Decimal,
    #[schema(value_type = String)]
    pub cash_after: Decimal,
    pub xp_awarded: i64,
    pub leveled_up: bool,
}

impl From<TradeReceipt> for TradeResponse {
    fn from(r: TradeReceipt) -> Self {
        Self {
            transaction: TransactionInfo::from(r.transaction),
            price: r.price,
            realized_pnl: r.realized_pnl,
            cash_after: r.cash_after,
            xp_awarded: r.xp_awarded,
            leveled_up: r.leveled_up,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_into_domain_normalizes_symbol() {
        let req = PlaceTradeRequest {
            symbol: "shop.to".into(),
            side: TradeSideDto::Buy,
            quantity: dec!(3),
            lot_id: None,
            lock_days: Some(7),
        };
        let trade = req.into_domain().unwrap();
        assert_eq!(trade.symbol.as_str(), "SHOP.TO");
        assert_eq!(trade.side, TradeSide::Buy);
        assert_eq!(trade.lock_days, Some(7));
    }

    #[test]
    fn test_invalid_symbol_rejected() {
        let req = PlaceTradeRequest {
            symbol: "BAD SYM".into(),
            side: TradeSideDto::Sell,
            quantity: dec!(1),
            lot_id: None,
            lock_days: None,
        };
        assert!(req.into_domain().is_err());
    }
}
