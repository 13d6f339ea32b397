//! TradeLeague Market Data - quotes and currency conversion
//!
//! Portfolio valuation needs two external inputs: the latest price of a
//! symbol and the rate that converts the symbol's quote currency into the
//! home currency. Both sit behind traits so the arena core never talks to
//! an HTTP API directly.
//!
//! # Features
//!
//! - **QuoteProvider**: latest price lookups (`YahooQuoteProvider` for the
//!   public chart API, `StaticQuoteProvider` for fixtures and dev mode)
//! - **FxRateProvider**: conversion into the home currency (`StaticFxRates`
//!   holds one configured constant per foreign currency)
//!
//! Every external call is attempted once. Callers decide how to degrade.

pub mod error;
pub mod quote;
pub mod fx;
pub mod yahoo;
pub mod fixed;

pub use error::{MarketDataError, MarketDataResult};
pub use quote::{Quote, QuoteProvider};
pub use fx::{FxRateProvider, StaticFxRates, DEFAULT_CAD_USD_RATE};
pub use yahoo::YahooQuoteProvider;
pub use fixed::StaticQuoteProvider;
