//! TradeLeague Types - Canonical domain types for the paper-trading league
//!
//! This crate has zero dependencies on other tradeleague crates. It defines:
//!
//! - Identity types (AccountId, LeagueId, LotId, etc.)
//! - Currency codes used for quotes, holdings and FX conversion
//! - Market primitives (Symbol, TradeSide)

pub mod identity;
pub mod currency;
pub mod market;
pub mod error;

pub use identity::*;
pub use currency::*;
pub use market::*;
pub use error::*;
