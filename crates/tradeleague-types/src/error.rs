//! Error types for TradeLeague primitives

use thiserror::Error;

/// Result type for primitive parsing
pub type TypesResult<T> = std::result::Result<T, TypesError>;

/// Errors raised while constructing domain primitives
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypesError {
    /// Symbol is empty, too long, or has characters outside the ticker alphabet
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// Currency code is not supported
    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),

    /// Trade side is neither buy nor sell
    #[error("Invalid trade side: {0}")]
    InvalidSide(String),
}
