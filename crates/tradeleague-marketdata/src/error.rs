//! Market data errors

use thiserror::Error;
use tradeleague_types::Currency;

/// Result type for market data operations
pub type MarketDataResult<T> = Result<T, MarketDataError>;

/// Market data errors
#[derive(Debug, Error)]
pub enum MarketDataError {
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("Provider {provider} error: {message}")]
    Provider { provider: &'static str, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Parsing error: {0}")]
    Parse(String),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Request timed out")]
    Timeout,

    #[error("No FX rate configured for {from} -> {to}")]
    MissingRate { from: Currency, to: Currency },
}

impl MarketDataError {
    /// Whether the symbol itself is unknown, as opposed to a transient failure
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::SymbolNotFound(_))
    }
}
