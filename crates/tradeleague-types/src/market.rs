//! Market primitives: ticker symbols and trade sides

use crate::error::TypesError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Longest ticker accepted (covers exchange suffixes like `SHOP.TO`)
pub const MAX_SYMBOL_LEN: usize = 15;

/// A normalized (uppercase) ticker symbol
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Validate and normalize a ticker
    pub fn new(raw: impl AsRef<str>) -> Result<Self, TypesError> {
        let s = raw.as_ref().trim().to_ascii_uppercase();
        let valid_char = |c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '=');
        if s.is_empty() || s.len() > MAX_SYMBOL_LEN || !s.chars().all(valid_char) {
            return Err(TypesError::InvalidSymbol(raw.as_ref().to_string()));
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Symbol {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Symbol {
    type Error = TypesError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.0
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Direction of a trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradeSide {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "buy" => Ok(Self::Buy),
            "sell" => Ok(Self::Sell),
            _ => Err(TypesError::InvalidSide(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_normalizes_case() {
        assert_eq!(Symbol::new(" aapl ").unwrap().as_str(), "AAPL");
        assert_eq!(Symbol::new("shop.to").unwrap().as_str(), "SHOP.TO");
    }

    #[test]
    fn test_symbol_rejects_invalid() {
        assert!(Symbol::new("").is_err());
        assert!(Symbol::new("AAPL; DROP").is_err());
        assert!(Symbol::new("A".repeat(MAX_SYMBOL_LEN + 1)).is_err());
    }

    #[test]
    fn test_symbol_deserialize_validates() {
        let ok: Symbol = serde_json::from_str("\"msft\"").unwrap();
        assert_eq!(ok.as_str(), "MSFT");
        assert!(serde_json::from_str::<Symbol>("\"bad symbol\"").is_err());
    }

    #[test]
    fn test_trade_side_serde() {
        assert_eq!(serde_json::to_string(&TradeSide::Buy).unwrap(), "\"buy\"");
        assert_eq!("SELL".parse::<TradeSide>().unwrap(), TradeSide::Sell);
    }
}
