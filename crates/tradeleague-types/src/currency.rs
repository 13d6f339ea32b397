//! Currency codes for quotes and holdings
//!
//! Portfolios are always valued in a single home currency; a holding keeps
//! the currency its quote was denominated in at purchase time.

use crate::error::TypesError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fiat currency codes (ISO 4217) a listed security can be quoted in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Currency {
    USD,
    CAD,
    EUR,
    GBP,
    JPY,
    CHF,
    AUD,
    HKD,
}

impl Currency {
    /// All supported currencies
    pub const ALL: [Currency; 8] = [
        Self::USD,
        Self::CAD,
        Self::EUR,
        Self::GBP,
        Self::JPY,
        Self::CHF,
        Self::AUD,
        Self::HKD,
    ];

    /// Get the ISO 4217 code
    pub fn code(&self) -> &'static str {
        match self {
            Self::USD => "USD",
            Self::CAD => "CAD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
            Self::JPY => "JPY",
            Self::CHF => "CHF",
            Self::AUD => "AUD",
            Self::HKD => "HKD",
        }
    }

    /// Get the standard decimal places for this currency
    pub fn decimals(&self) -> u32 {
        match self {
            Self::JPY => 0,
            _ => 2,
        }
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self::USD
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.code() == upper)
            .ok_or_else(|| TypesError::UnsupportedCurrency(s.to_string()))
    }
}

impl TryFrom<String> for Currency {
    type Error = TypesError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.code().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("cad".parse::<Currency>().unwrap(), Currency::CAD);
        assert_eq!(" USD ".parse::<Currency>().unwrap(), Currency::USD);
    }

    #[test]
    fn test_unknown_currency() {
        assert!(matches!(
            "XYZ".parse::<Currency>(),
            Err(TypesError::UnsupportedCurrency(_))
        ));
    }

    #[test]
    fn test_lowercase_map_keys_deserialize() {
        let rates: std::collections::HashMap<Currency, f64> =
            serde_json::from_str(r#"{"cad": 0.73}"#).unwrap();
        assert_eq!(rates.get(&Currency::CAD), Some(&0.73));
    }

    #[test]
    fn test_display_matches_code() {
        for c in Currency::ALL {
            assert_eq!(c.to_string(), c.code());
        }
    }
}
