//! Yahoo Finance chart API quote provider

use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use tradeleague_types::{Currency, Symbol};

use crate::error::{MarketDataError, MarketDataResult};
use crate::quote::{Quote, QuoteProvider};

const PROVIDER: &str = "YAHOO";
const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
const USER_AGENT: &str = "Mozilla/5.0 (compatible; tradeleague/0.1)";

// ============================================================================
// Wire format
// ============================================================================

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    currency: Option<String>,
    regular_market_price: Option<f64>,
    regular_market_time: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: Option<String>,
}

/// Quote provider backed by the public chart endpoint
pub struct YahooQuoteProvider {
    client: Client,
    base_url: String,
}

impl YahooQuoteProvider {
    /// Build a provider with a per-request timeout
    pub fn new(timeout: Duration) -> MarketDataResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Point the provider at a different host (proxies, test servers)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn chart_url(&self, symbol: &Symbol) -> String {
        format!(
            "{}/v8/finance/chart/{}?interval=1d&range=1d",
            self.base_url, symbol
        )
    }
}

/// Sub-unit codes Yahoo quotes in (case-sensitive), with their major
/// currency and scale
const MINOR_UNITS: [(&str, Currency, Decimal); 2] = [
    ("GBp", Currency::GBP, dec!(0.01)),
    ("GBX", Currency::GBP, dec!(0.01)),
];

fn minor_unit(code: &str) -> Option<(Currency, Decimal)> {
    MINOR_UNITS
        .iter()
        .find(|(minor, _, _)| *minor == code)
        .map(|(_, major, factor)| (*major, *factor))
}

/// Extract the latest price from a chart response body
pub(crate) fn parse_chart_response(symbol: &Symbol, body: &str) -> MarketDataResult<Quote> {
    let envelope: ChartEnvelope =
        serde_json::from_str(body).map_err(|e| MarketDataError::Parse(e.to_string()))?;

    if let Some(err) = envelope.chart.error {
        if err.code.eq_ignore_ascii_case("not found") {
            return Err(MarketDataError::SymbolNotFound(symbol.to_string()));
        }
        return Err(MarketDataError::Provider {
            provider: PROVIDER,
            message: err.description.unwrap_or(err.code),
        });
    }

    let meta = envelope
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .map(|r| r.meta)
        .ok_or_else(|| MarketDataError::SymbolNotFound(symbol.to_string()))?;

    let raw_price = meta
        .regular_market_price
        .ok_or_else(|| MarketDataError::Parse(format!("no market price for {}", symbol)))?;
    let price = Decimal::from_f64_retain(raw_price)
        .map(|p| p.round_dp(6))
        .filter(|p| *p > Decimal::ZERO)
        .ok_or_else(|| MarketDataError::Parse(format!("invalid price {} for {}", raw_price, symbol)))?;

    let (currency, price) = match meta.currency.as_deref() {
        Some(code) => match minor_unit(code) {
            Some((major, factor)) => (major, price * factor),
            None => (
                code.parse::<Currency>()
                    .map_err(|e| MarketDataError::Parse(e.to_string()))?,
                price,
            ),
        },
        None => (Currency::default(), price),
    };

    let as_of = meta
        .regular_market_time
        .and_then(|ts| Utc.timestamp_opt(ts, 0).single())
        .unwrap_or_else(Utc::now);

    Ok(Quote {
        symbol: symbol.clone(),
        price,
        currency,
        as_of,
    })
}

#[async_trait]
impl QuoteProvider for YahooQuoteProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn latest_quote(&self, symbol: &Symbol) -> MarketDataResult<Quote> {
        let url = self.chart_url(symbol);
        tracing::debug!(%symbol, %url, "Fetching quote");

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                MarketDataError::Timeout
            } else {
                MarketDataError::Network(e)
            }
        })?;

        match response.status() {
            StatusCode::TOO_MANY_REQUESTS => return Err(MarketDataError::RateLimited),
            StatusCode::NOT_FOUND => return Err(MarketDataError::SymbolNotFound(symbol.to_string())),
            status if !status.is_success() => {
                return Err(MarketDataError::Provider {
                    provider: PROVIDER,
                    message: format!("HTTP {}", status),
                })
            }
            _ => {}
        }

        let body = response.text().await?;
        parse_chart_response(symbol, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn aapl() -> Symbol {
        Symbol::new("AAPL").unwrap()
    }

    #[test]
    fn test_parse_regular_market_price() {
        let body = r#"{"chart":{"result":[{"meta":{"currency":"USD","symbol":"AAPL",
            "regularMarketPrice":189.25,"regularMarketTime":1700000000}}],"error":null}}"#;
        let quote = parse_chart_response(&aapl(), body).unwrap();
        assert_eq!(quote.price, dec!(189.25));
        assert_eq!(quote.currency, Currency::USD);
        assert_eq!(quote.as_of.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_parse_foreign_currency() {
        let body = r#"{"chart":{"result":[{"meta":{"currency":"CAD","regularMarketPrice":101.5}}],"error":null}}"#;
        let quote = parse_chart_response(&Symbol::new("SHOP.TO").unwrap(), body).unwrap();
        assert_eq!(quote.currency, Currency::CAD);
    }

    #[test]
    fn test_parse_pence_quote_as_pounds() {
        let vod = Symbol::new("VOD.L").unwrap();
        let body = r#"{"chart":{"result":[{"meta":{"currency":"GBp","regularMarketPrice":1234.5}}],"error":null}}"#;
        let quote = parse_chart_response(&vod, body).unwrap();
        assert_eq!(quote.currency, Currency::GBP);
        assert_eq!(quote.price, dec!(12.345));

        let body = r#"{"chart":{"result":[{"meta":{"currency":"GBX","regularMarketPrice":250}}],"error":null}}"#;
        let quote = parse_chart_response(&vod, body).unwrap();
        assert_eq!(quote.price, dec!(2.5));

        let body = r#"{"chart":{"result":[{"meta":{"currency":"GBP","regularMarketPrice":12.5}}],"error":null}}"#;
        assert_eq!(parse_chart_response(&vod, body).unwrap().price, dec!(12.5));
    }

    #[test]
    fn test_parse_not_found_error() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let err = parse_chart_response(&aapl(), body).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_parse_missing_price() {
        let body = r#"{"chart":{"result":[{"meta":{"currency":"USD"}}],"error":null}}"#;
        assert!(matches!(
            parse_chart_response(&aapl(), body),
            Err(MarketDataError::Parse(_))
        ));
    }

    #[test]
    fn test_chart_url() {
        let provider = YahooQuoteProvider::new(Duration::from_secs(1))
            .unwrap()
            .with_base_url("http://localhost:9000/");
        assert_eq!(
            provider.chart_url(&aapl()),
            "http://localhost:9000/v8/finance/chart/AAPL?interval=1d&range=1d"
        );
    }
}
