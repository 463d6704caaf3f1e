use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::{FetchError, MarketData};

pub const OPTIONS_API_URL: &str = "https://eapi.binance.com";
pub const SPOT_API_URL: &str = "https://api.binance.com";

const EXCHANGE_INFO_PATH: &str = "/eapi/v1/exchangeInfo";
const MARK_PATH: &str = "/eapi/v1/mark";
const TICKER_PRICE_PATH: &str = "/api/v3/ticker/price";

// ── API response types ───────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ExchangeInfo {
    #[serde(rename = "optionSymbols", default)]
    option_symbols: Vec<OptionSymbolInfo>,
}

#[derive(Debug, Deserialize)]
struct OptionSymbolInfo {
    symbol: String,
}

// ── Client ───────────────────────────────────────────────────────────

/// Binance European options (`eapi`) and spot REST client.
pub struct BinanceClient {
    http: reqwest::Client,
    options_api: String,
    spot_api: String,
}

impl BinanceClient {
    pub fn new(options_api: &str, spot_api: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("btc-options-snapshot/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("creating HTTP client")?;
        Ok(BinanceClient {
            http,
            options_api: options_api.trim_end_matches('/').to_string(),
            spot_api: spot_api.trim_end_matches('/').to_string(),
        })
    }

    /// GET `url` and return the body of a 2xx response.
    async fn get_text(&self, url: &str, query: &[(&str, &str)]) -> Result<String, FetchError> {
        let resp = self.http.get(url).query(query).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl MarketData for BinanceClient {
    async fn option_symbols(&self) -> Result<Vec<String>, FetchError> {
        let url = format!("{}{EXCHANGE_INFO_PATH}", self.options_api);
        let body = self.get_text(&url, &[]).await?;
        parse_exchange_info(&body)
    }

    async fn spot_price(&self, pair: &str) -> Result<f64, FetchError> {
        let url = format!("{}{TICKER_PRICE_PATH}", self.spot_api);
        let body = self.get_text(&url, &[("symbol", pair)]).await?;
        parse_ticker_price(&body)
    }

    async fn mark_price(&self, symbol: &str) -> Result<f64, FetchError> {
        let url = format!("{}{MARK_PATH}", self.options_api);
        let body = self.get_text(&url, &[("symbol", symbol)]).await?;
        parse_mark_price(&body)
    }
}

// ── Response parsing ─────────────────────────────────────────────────

fn parse_exchange_info(body: &str) -> Result<Vec<String>, FetchError> {
    let info: ExchangeInfo = serde_json::from_str(body)
        .map_err(|e| FetchError::Malformed(format!("exchangeInfo: {e}")))?;
    Ok(info.option_symbols.into_iter().map(|s| s.symbol).collect())
}

/// `{"symbol":"BTCUSDT","price":"65000.00"}`
fn parse_ticker_price(body: &str) -> Result<f64, FetchError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| FetchError::Malformed(format!("ticker: {e}")))?;
    let price = value
        .get("price")
        .ok_or_else(|| FetchError::Malformed("ticker has no `price` field".into()))?;
    decimal(price).ok_or_else(|| FetchError::Malformed(format!("ticker price `{price}` is not a number")))
}

/// `[{"symbol":"BTC-240101-50000-C","markPrice":"1200.5", ...}]`
///
/// A missing or null `markPrice` is an error, not zero.
fn parse_mark_price(body: &str) -> Result<f64, FetchError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| FetchError::Malformed(format!("mark: {e}")))?;
    let first = match value.as_array().and_then(|items| items.first()) {
        Some(first) => first,
        None => return Err(FetchError::Malformed("mark response is not a non-empty list".into())),
    };
    match first.get("markPrice") {
        None | Some(Value::Null) => Err(FetchError::Malformed("mark has no `markPrice` field".into())),
        Some(price) => decimal(price)
            .ok_or_else(|| FetchError::Malformed(format!("markPrice `{price}` is not a number"))),
    }
}

/// Binance sends decimals as strings; accept plain JSON numbers too.
fn decimal(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exchange_info() {
        let body = r#"{"timezone":"UTC","optionSymbols":[
            {"symbol":"BTC-240101-50000-C","side":"CALL"},
            {"symbol":"ETH-240101-2000-P","side":"PUT"}]}"#;
        assert_eq!(
            parse_exchange_info(body).unwrap(),
            vec!["BTC-240101-50000-C", "ETH-240101-2000-P"]
        );

        assert!(parse_exchange_info(r#"{"timezone":"UTC"}"#).unwrap().is_empty());
        assert!(matches!(
            parse_exchange_info("<html>"),
            Err(FetchError::Malformed(_))
        ));
    }

    #[test]
    fn test_ticker_price() {
        let price = parse_ticker_price(r#"{"symbol":"BTCUSDT","price":"65000.00"}"#).unwrap();
        assert_eq!(price, 65000.0);
        assert!(parse_ticker_price(r#"{"symbol":"BTCUSDT"}"#).is_err());
        assert!(parse_ticker_price(r#"{"price":"n/a"}"#).is_err());
    }

    #[test]
    fn test_mark_price() {
        let body = r#"[{"symbol":"BTC-240101-50000-C","markPrice":"1200.5"}]"#;
        assert_eq!(parse_mark_price(body).unwrap(), 1200.5);
        assert_eq!(parse_mark_price(r#"[{"markPrice":300}]"#).unwrap(), 300.0);

        // absent, null, empty list, object-shaped error body
        assert!(parse_mark_price(r#"[{"symbol":"X"}]"#).is_err());
        assert!(parse_mark_price(r#"[{"markPrice":null}]"#).is_err());
        assert!(parse_mark_price("[]").is_err());
        assert!(parse_mark_price(r#"{"code":-1121,"msg":"Invalid symbol."}"#).is_err());
    }
}
