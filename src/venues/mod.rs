pub mod binance;

use async_trait::async_trait;
use thiserror::Error;

pub use binance::BinanceClient;

// ── Errors ──────────────────────────────────────────────────────────

/// Failure of a single market-data request.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected response: {0}")]
    Malformed(String),
}

// ── Market data trait ───────────────────────────────────────────────

/// Read-only view of an exchange's public option and spot market data.
///
/// The live implementation is [`BinanceClient`]; tests substitute an
/// in-memory mock.
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Every listed option instrument identifier, across all underlyings.
    async fn option_symbols(&self) -> Result<Vec<String>, FetchError>;

    /// Latest traded price of a spot pair such as `BTCUSDT`.
    async fn spot_price(&self, pair: &str) -> Result<f64, FetchError>;

    /// Current mark price of one option instrument.
    async fn mark_price(&self, symbol: &str) -> Result<f64, FetchError>;
}
