use clap::Parser;
use std::path::PathBuf;
use tracing::Level;

/// Snapshot near-expiry BTC option mark prices from Binance into a CSV dataset.
///
/// Each run appends newly seen option symbols to the dataset; symbols already
/// present are left as they are. Meant to be driven by an external scheduler.
#[derive(Parser)]
#[command(name = "btc-options-snapshot", version, about)]
pub struct Cli {
    /// Path of the CSV dataset to merge into
    #[arg(long, env = "OPTIONS_SNAPSHOT_DATASET", default_value = "btc_options_near_expiry.csv")]
    pub dataset: PathBuf,

    /// Underlying asset whose options are collected. Its spot price is still
    /// stored in the `BTC Spot Price` column
    #[arg(long, default_value = "BTC")]
    pub underlying: String,

    /// Spot pair used for the underlying price
    #[arg(long, default_value = "BTCUSDT")]
    pub spot_pair: String,

    /// Keep options expiring within this many days
    #[arg(long, default_value = "6")]
    pub lookahead_days: u32,

    /// Base URL of the options market-data API
    #[arg(long, env = "OPTIONS_SNAPSHOT_OPTIONS_API", default_value = crate::venues::binance::OPTIONS_API_URL)]
    pub options_api: String,

    /// Base URL of the spot market-data API
    #[arg(long, env = "OPTIONS_SNAPSHOT_SPOT_API", default_value = crate::venues::binance::SPOT_API_URL)]
    pub spot_api: String,

    /// Per-request HTTP timeout in seconds
    #[arg(long, default_value = "30")]
    pub timeout_secs: u64,

    /// Maximum mark-price requests in flight (1 = strictly sequential)
    #[arg(long, default_value = "1")]
    pub concurrency: usize,

    /// Exit with status 2 when no new quotes were fetched
    #[arg(long)]
    pub strict: bool,

    /// Log level: trace, debug, info, warn, error
    #[arg(long, default_value = "info")]
    pub log_level: Level,
}
