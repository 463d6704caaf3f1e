pub mod discovery;
pub mod expiry;
pub mod quotes;

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use tracing::info;

use crate::config::SnapshotConfig;
use crate::data::{self, MergeSummary};
use crate::venues::{BinanceClient, MarketData};

/// Outcome of one snapshot run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    /// Symbols that survived the expiry filter.
    pub near_expiry: usize,
    /// Rows built from this run's quotes.
    pub fetched: usize,
    pub merge: MergeSummary,
}

/// Run the snapshot against the live exchange: discover, filter, quote, merge.
pub fn run(config: &SnapshotConfig) -> Result<RunReport> {
    let rt = tokio::runtime::Runtime::new().context("creating async runtime")?;
    rt.block_on(async {
        let market: Arc<dyn MarketData> = Arc::new(BinanceClient::new(
            &config.options_api,
            &config.spot_api,
            config.timeout,
        )?);
        let now = chrono::Local::now().naive_local();
        snapshot(market, config, now).await
    })
}

/// The whole pipeline against any market-data source, as of `now`.
pub async fn snapshot(
    market: Arc<dyn MarketData>,
    config: &SnapshotConfig,
    now: NaiveDateTime,
) -> Result<RunReport> {
    // 1. Symbol discovery
    let symbols = discovery::discover_symbols(market.as_ref(), &config.underlying).await;

    // 2. Expiry filter
    let near_expiry = expiry::filter_by_expiry(&symbols, config.lookahead_days, now);
    info!(
        "Found {} {} options expiring in the next {} days",
        near_expiry.len(),
        config.underlying,
        config.lookahead_days
    );

    // 3. Quote enrichment
    let rows = quotes::build_records(
        market,
        &near_expiry,
        &config.spot_pair,
        now.date(),
        config.concurrency,
    )
    .await;
    let fetched = rows.len();

    // 4. Persistence merge
    let merge = data::merge_into_dataset(&config.dataset, rows)
        .with_context(|| format!("updating dataset {}", config.dataset.display()))?;
    info!(
        "Wrote {} rows to {} ({} new quotes, {} duplicates dropped)",
        merge.total,
        config.dataset.display(),
        fetched,
        merge.duplicates
    );

    Ok(RunReport {
        near_expiry: near_expiry.len(),
        fetched,
        merge,
    })
}
