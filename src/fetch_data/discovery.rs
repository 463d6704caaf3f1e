use tracing::{info, warn};

use crate::symbol::SYMBOL_DELIMITER;
use crate::venues::MarketData;

/// List every option identifier whose underlying field equals `underlying`.
///
/// Fails soft: any request or response error is logged and yields an empty list.
pub async fn discover_symbols(market: &dyn MarketData, underlying: &str) -> Vec<String> {
    let all = match market.option_symbols().await {
        Ok(all) => all,
        Err(e) => {
            warn!("Failed to fetch option symbols: {e}");
            return Vec::new();
        }
    };

    let total = all.len();
    let symbols: Vec<String> = all
        .into_iter()
        .filter(|s| s.split(SYMBOL_DELIMITER).next() == Some(underlying))
        .collect();
    info!("Discovered {} {underlying} option symbols ({total} listed)", symbols.len());
    symbols
}
