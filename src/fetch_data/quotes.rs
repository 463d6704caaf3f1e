use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::data::OptionQuoteRow;
use crate::symbol::InstrumentSymbol;
use crate::venues::MarketData;

/// Latest spot price for `pair`, or `None` (logged) if it cannot be obtained.
/// A zero or negative price counts as missing.
pub async fn lookup_spot(market: &dyn MarketData, pair: &str) -> Option<f64> {
    match market.spot_price(pair).await {
        Ok(price) if price > 0.0 => Some(price),
        Ok(price) => {
            warn!("Ignoring non-positive {pair} spot price {price}");
            None
        }
        Err(e) => {
            warn!("Failed to get {pair} spot price: {e}");
            None
        }
    }
}

/// Current mark price for one option, or `None` (logged) if unavailable.
pub async fn lookup_mark(market: &dyn MarketData, symbol: &str) -> Option<f64> {
    match market.mark_price(symbol).await {
        Ok(price) => Some(price),
        Err(e) => {
            warn!("No mark price for {symbol}: {e}");
            None
        }
    }
}

/// Build one dataset row per symbol with a mark price.
///
/// The spot price is fetched once and shared by every row. Without it the
/// whole batch is abandoned and no rows are returned. With `concurrency <= 1`
/// mark prices are fetched one at a time in input order; otherwise at most
/// `concurrency` requests are in flight. Rows always follow input order.
pub async fn build_records(
    market: Arc<dyn MarketData>,
    symbols: &[String],
    spot_pair: &str,
    today: NaiveDate,
    concurrency: usize,
) -> Vec<OptionQuoteRow> {
    let Some(spot) = lookup_spot(market.as_ref(), spot_pair).await else {
        warn!("No spot price, skipping {} option quotes", symbols.len());
        return Vec::new();
    };
    info!("{spot_pair} spot price: {spot}");

    let marks = if concurrency <= 1 {
        fetch_marks_sequential(market.as_ref(), symbols).await
    } else {
        fetch_marks_concurrent(market, symbols, concurrency).await
    };

    symbols
        .iter()
        .zip(marks)
        .filter_map(|(symbol, mark)| {
            let mark_price = mark?;
            let parsed: InstrumentSymbol = match symbol.parse() {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!("Skipping {e}");
                    return None;
                }
            };
            Some(OptionQuoteRow {
                date: today,
                expiry: parsed.expiry,
                strike: parsed.strike,
                option_type: parsed.kind,
                mark_price,
                spot_price: spot,
                symbol: symbol.clone(),
            })
        })
        .collect()
}

async fn fetch_marks_sequential(market: &dyn MarketData, symbols: &[String]) -> Vec<Option<f64>> {
    let mut marks = Vec::with_capacity(symbols.len());
    for (i, symbol) in symbols.iter().enumerate() {
        debug!("[{}/{}] mark price {symbol}", i + 1, symbols.len());
        marks.push(lookup_mark(market, symbol).await);
    }
    marks
}

async fn fetch_marks_concurrent(
    market: Arc<dyn MarketData>,
    symbols: &[String],
    concurrency: usize,
) -> Vec<Option<f64>> {
    let permits = Arc::new(Semaphore::new(concurrency));
    let mut tasks = JoinSet::new();

    for (i, symbol) in symbols.iter().enumerate() {
        let market = Arc::clone(&market);
        let permits = Arc::clone(&permits);
        let symbol = symbol.clone();
        tasks.spawn(async move {
            // the semaphore is never closed
            let _permit = permits.acquire_owned().await.ok();
            (i, lookup_mark(market.as_ref(), &symbol).await)
        });
    }

    let mut marks = vec![None; symbols.len()];
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((i, mark)) => marks[i] = mark,
            Err(e) => warn!("Mark price task failed: {e}"),
        }
    }
    marks
}
