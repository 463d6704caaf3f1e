use chrono::{NaiveDateTime, NaiveTime, TimeDelta};
use tracing::warn;

use crate::symbol::InstrumentSymbol;

/// Keep the symbols that expire on or before `now + lookahead_days`.
///
/// A symbol's expiry is taken as midnight of its expiry date. Symbols that do
/// not parse are logged and skipped; order is preserved. A window reaching
/// past the representable date range keeps every parseable symbol.
pub fn filter_by_expiry(symbols: &[String], lookahead_days: u32, now: NaiveDateTime) -> Vec<String> {
    let cutoff = now
        .checked_add_signed(TimeDelta::days(i64::from(lookahead_days)))
        .unwrap_or(NaiveDateTime::MAX);

    symbols
        .iter()
        .filter(|symbol| match InstrumentSymbol::parse_expiry(symbol) {
            Ok(expiry) => expiry.and_time(NaiveTime::MIN) <= cutoff,
            Err(e) => {
                warn!("Skipping {e}");
                false
            }
        })
        .cloned()
        .collect()
}
