use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::symbol::OptionKind;

/// Dataset column names, in field order of [`OptionQuoteRow`].
///
/// `BTC Spot Price` keeps its name whatever underlying is collected, so
/// datasets written by earlier runs stay readable.
pub const DATASET_HEADER: [&str; 7] = [
    "Date",
    "Expiry",
    "Strike",
    "Option Type",
    "Mark Price",
    "BTC Spot Price",
    "Symbol",
];

/// One row of the near-expiry options dataset.
///
/// Column names match [`DATASET_HEADER`], so files written by earlier runs
/// load without translation.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct OptionQuoteRow {
    /// Observation date (local calendar day of the run).
    #[serde(rename = "Date", with = "date_column")]
    pub date: NaiveDate,
    #[serde(rename = "Expiry", with = "date_column")]
    pub expiry: NaiveDate,
    #[serde(rename = "Strike")]
    pub strike: f64,
    #[serde(rename = "Option Type")]
    pub option_type: OptionKind,
    #[serde(rename = "Mark Price")]
    pub mark_price: f64,
    /// Spot price of the underlying pair, whichever asset that is.
    #[serde(rename = "BTC Spot Price")]
    pub spot_price: f64,
    /// Instrument identifier, the dataset's unique key.
    #[serde(rename = "Symbol")]
    pub symbol: String,
}

/// Dates are written as `YYYY-MM-DD`. On read a trailing midnight time
/// (`YYYY-MM-DD 00:00:00`) is also accepted.
mod date_column {
    use chrono::{NaiveDate, NaiveDateTime};
    use serde::{Deserialize, Deserializer, Serializer};

    const DATE_FORMAT: &str = "%Y-%m-%d";
    const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

    pub fn serialize<S: Serializer>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&date.format(DATE_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(d)?;
        let raw = raw.trim();
        if let Ok(date) = NaiveDate::parse_from_str(raw, DATE_FORMAT) {
            return Ok(date);
        }
        DATETIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|dt| dt.date())
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date `{raw}`")))
    }
}
