use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Field separator inside an option instrument identifier.
pub const SYMBOL_DELIMITER: char = '-';

const SYMBOL_FIELDS: usize = 4;

#[derive(Debug, Error, PartialEq)]
pub enum SymbolError {
    #[error("symbol `{symbol}` has {found} fields, expected 4")]
    FieldCount { symbol: String, found: usize },

    #[error("symbol `{symbol}` has unparseable expiry `{field}`")]
    Expiry { symbol: String, field: String },

    #[error("symbol `{symbol}` has unparseable strike `{field}`")]
    Strike { symbol: String, field: String },

    #[error("symbol `{symbol}` has unknown option kind `{field}`")]
    Kind { symbol: String, field: String },
}

/// Call or put, encoded as the trailing `C` / `P` of the identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionKind {
    #[serde(rename = "C")]
    Call,
    #[serde(rename = "P")]
    Put,
}

impl OptionKind {
    pub fn code(&self) -> &'static str {
        match self {
            OptionKind::Call => "C",
            OptionKind::Put => "P",
        }
    }
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A parsed option instrument identifier such as `BTC-240101-50000-C`.
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentSymbol {
    pub underlying: String,
    pub expiry: NaiveDate,
    pub strike: f64,
    pub kind: OptionKind,
}

impl InstrumentSymbol {
    /// Parse only the expiry field. The expiry filter needs nothing else, so a
    /// symbol with an odd strike or kind still passes through it.
    pub fn parse_expiry(symbol: &str) -> Result<NaiveDate, SymbolError> {
        let parts = split_fields(symbol)?;
        parse_expiry_field(symbol, parts[1])
    }
}

impl FromStr for InstrumentSymbol {
    type Err = SymbolError;

    fn from_str(symbol: &str) -> Result<Self, Self::Err> {
        let parts = split_fields(symbol)?;
        let expiry = parse_expiry_field(symbol, parts[1])?;

        let strike: f64 = parts[2].parse().map_err(|_| SymbolError::Strike {
            symbol: symbol.to_string(),
            field: parts[2].to_string(),
        })?;
        if !strike.is_finite() {
            return Err(SymbolError::Strike {
                symbol: symbol.to_string(),
                field: parts[2].to_string(),
            });
        }

        let kind = match parts[3] {
            "C" => OptionKind::Call,
            "P" => OptionKind::Put,
            other => {
                return Err(SymbolError::Kind {
                    symbol: symbol.to_string(),
                    field: other.to_string(),
                });
            }
        };

        Ok(InstrumentSymbol {
            underlying: parts[0].to_string(),
            expiry,
            strike,
            kind,
        })
    }
}

fn split_fields(symbol: &str) -> Result<Vec<&str>, SymbolError> {
    let parts: Vec<&str> = symbol.split(SYMBOL_DELIMITER).collect();
    if parts.len() != SYMBOL_FIELDS {
        return Err(SymbolError::FieldCount {
            symbol: symbol.to_string(),
            found: parts.len(),
        });
    }
    Ok(parts)
}

/// Expiry field: two-digit year, month, day (`240101`), year read as 20YY.
fn parse_expiry_field(symbol: &str, field: &str) -> Result<NaiveDate, SymbolError> {
    let err = || SymbolError::Expiry {
        symbol: symbol.to_string(),
        field: field.to_string(),
    };
    if field.len() != 6 || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(err());
    }
    // chrono maps %y 70..=99 to the 1900s, so pin the century explicitly
    NaiveDate::parse_from_str(&format!("20{field}"), "%Y%m%d").map_err(|_| err())
}
