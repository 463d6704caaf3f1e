pub mod csv_types;

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

pub use csv_types::{DATASET_HEADER, OptionQuoteRow};

/// Counts reported after a dataset merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeSummary {
    /// Rows loaded from the prior dataset file.
    pub existing: usize,
    /// Rows built in this run.
    pub fetched: usize,
    /// Rows dropped because their symbol was already present.
    pub duplicates: usize,
    /// Rows in the merged dataset.
    pub total: usize,
}

/// Load CSV rows of type T from a file.
pub fn load_csv<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("opening CSV file {}", path.display()))?;
    let rows: Vec<T> = rdr
        .deserialize()
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("parsing CSV file {}", path.display()))?;
    Ok(rows)
}

/// Write `header` and then `rows` to `path`, replacing any existing file.
///
/// The header is written even when `rows` is empty. Rows go to a sibling
/// `.tmp` file first and are renamed into place, so a failed write leaves the
/// previous file untouched and no temp file behind.
pub fn write_csv<T: Serialize>(path: &Path, header: &[&str], rows: &[T]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating dataset dir {}", parent.display()))?;
    }

    let tmp = path.with_extension("csv.tmp");
    let written = write_rows(&tmp, header, rows).and_then(|()| {
        std::fs::rename(&tmp, path)
            .with_context(|| format!("renaming {} -> {}", tmp.display(), path.display()))
    });
    if written.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    written
}

fn write_rows<T: Serialize>(tmp: &Path, header: &[&str], rows: &[T]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(tmp)
        .with_context(|| format!("creating CSV file {}", tmp.display()))?;
    wtr.write_record(header)
        .with_context(|| format!("writing CSV header to {}", tmp.display()))?;
    for row in rows {
        wtr.serialize(row)
            .with_context(|| format!("writing CSV row to {}", tmp.display()))?;
    }
    wtr.flush()
        .with_context(|| format!("flushing CSV file {}", tmp.display()))?;
    Ok(())
}

/// Load the prior dataset, or an empty one if the file does not exist yet.
pub fn load_dataset(path: &Path) -> Result<Vec<OptionQuoteRow>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    load_csv(path)
}

/// Concatenate `fetched` after `existing` and drop every row whose symbol has
/// already been seen. The first occurrence wins, so prior data is never
/// replaced by a fresh quote for the same symbol.
pub fn merge_rows(
    existing: Vec<OptionQuoteRow>,
    fetched: Vec<OptionQuoteRow>,
) -> (Vec<OptionQuoteRow>, MergeSummary) {
    let existing_len = existing.len();
    let fetched_len = fetched.len();

    let mut seen: HashSet<String> = HashSet::with_capacity(existing_len + fetched_len);
    let merged: Vec<OptionQuoteRow> = existing
        .into_iter()
        .chain(fetched)
        .filter(|row| seen.insert(row.symbol.clone()))
        .collect();

    let summary = MergeSummary {
        existing: existing_len,
        fetched: fetched_len,
        duplicates: existing_len + fetched_len - merged.len(),
        total: merged.len(),
    };
    (merged, summary)
}

/// Read-merge-write the dataset at `path` with freshly fetched rows.
pub fn merge_into_dataset(path: &Path, fetched: Vec<OptionQuoteRow>) -> Result<MergeSummary> {
    let existing = load_dataset(path)?;
    let (merged, summary) = merge_rows(existing, fetched);
    write_dataset(path, &merged)?;
    Ok(summary)
}

/// Overwrite the dataset at `path` with `rows`, header included.
pub fn write_dataset(path: &Path, rows: &[OptionQuoteRow]) -> Result<()> {
    write_csv(path, &DATASET_HEADER, rows)
}
