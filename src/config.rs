use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, bail};

use crate::cli::Cli;

/// Resolved configuration for one snapshot run.
#[derive(Debug, Clone)]
pub struct SnapshotConfig {
    pub dataset: PathBuf,
    pub underlying: String,
    pub spot_pair: String,
    pub lookahead_days: u32,
    pub options_api: String,
    pub spot_api: String,
    pub timeout: Duration,
    pub concurrency: usize,
    pub strict: bool,
}

impl SnapshotConfig {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let underlying = cli.underlying.trim().to_uppercase();
        if underlying.is_empty() {
            bail!("--underlying must not be empty");
        }
        let spot_pair = cli.spot_pair.trim().to_uppercase();
        if spot_pair.is_empty() {
            bail!("--spot-pair must not be empty");
        }
        if cli.concurrency == 0 {
            bail!("--concurrency must be at least 1");
        }
        if cli.timeout_secs == 0 {
            bail!("--timeout-secs must be at least 1");
        }
        for (flag, url) in [("--options-api", &cli.options_api), ("--spot-api", &cli.spot_api)] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                bail!("Invalid {flag} '{url}'. Expected an http(s) URL.");
            }
        }

        Ok(SnapshotConfig {
            dataset: cli.dataset.clone(),
            underlying,
            spot_pair,
            lookahead_days: cli.lookahead_days,
            options_api: cli.options_api.clone(),
            spot_api: cli.spot_api.clone(),
            timeout: Duration::from_secs(cli.timeout_secs),
            concurrency: cli.concurrency,
            strict: cli.strict,
        })
    }
}
