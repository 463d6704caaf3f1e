use std::process::ExitCode;

use clap::Parser;
use tracing::warn;
use tracing_subscriber::FmtSubscriber;

use btc_options_snapshot::cli::Cli;
use btc_options_snapshot::config::SnapshotConfig;
use btc_options_snapshot::fetch_data;

/// Exit status for `--strict` runs that fetched nothing.
const EXIT_NO_RECORDS: u8 = 2;

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stdout)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = SnapshotConfig::from_cli(&cli)?;
    let report = fetch_data::run(&config)?;

    if config.strict && report.fetched == 0 {
        warn!("No new quotes fetched");
        return Ok(ExitCode::from(EXIT_NO_RECORDS));
    }
    Ok(ExitCode::SUCCESS)
}
