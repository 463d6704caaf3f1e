use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use btc_options_snapshot::config::SnapshotConfig;
use btc_options_snapshot::data::{self, OptionQuoteRow};
use btc_options_snapshot::fetch_data::{discovery, quotes, snapshot};
use btc_options_snapshot::symbol::OptionKind;
use btc_options_snapshot::venues::{FetchError, MarketData};

// ── Mock market ─────────────────────────────────────────────────────

/// In-memory market with scripted responses. Symbols missing from `marks`
/// answer with an HTTP 400, like an unknown symbol on the real API.
#[derive(Default)]
struct MockMarket {
    symbols: Option<Vec<String>>,
    spot: Option<f64>,
    marks: HashMap<String, f64>,
    mark_calls: Mutex<Vec<String>>,
}

impl MockMarket {
    fn new(symbols: &[&str], spot: Option<f64>, marks: &[(&str, f64)]) -> Self {
        MockMarket {
            symbols: Some(symbols.iter().map(|s| s.to_string()).collect()),
            spot,
            marks: marks.iter().map(|(s, p)| (s.to_string(), *p)).collect(),
            mark_calls: Mutex::new(Vec::new()),
        }
    }

    fn mark_calls(&self) -> Vec<String> {
        self.mark_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MarketData for MockMarket {
    async fn option_symbols(&self) -> Result<Vec<String>, FetchError> {
        self.symbols
            .clone()
            .ok_or_else(|| FetchError::Malformed("exchangeInfo: expected value".into()))
    }

    async fn spot_price(&self, _pair: &str) -> Result<f64, FetchError> {
        self.spot.ok_or(FetchError::Status {
            status: 503,
            body: "unavailable".into(),
        })
    }

    async fn mark_price(&self, symbol: &str) -> Result<f64, FetchError> {
        self.mark_calls.lock().unwrap().push(symbol.to_string());
        self.marks.get(symbol).copied().ok_or(FetchError::Status {
            status: 400,
            body: r#"{"code":-1121,"msg":"Invalid symbol."}"#.into(),
        })
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn new_year_2024() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn config_for(dataset: &Path) -> SnapshotConfig {
    SnapshotConfig {
        dataset: dataset.to_path_buf(),
        underlying: "BTC".into(),
        spot_pair: "BTCUSDT".into(),
        lookahead_days: 6,
        options_api: "http://localhost".into(),
        spot_api: "http://localhost".into(),
        timeout: Duration::from_secs(1),
        concurrency: 1,
        strict: false,
    }
}

fn symbols(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

const EXAMPLE_SYMBOLS: [&str; 3] = [
    "BTC-240101-50000-C",
    "BTC-240102-60000-P",
    "BTC-991231-10000-C",
];

// ── Tests ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_end_to_end_example() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("btc_options_near_expiry.csv");
    let market = Arc::new(MockMarket::new(
        &EXAMPLE_SYMBOLS,
        Some(65000.0),
        &[
            ("BTC-240101-50000-C", 1200.5),
            ("BTC-240102-60000-P", 300.0),
            ("BTC-991231-10000-C", 5.0),
        ],
    ));

    let report = snapshot(market.clone(), &config_for(&path), new_year_2024())
        .await
        .unwrap();

    assert_eq!(report.near_expiry, 2);
    assert_eq!(report.fetched, 2);
    assert_eq!(report.merge.total, 2);
    // far-future symbol is never quoted
    assert_eq!(
        market.mark_calls(),
        symbols(&["BTC-240101-50000-C", "BTC-240102-60000-P"])
    );

    let rows: Vec<OptionQuoteRow> = data::load_dataset(&path).unwrap();
    let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    assert_eq!(
        rows,
        vec![
            OptionQuoteRow {
                date: today,
                expiry: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                strike: 50000.0,
                option_type: OptionKind::Call,
                mark_price: 1200.5,
                spot_price: 65000.0,
                symbol: "BTC-240101-50000-C".into(),
            },
            OptionQuoteRow {
                date: today,
                expiry: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                strike: 60000.0,
                option_type: OptionKind::Put,
                mark_price: 300.0,
                spot_price: 65000.0,
                symbol: "BTC-240102-60000-P".into(),
            },
        ]
    );
}

#[tokio::test]
async fn test_missing_spot_yields_no_records() {
    let market = Arc::new(MockMarket::new(
        &EXAMPLE_SYMBOLS,
        None,
        &[("BTC-240101-50000-C", 1200.5), ("BTC-240102-60000-P", 300.0)],
    ));

    let rows = quotes::build_records(
        market.clone(),
        &symbols(&EXAMPLE_SYMBOLS[..2]),
        "BTCUSDT",
        new_year_2024().date(),
        1,
    )
    .await;

    assert!(rows.is_empty());
    assert!(market.mark_calls().is_empty());
}

#[tokio::test]
async fn test_non_positive_spot_is_missing() {
    let market = MockMarket::new(&[], Some(0.0), &[]);
    assert_eq!(quotes::lookup_spot(&market, "BTCUSDT").await, None);
}

#[tokio::test]
async fn test_failed_mark_skips_only_that_symbol() {
    let market = Arc::new(MockMarket::new(
        &[],
        Some(42000.0),
        &[("BTC-240101-50000-C", 10.0), ("BTC-240103-40000-P", 20.0)],
    ));
    let input = symbols(&[
        "BTC-240101-50000-C",
        "BTC-240102-45000-C",
        "BTC-240103-40000-P",
    ]);

    let rows = quotes::build_records(market.clone(), &input, "BTCUSDT", new_year_2024().date(), 1).await;

    let got: Vec<&str> = rows.iter().map(|r| r.symbol.as_str()).collect();
    assert_eq!(got, vec!["BTC-240101-50000-C", "BTC-240103-40000-P"]);
    assert!(rows.iter().all(|r| r.spot_price == 42000.0));
    // sequential lookups follow input order
    assert_eq!(market.mark_calls(), input);
}

#[tokio::test]
async fn test_unparseable_symbol_is_skipped_at_build() {
    let market = Arc::new(MockMarket::new(
        &[],
        Some(42000.0),
        &[("BTC-240101-abc-C", 10.0), ("BTC-240101-50000-C", 11.0)],
    ));
    let input = symbols(&["BTC-240101-abc-C", "BTC-240101-50000-C"]);

    let rows = quotes::build_records(market, &input, "BTCUSDT", new_year_2024().date(), 1).await;

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].symbol, "BTC-240101-50000-C");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_marks_keep_input_order() {
    let input: Vec<String> = (1..=9)
        .map(|d| format!("BTC-24010{d}-50000-C"))
        .collect();
    let marks: Vec<(&str, f64)> = input
        .iter()
        .enumerate()
        .map(|(i, s)| (s.as_str(), i as f64 + 1.0))
        .collect();
    let market = Arc::new(MockMarket::new(&[], Some(42000.0), &marks));

    let rows = quotes::build_records(market.clone(), &input, "BTCUSDT", new_year_2024().date(), 4).await;

    let got: Vec<String> = rows.iter().map(|r| r.symbol.clone()).collect();
    assert_eq!(got, input);
    let prices: Vec<f64> = rows.iter().map(|r| r.mark_price).collect();
    assert_eq!(prices, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
    assert_eq!(market.mark_calls().len(), 9);
}

#[tokio::test]
async fn test_discovery_filters_underlying() {
    let market = MockMarket::new(
        &[
            "BTC-240101-50000-C",
            "ETH-240101-2000-P",
            "BTCDOM-240101-100-C",
            "BTC-240102-60000-P",
        ],
        None,
        &[],
    );

    let found = discovery::discover_symbols(&market, "BTC").await;

    assert_eq!(found, symbols(&["BTC-240101-50000-C", "BTC-240102-60000-P"]));
}

#[tokio::test]
async fn test_discovery_fails_soft() {
    let market = MockMarket {
        symbols: None,
        ..MockMarket::default()
    };
    assert!(discovery::discover_symbols(&market, "BTC").await.is_empty());
}

#[tokio::test]
async fn test_rerun_keeps_prior_quotes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dataset.csv");
    let config = config_for(&path);

    let first = Arc::new(MockMarket::new(
        &EXAMPLE_SYMBOLS[..2],
        Some(65000.0),
        &[("BTC-240101-50000-C", 1200.5), ("BTC-240102-60000-P", 300.0)],
    ));
    snapshot(first, &config, new_year_2024()).await.unwrap();

    let second = Arc::new(MockMarket::new(
        &["BTC-240101-50000-C", "BTC-240103-70000-C"],
        Some(66000.0),
        &[("BTC-240101-50000-C", 999.0), ("BTC-240103-70000-C", 50.0)],
    ));
    let report = snapshot(second, &config, new_year_2024()).await.unwrap();

    assert_eq!(report.fetched, 2);
    assert_eq!(report.merge.existing, 2);
    assert_eq!(report.merge.duplicates, 1);
    assert_eq!(report.merge.total, 3);

    let rows = data::load_dataset(&path).unwrap();
    let got: Vec<(&str, f64, f64)> = rows
        .iter()
        .map(|r| (r.symbol.as_str(), r.mark_price, r.spot_price))
        .collect();
    assert_eq!(
        got,
        vec![
            ("BTC-240101-50000-C", 1200.5, 65000.0),
            ("BTC-240102-60000-P", 300.0, 65000.0),
            ("BTC-240103-70000-C", 50.0, 66000.0),
        ]
    );
}

#[tokio::test]
async fn test_total_failure_still_writes_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dataset.csv");
    let market = Arc::new(MockMarket {
        symbols: None,
        ..MockMarket::default()
    });

    let report = snapshot(market, &config_for(&path), new_year_2024())
        .await
        .unwrap();

    assert_eq!(report.fetched, 0);
    assert_eq!(report.merge.total, 0);
    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.starts_with("Date,Expiry,Strike,Option Type,Mark Price,BTC Spot Price,Symbol\n"));
}
