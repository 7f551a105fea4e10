//! Integration tests for the pipeline orchestrator: fake provider, temp-dir
//! store, collecting sink.

use chrono::NaiveDate;
use quotewatch_core::config::IndicatorParams;
use quotewatch_core::data::{CsvStore, ProviderError, QuoteProvider, RawQuote};
use quotewatch_core::domain::{PriceRecord, Series};
use quotewatch_core::indicators::DerivedColumns;
use quotewatch_core::pipeline::{
    backfill, run, NullSink, PipelineError, PlotSink, SilentProgress, SinkError, Stage,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::{env, fs};

static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

fn temp_data_dir() -> PathBuf {
    let id = TEST_COUNTER.fetch_add(1, Ordering::Relaxed);
    let dir = env::temp_dir().join(format!("quotewatch_pipeline_{}_{id}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
}

fn raw(day: u32, close: Option<f64>) -> RawQuote {
    RawQuote {
        date: date(day),
        close,
        open: close.map(|c| c - 0.5),
        high: close.map(|c| c + 1.0),
        low: close.map(|c| c - 1.0),
        change_percent: Some(0.5),
    }
}

fn record(day: u32, close: f64) -> PriceRecord {
    PriceRecord {
        date: date(day),
        close,
        open: close,
        high: close + 1.0,
        low: close - 1.0,
        change_percent: None,
    }
}

fn seeded_store(dir: &PathBuf) -> CsvStore {
    let store = CsvStore::new(dir);
    let series =
        Series::from_records("Tesla", vec![record(1, 100.0), record(2, 102.0)]).unwrap();
    store.save("Tesla", &series).unwrap();
    store
}

// ── Fake provider ────────────────────────────────────────────────────

#[derive(Default)]
struct FakeProvider {
    urls: HashMap<String, String>,
    today: HashMap<String, RawQuote>,
    history: HashMap<String, Vec<RawQuote>>,
}

impl FakeProvider {
    fn with_today(instrument: &str, quote: RawQuote) -> Self {
        let mut p = Self::default();
        let url = format!("fake://{instrument}");
        p.urls.insert(instrument.to_string(), url.clone());
        p.today.insert(url, quote);
        p
    }

    fn with_history(instrument: &str, rows: Vec<RawQuote>) -> Self {
        let mut p = Self::default();
        let url = format!("fake://{instrument}");
        p.urls.insert(instrument.to_string(), url.clone());
        p.history.insert(url, rows);
        p
    }
}

impl QuoteProvider for FakeProvider {
    fn name(&self) -> &str {
        "fake"
    }

    fn resolve(&self, instrument: &str) -> Result<String, ProviderError> {
        self.urls
            .get(instrument)
            .cloned()
            .ok_or(ProviderError::InstrumentNotFound {
                instrument: instrument.to_string(),
            })
    }

    fn fetch_today(&self, url: &str) -> Result<RawQuote, ProviderError> {
        self.today
            .get(url)
            .cloned()
            .ok_or_else(|| ProviderError::Network(format!("no quote behind {url}")))
    }

    fn fetch_history(&self, url: &str) -> Result<Vec<RawQuote>, ProviderError> {
        self.history
            .get(url)
            .cloned()
            .ok_or_else(|| ProviderError::Network(format!("no history behind {url}")))
    }
}

// ── Collecting sink ──────────────────────────────────────────────────

#[derive(Default)]
struct CollectingSink {
    seen: Mutex<Vec<(String, usize, Vec<(String, usize)>)>>,
}

impl PlotSink for CollectingSink {
    fn render(
        &self,
        instrument: &str,
        series: &Series,
        columns: &DerivedColumns,
    ) -> Result<(), SinkError> {
        let cols = columns
            .names()
            .iter()
            .map(|n| (n.to_string(), columns.get_series(n).unwrap().len()))
            .collect();
        self.seen
            .lock()
            .unwrap()
            .push((instrument.to_string(), series.len(), cols));
        Ok(())
    }
}

/// Sink that always fails, for render-stage attribution.
struct FailingSink;

impl PlotSink for FailingSink {
    fn render(&self, _: &str, _: &Series, _: &DerivedColumns) -> Result<(), SinkError> {
        Err(SinkError("disk full".into()))
    }
}

// ── Daily update ─────────────────────────────────────────────────────

#[test]
fn update_inserts_new_day() {
    let dir = temp_data_dir();
    let store = seeded_store(&dir);
    let provider = FakeProvider::with_today("Tesla", raw(3, Some(105.0)));

    let summary = run(
        &["Tesla"],
        &provider,
        &store,
        &NullSink,
        &IndicatorParams::default(),
        &SilentProgress,
    );

    assert!(summary.all_succeeded());
    let loaded = store.load("Tesla").unwrap();
    assert_eq!(loaded.len(), 3);
    let last = loaded.last().unwrap();
    assert_eq!(last.date, date(3));
    assert_eq!(last.close, 105.0);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn update_replaces_same_day_without_duplicating() {
    let dir = temp_data_dir();
    let store = seeded_store(&dir);
    let provider = FakeProvider::with_today("Tesla", raw(2, Some(103.0)));

    let summary = run(
        &["Tesla"],
        &provider,
        &store,
        &NullSink,
        &IndicatorParams::default(),
        &SilentProgress,
    );

    assert!(summary.all_succeeded());
    let loaded = store.load("Tesla").unwrap();
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded.records()[0].close, 100.0);
    assert_eq!(loaded.records()[1].close, 103.0);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn rejected_record_preserves_existing_store() {
    let dir = temp_data_dir();
    let store = seeded_store(&dir);
    let before = store.load("Tesla").unwrap();
    let provider = FakeProvider::with_today("Tesla", raw(3, None)); // unparsable close

    let summary = run(
        &["Tesla"],
        &provider,
        &store,
        &NullSink,
        &IndicatorParams::default(),
        &SilentProgress,
    );

    assert_eq!(summary.failed, 1);
    let err = summary.errors().next().unwrap();
    assert!(matches!(err, PipelineError::Rejected { .. }));
    assert_eq!(err.stage(), Stage::Merging);
    assert_eq!(store.load("Tesla").unwrap(), before);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn rejected_record_on_empty_store_leaves_nothing_behind() {
    let dir = temp_data_dir();
    let store = CsvStore::new(&dir);
    let provider = FakeProvider::with_today("Tesla", raw(3, None));

    let summary = run(
        &["Tesla"],
        &provider,
        &store,
        &NullSink,
        &IndicatorParams::default(),
        &SilentProgress,
    );

    assert_eq!(summary.failed, 1);
    assert!(store.load("Tesla").unwrap().is_empty());
    assert!(!store.series_path("Tesla").exists());

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn corrupt_store_is_a_hard_failure_and_is_not_overwritten() {
    let dir = temp_data_dir();
    let store = CsvStore::new(&dir);
    let garbage = "Date,Price,Open,High,Low,Change %\n2024-01-02,not-a-number,1,2,3,\n";
    fs::write(store.series_path("Tesla"), garbage).unwrap();
    let provider = FakeProvider::with_today("Tesla", raw(3, Some(105.0)));

    let summary = run(
        &["Tesla"],
        &provider,
        &store,
        &NullSink,
        &IndicatorParams::default(),
        &SilentProgress,
    );

    assert_eq!(summary.failed, 1);
    let err = summary.errors().next().unwrap();
    assert!(matches!(err, PipelineError::CorruptStore { .. }));
    // The broken file is untouched, waiting for an operator.
    assert_eq!(fs::read_to_string(store.series_path("Tesla")).unwrap(), garbage);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn one_failure_never_aborts_the_batch() {
    let dir = temp_data_dir();
    let store = CsvStore::new(&dir);
    let provider = FakeProvider::with_today("Tesla", raw(2, Some(102.0)));

    let summary = run(
        &["Ghost Corp", "Tesla"],
        &provider,
        &store,
        &NullSink,
        &IndicatorParams::default(),
        &SilentProgress,
    );

    assert_eq!(summary.total, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.outcomes[0].instrument, "Ghost Corp");
    assert!(matches!(
        summary.outcomes[0].result,
        Err(PipelineError::Resolution { .. })
    ));
    assert!(summary.outcomes[1].result.is_ok());
    assert_eq!(store.load("Tesla").unwrap().len(), 1);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn fetch_failure_is_attributed_to_the_fetching_stage() {
    let dir = temp_data_dir();
    let store = CsvStore::new(&dir);
    let mut provider = FakeProvider::default();
    provider
        .urls
        .insert("Tesla".to_string(), "fake://tesla".to_string());
    // no quote behind the URL

    let summary = run(
        &["Tesla"],
        &provider,
        &store,
        &NullSink,
        &IndicatorParams::default(),
        &SilentProgress,
    );

    let err = summary.errors().next().unwrap();
    assert!(matches!(err, PipelineError::Fetch { .. }));
    assert_eq!(err.stage(), Stage::Fetching);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn sink_failure_happens_after_persistence() {
    let dir = temp_data_dir();
    let store = seeded_store(&dir);
    let provider = FakeProvider::with_today("Tesla", raw(3, Some(105.0)));

    let summary = run(
        &["Tesla"],
        &provider,
        &store,
        &FailingSink,
        &IndicatorParams::default(),
        &SilentProgress,
    );

    assert_eq!(summary.failed, 1);
    let err = summary.errors().next().unwrap();
    assert_eq!(err.stage(), Stage::Rendering);
    // The merge was already durable when the sink failed.
    assert_eq!(store.load("Tesla").unwrap().len(), 3);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn sink_receives_aligned_standard_columns() {
    let dir = temp_data_dir();
    let store = seeded_store(&dir);
    let provider = FakeProvider::with_today("Tesla", raw(3, Some(105.0)));
    let sink = CollectingSink::default();

    run(
        &["Tesla"],
        &provider,
        &store,
        &sink,
        &IndicatorParams::default(),
        &SilentProgress,
    );

    let seen = sink.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    let (instrument, record_count, columns) = &seen[0];
    assert_eq!(instrument, "Tesla");
    assert_eq!(*record_count, 3);

    let names: Vec<&str> = columns.iter().map(|(n, _)| n.as_str()).collect();
    assert!(names.contains(&"ma_20"));
    assert!(names.contains(&"rsi_14"));
    assert!(names.contains(&"bollinger_upper_20"));
    assert!(names.contains(&"macd_12_26"));
    for (name, len) in columns {
        assert_eq!(len, record_count, "column {name} is misaligned");
    }

    let _ = fs::remove_dir_all(&dir);
}

// ── Backfill ─────────────────────────────────────────────────────────

#[test]
fn backfill_seeds_history_and_reports_rejections() {
    let dir = temp_data_dir();
    let store = CsvStore::new(&dir);
    let rows = vec![
        raw(1, Some(100.0)),
        raw(2, Some(101.0)),
        raw(3, None), // unparsable row in the table
        raw(4, Some(103.0)),
        raw(5, Some(104.0)),
    ];
    let provider = FakeProvider::with_history("Tesla", rows);

    let summary = backfill(&["Tesla"], &provider, &store, &SilentProgress);

    assert!(summary.all_succeeded());
    let report = summary.outcomes[0].result.as_ref().unwrap();
    assert_eq!(report.record_count, 4);
    assert_eq!(report.rejected, 1);
    assert_eq!(report.last_date, Some(date(5)));

    let loaded = store.load("Tesla").unwrap();
    assert_eq!(loaded.len(), 4);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn backfill_merges_into_existing_history() {
    let dir = temp_data_dir();
    let store = seeded_store(&dir); // days 1 and 2
    let rows = vec![raw(2, Some(110.0)), raw(3, Some(111.0))];
    let provider = FakeProvider::with_history("Tesla", rows);

    let summary = backfill(&["Tesla"], &provider, &store, &SilentProgress);

    assert!(summary.all_succeeded());
    let loaded = store.load("Tesla").unwrap();
    assert_eq!(loaded.len(), 3);
    // day 2 was re-observed and updated, not duplicated
    assert_eq!(loaded.records()[1].close, 110.0);

    let _ = fs::remove_dir_all(&dir);
}
