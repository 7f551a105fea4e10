//! Indicator engine — pure functions over an ordered price series.
//!
//! Every indicator implements the `Indicator` trait: full record slice in,
//! one aligned `Vec<f64>` out, `f64::NAN` marking positions with
//! insufficient history. Nothing here touches the store, and nothing
//! mutates the series — each indicator returns its own column, combined
//! into a `DerivedColumns` set only at the orchestration boundary.
//!
//! Multi-series indicators (Bollinger, MACD) are exposed as separate named
//! instances per band, keeping the single-series trait unchanged.

pub mod bollinger;
pub mod macd;
pub mod moving_average;
pub mod rsi;

pub use bollinger::{Bollinger, BollingerBand};
pub use macd::{ema_first_seeded, Macd, MacdBand};
pub use moving_average::MovingAverage;
pub use rsi::Rsi;

use crate::config::IndicatorParams;
use crate::domain::PriceRecord;
use std::collections::HashMap;

/// Trait for indicators.
///
/// Output is aligned 1:1 with the input by position; the first `lookback()`
/// values are `f64::NAN`. Indicators are total over series of any length —
/// a short series yields an all-NaN column, never an error.
pub trait Indicator: Send + Sync {
    /// Column name (e.g., "ma_20", "rsi_14").
    fn name(&self) -> &str;

    /// Number of records needed before the indicator produces valid output.
    fn lookback(&self) -> usize;

    /// Compute the column for the entire series.
    fn compute(&self, records: &[PriceRecord]) -> Vec<f64>;
}

/// Named derived columns for one series, built fresh on every run and never
/// persisted with the canonical history.
#[derive(Debug, Clone, Default)]
pub struct DerivedColumns {
    series: HashMap<String, Vec<f64>>,
}

impl DerivedColumns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a named column.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        self.series.insert(name.into(), values);
    }

    /// Value of a named column at a position.
    pub fn get(&self, name: &str, index: usize) -> Option<f64> {
        self.series.get(name).and_then(|v| v.get(index).copied())
    }

    /// Full column by name.
    pub fn get_series(&self, name: &str) -> Option<&[f64]> {
        self.series.get(name).map(|v| v.as_slice())
    }

    /// Column names, sorted for stable output.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.series.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// The standard column set the pipeline computes for every instrument:
/// moving average, RSI, all three Bollinger bands (2σ), and the MACD
/// line / signal / histogram triple.
pub fn standard_set(params: &IndicatorParams) -> Vec<Box<dyn Indicator>> {
    vec![
        Box::new(MovingAverage::new(params.moving_average)),
        Box::new(Rsi::new(params.rsi)),
        Box::new(Bollinger::middle(params.bollinger, 2.0)),
        Box::new(Bollinger::upper(params.bollinger, 2.0)),
        Box::new(Bollinger::lower(params.bollinger, 2.0)),
        Box::new(Macd::line(params.macd_short, params.macd_long)),
        Box::new(Macd::signal(
            params.macd_short,
            params.macd_long,
            params.macd_signal,
        )),
        Box::new(Macd::histogram(
            params.macd_short,
            params.macd_long,
            params.macd_signal,
        )),
    ]
}

/// Compute the full standard set into one `DerivedColumns`.
pub fn compute_standard_set(records: &[PriceRecord], params: &IndicatorParams) -> DerivedColumns {
    let mut columns = DerivedColumns::new();
    for indicator in standard_set(params) {
        columns.insert(indicator.name().to_string(), indicator.compute(records));
    }
    columns
}

/// Create synthetic records from close prices for testing.
///
/// Generates plausible OHL: open = prev close (or close for the first
/// record), high/low bracket them by 1.0.
#[cfg(test)]
pub fn make_records(closes: &[f64]) -> Vec<PriceRecord> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            PriceRecord {
                date: base_date + chrono::Duration::days(i as i64),
                close,
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                change_percent: None,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
