//! MACD — difference of two exponential moving averages, with a smoothed
//! signal line and histogram.
//!
//! The EMAs here use smoothing factor k = 2/(n+1) seeded by the first value
//! (ema[0] = x[0]), so every MACD column is defined from index 0 — there is
//! no warm-up gap, unlike the windowed indicators.
//!
//! Three columns (separate Indicator instances):
//! - Line: EMA(close, short) - EMA(close, long)
//! - Signal: EMA(line, signal)
//! - Histogram: line - signal

use super::Indicator;
use crate::domain::PriceRecord;

/// Which MACD column to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacdBand {
    Line,
    Signal,
    Histogram,
}

#[derive(Debug, Clone)]
pub struct Macd {
    short: usize,
    long: usize,
    signal: usize,
    band: MacdBand,
    name: String,
}

impl Macd {
    pub fn line(short: usize, long: usize) -> Self {
        Self::new(short, long, 1, MacdBand::Line, format!("macd_{short}_{long}"))
    }

    pub fn signal(short: usize, long: usize, signal: usize) -> Self {
        Self::new(
            short,
            long,
            signal,
            MacdBand::Signal,
            format!("macd_signal_{short}_{long}_{signal}"),
        )
    }

    pub fn histogram(short: usize, long: usize, signal: usize) -> Self {
        Self::new(
            short,
            long,
            signal,
            MacdBand::Histogram,
            format!("macd_hist_{short}_{long}_{signal}"),
        )
    }

    fn new(short: usize, long: usize, signal: usize, band: MacdBand, name: String) -> Self {
        assert!(short >= 1 && long >= 1 && signal >= 1, "MACD spans must be >= 1");
        assert!(short < long, "MACD short span must be below the long span");
        Self {
            short,
            long,
            signal,
            band,
            name,
        }
    }

    fn macd_line(&self, closes: &[f64]) -> Vec<f64> {
        let short_ema = ema_first_seeded(closes, self.short);
        let long_ema = ema_first_seeded(closes, self.long);
        short_ema
            .iter()
            .zip(&long_ema)
            .map(|(s, l)| s - l)
            .collect()
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, records: &[PriceRecord]) -> Vec<f64> {
        let closes: Vec<f64> = records.iter().map(|r| r.close).collect();
        let line = self.macd_line(&closes);

        match self.band {
            MacdBand::Line => line,
            MacdBand::Signal => ema_first_seeded(&line, self.signal),
            MacdBand::Histogram => {
                let signal = ema_first_seeded(&line, self.signal);
                line.iter().zip(&signal).map(|(m, s)| m - s).collect()
            }
        }
    }
}

/// EMA with k = 2/(n+1), seeded by the first value.
///
/// ema[0] = values[0]; ema[i] = k * values[i] + (1 - k) * ema[i-1].
pub fn ema_first_seeded(values: &[f64], span: usize) -> Vec<f64> {
    assert!(span >= 1, "EMA span must be >= 1");
    let mut result = Vec::with_capacity(values.len());
    let Some(&first) = values.first() else {
        return result;
    };

    let k = 2.0 / (span as f64 + 1.0);
    let mut prev = first;
    result.push(prev);
    for &v in &values[1..] {
        prev = v * k + prev * (1.0 - k);
        result.push(prev);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_records, DEFAULT_EPSILON};

    #[test]
    fn ema_is_seeded_by_first_value() {
        let values = [10.0, 11.0, 12.0];
        // span 3 → k = 0.5: [10, 10.5, 11.25]
        let ema = ema_first_seeded(&values, 3);
        assert_approx(ema[0], 10.0, DEFAULT_EPSILON);
        assert_approx(ema[1], 10.5, DEFAULT_EPSILON);
        assert_approx(ema[2], 11.25, DEFAULT_EPSILON);
    }

    #[test]
    fn ema_of_empty_is_empty() {
        assert!(ema_first_seeded(&[], 3).is_empty());
    }

    #[test]
    fn ema_span_1_is_identity() {
        let values = [10.0, 20.0, 30.0];
        assert_eq!(ema_first_seeded(&values, 1), values);
    }

    #[test]
    fn macd_line_starts_at_zero() {
        // Both EMAs seed to close[0], so the line starts at 0.
        let records = make_records(&[100.0, 102.0, 101.0, 105.0]);
        let line = Macd::line(2, 3).compute(&records);
        assert_approx(line[0], 0.0, DEFAULT_EPSILON);
    }

    #[test]
    fn macd_defined_everywhere() {
        let records = make_records(&[100.0, 102.0, 101.0]);
        for ind in [
            Macd::line(12, 26),
            Macd::signal(12, 26, 9),
            Macd::histogram(12, 26, 9),
        ] {
            let col = ind.compute(&records);
            assert_eq!(col.len(), 3);
            assert!(col.iter().all(|v| !v.is_nan()));
        }
    }

    #[test]
    fn histogram_is_line_minus_signal() {
        let records = make_records(&[100.0, 104.0, 99.0, 108.0, 103.0, 110.0]);
        let line = Macd::line(2, 4).compute(&records);
        let signal = Macd::signal(2, 4, 3).compute(&records);
        let hist = Macd::histogram(2, 4, 3).compute(&records);

        for i in 0..records.len() {
            assert_approx(hist[i], line[i] - signal[i], DEFAULT_EPSILON);
        }
    }

    #[test]
    fn macd_constant_series_is_flat_zero() {
        let records = make_records(&[50.0; 8]);
        let line = Macd::line(2, 4).compute(&records);
        let hist = Macd::histogram(2, 4, 3).compute(&records);
        for i in 0..8 {
            assert_approx(line[i], 0.0, DEFAULT_EPSILON);
            assert_approx(hist[i], 0.0, DEFAULT_EPSILON);
        }
    }

    #[test]
    fn macd_lookback_is_zero() {
        assert_eq!(Macd::line(12, 26).lookback(), 0);
    }
}
