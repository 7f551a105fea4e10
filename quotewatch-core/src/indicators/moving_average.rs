//! Simple moving average of close prices.
//!
//! Defined from index window-1 onward; rolling-sum implementation.

use super::Indicator;
use crate::domain::PriceRecord;

#[derive(Debug, Clone)]
pub struct MovingAverage {
    window: usize,
    name: String,
}

impl MovingAverage {
    pub fn new(window: usize) -> Self {
        assert!(window >= 1, "moving average window must be >= 1");
        Self {
            window,
            name: format!("ma_{window}"),
        }
    }
}

impl Indicator for MovingAverage {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.window - 1
    }

    fn compute(&self, records: &[PriceRecord]) -> Vec<f64> {
        let n = records.len();
        let mut result = vec![f64::NAN; n];

        if n < self.window {
            return result;
        }

        let mut sum: f64 = records.iter().take(self.window).map(|r| r.close).sum();
        result[self.window - 1] = sum / self.window as f64;

        for i in self.window..n {
            sum += records[i].close - records[i - self.window].close;
            result[i] = sum / self.window as f64;
        }

        result
    }
}
