//! Relative Strength Index over trailing-window mean gains and losses.
//!
//! delta[i] = close[i] - close[i-1], undefined at i = 0. avg_gain/avg_loss
//! are plain trailing-window means of max(±delta, 0) — not Wilder
//! smoothing. RSI = 100 - 100 / (1 + avg_gain / avg_loss).
//! First defined index: window.
//!
//! Degenerate windows are assigned deliberately: all gains → 100, all
//! losses → 0, flat (no movement at all) → 50.

use super::Indicator;
use crate::domain::PriceRecord;

#[derive(Debug, Clone)]
pub struct Rsi {
    window: usize,
    name: String,
}

impl Rsi {
    pub fn new(window: usize) -> Self {
        assert!(window >= 1, "RSI window must be >= 1");
        Self {
            window,
            name: format!("rsi_{window}"),
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.window
    }

    fn compute(&self, records: &[PriceRecord]) -> Vec<f64> {
        let n = records.len();
        let w = self.window;
        let mut result = vec![f64::NAN; n];

        if n < w + 1 {
            return result;
        }

        // gains[i] / losses[i] correspond to the delta ending at record i.
        let mut gains = vec![0.0; n];
        let mut losses = vec![0.0; n];
        for i in 1..n {
            let delta = records[i].close - records[i - 1].close;
            if delta > 0.0 {
                gains[i] = delta;
            } else {
                losses[i] = -delta;
            }
        }

        // Trailing-window sums over deltas [i-w+1, i], rolled forward.
        let mut gain_sum: f64 = gains[1..=w].iter().sum();
        let mut loss_sum: f64 = losses[1..=w].iter().sum();
        result[w] = rsi_value(gain_sum / w as f64, loss_sum / w as f64);

        for i in (w + 1)..n {
            gain_sum += gains[i] - gains[i - w];
            loss_sum += losses[i] - losses[i - w];
            result[i] = rsi_value(gain_sum / w as f64, loss_sum / w as f64);
        }

        result
    }
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 && avg_gain == 0.0 {
        50.0 // flat window, no movement
    } else if avg_loss == 0.0 {
        100.0
    } else if avg_gain == 0.0 {
        0.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}
