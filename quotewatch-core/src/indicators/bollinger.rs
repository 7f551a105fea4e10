//! Bollinger Bands — moving average ± standard deviation multiplier.
//!
//! Three bands (separate Indicator instances):
//! - Middle: trailing-window mean of close
//! - Upper: middle + mult * stddev(close, window)
//! - Lower: middle - mult * stddev(close, window)
//!
//! Uses population stddev (divide by N) for determinism.
//! Defined from index window-1 onward.

use super::Indicator;
use crate::domain::PriceRecord;

/// Which band of the Bollinger Bands to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BollingerBand {
    Upper,
    Middle,
    Lower,
}

#[derive(Debug, Clone)]
pub struct Bollinger {
    window: usize,
    multiplier: f64,
    band: BollingerBand,
    name: String,
}

impl Bollinger {
    pub fn upper(window: usize, multiplier: f64) -> Self {
        Self::new(window, multiplier, BollingerBand::Upper)
    }

    pub fn middle(window: usize, multiplier: f64) -> Self {
        Self::new(window, multiplier, BollingerBand::Middle)
    }

    pub fn lower(window: usize, multiplier: f64) -> Self {
        Self::new(window, multiplier, BollingerBand::Lower)
    }

    fn new(window: usize, multiplier: f64, band: BollingerBand) -> Self {
        assert!(window >= 1, "Bollinger window must be >= 1");
        let band_name = match band {
            BollingerBand::Upper => "upper",
            BollingerBand::Middle => "middle",
            BollingerBand::Lower => "lower",
        };
        Self {
            window,
            multiplier,
            band,
            name: format!("bollinger_{band_name}_{window}"),
        }
    }
}

impl Indicator for Bollinger {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.window - 1
    }

    fn compute(&self, records: &[PriceRecord]) -> Vec<f64> {
        let n = records.len();
        let w = self.window;
        let mut result = vec![f64::NAN; n];

        if n < w {
            return result;
        }

        for i in (w - 1)..n {
            let window = &records[(i + 1 - w)..=i];
            let mean = window.iter().map(|r| r.close).sum::<f64>() / w as f64;

            match self.band {
                BollingerBand::Middle => {
                    result[i] = mean;
                }
                BollingerBand::Upper | BollingerBand::Lower => {
                    // Population stddev
                    let variance = window
                        .iter()
                        .map(|r| {
                            let diff = r.close - mean;
                            diff * diff
                        })
                        .sum::<f64>()
                        / w as f64;
                    let stddev = variance.sqrt();

                    result[i] = match self.band {
                        BollingerBand::Upper => mean + self.multiplier * stddev,
                        BollingerBand::Lower => mean - self.multiplier * stddev,
                        BollingerBand::Middle => unreachable!(),
                    };
                }
            }
        }

        result
    }
}
