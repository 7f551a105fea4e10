//! Watch configuration — the tracked instrument set and indicator windows.
//!
//! Explicit configuration handed to the pipeline entry point; there is no
//! process-wide instrument list.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Tracked instrument names, processed in order.
    pub instruments: Vec<String>,

    /// Directory holding the per-instrument history CSVs.
    pub data_dir: PathBuf,

    /// Directory the chart-data sink writes into.
    pub chart_dir: PathBuf,

    pub indicators: IndicatorParams,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            instruments: Vec::new(),
            data_dir: PathBuf::from("data"),
            chart_dir: PathBuf::from("charts"),
            indicators: IndicatorParams::default(),
        }
    }
}

impl WatchConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}

/// Window parameters for the standard indicator set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorParams {
    pub moving_average: usize,
    pub rsi: usize,
    pub bollinger: usize,
    pub macd_short: usize,
    pub macd_long: usize,
    pub macd_signal: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            moving_average: 20,
            rsi: 14,
            bollinger: 20,
            macd_short: 12,
            macd_long: 26,
            macd_signal: 9,
        }
    }
}
