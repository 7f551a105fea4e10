//! CSV series store.
//!
//! Layout: `{data_dir}/{slug}_history.csv` plus a `.meta.json` sidecar per
//! instrument (date range, record count, blake3 content hash, saved-at).
//!
//! Features:
//! - Atomic writes (write to .tmp, rename into place)
//! - Absent file loads as an empty series — a missing history is normal
//! - Corrupt file is a hard error, never silently replaced with empty
//! - Always persists ascending by date regardless of row order on disk

use super::provider::parse_numeric_field;
use crate::domain::{PriceRecord, Series};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const HEADER: [&str; 6] = ["Date", "Price", "Open", "High", "Low", "Change %"];

/// Errors from the series store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The persisted form could not be parsed. Requires operator attention;
    /// proceeding would risk overwriting valid history.
    #[error("corrupt history file {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Metadata sidecar for a stored instrument.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreMeta {
    pub instrument: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub record_count: usize,
    pub data_hash: String,
    pub saved_at: chrono::NaiveDateTime,
}

/// Store status for a single instrument.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreStatus {
    pub instrument: String,
    pub stored: bool,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub record_count: Option<usize>,
}

/// File-system-safe form of an instrument name ("T Mobile" → "T_Mobile").
pub fn instrument_slug(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// The CSV store. One file per instrument under a single data directory.
pub struct CsvStore {
    data_dir: PathBuf,
}

impl CsvStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of the history file for an instrument.
    pub fn series_path(&self, instrument: &str) -> PathBuf {
        self.data_dir
            .join(format!("{}_history.csv", instrument_slug(instrument)))
    }

    fn meta_path(&self, instrument: &str) -> PathBuf {
        self.data_dir
            .join(format!("{}_history.meta.json", instrument_slug(instrument)))
    }

    /// Load the persisted series, or an empty series if none exists.
    ///
    /// Rows are re-sorted ascending on load; duplicate dates, a malformed
    /// header, or an unparsable required cell are `StoreError::Corrupt`.
    pub fn load(&self, instrument: &str) -> Result<Series, StoreError> {
        let path = self.series_path(instrument);
        if !path.exists() {
            return Ok(Series::empty(instrument));
        }

        let corrupt = |reason: String| StoreError::Corrupt {
            path: path.clone(),
            reason,
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(&path)
            .map_err(|e| corrupt(e.to_string()))?;

        let headers = reader.headers().map_err(|e| corrupt(e.to_string()))?;
        if !headers.iter().eq(HEADER.iter().copied()) {
            return Err(corrupt(format!("unexpected header: {headers:?}")));
        }

        let mut records = Vec::new();
        for (i, row) in reader.records().enumerate() {
            let line = i + 2; // 1-based, after the header
            let row = row.map_err(|e| corrupt(format!("line {line}: {e}")))?;
            records.push(parse_row(&row, line).map_err(&corrupt)?);
        }

        Series::from_records(instrument, records)
            .map_err(|e| corrupt(format!("duplicate date {}", e.date)))
    }

    /// Write the full series atomically, ascending by date, then refresh the
    /// metadata sidecar.
    pub fn save(&self, instrument: &str, series: &Series) -> Result<(), StoreError> {
        fs::create_dir_all(&self.data_dir)?;

        let path = self.series_path(instrument);
        let tmp_path = path.with_extension("csv.tmp");

        write_csv(&tmp_path, series)?;
        fs::rename(&tmp_path, &path).map_err(|e| {
            // Clean up temp file on rename failure
            let _ = fs::remove_file(&tmp_path);
            StoreError::Io(e)
        })?;

        self.write_meta(instrument, series)?;
        tracing::debug!(
            instrument = %series.instrument(),
            records = series.len(),
            "series saved"
        );
        Ok(())
    }

    fn write_meta(&self, instrument: &str, series: &Series) -> Result<(), StoreError> {
        let meta_path = self.meta_path(instrument);
        let (Some(first), Some(last)) = (series.first(), series.last()) else {
            // Nothing to describe; drop any stale sidecar.
            let _ = fs::remove_file(&meta_path);
            return Ok(());
        };

        let meta = StoreMeta {
            instrument: instrument.to_string(),
            start_date: first.date,
            end_date: last.date,
            record_count: series.len(),
            data_hash: blake3::hash(
                &serde_json::to_vec(series.records())
                    .map_err(|e| std::io::Error::other(e.to_string()))?,
            )
            .to_hex()
            .to_string(),
            saved_at: chrono::Local::now().naive_local(),
        };
        let json = serde_json::to_string_pretty(&meta)
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        fs::write(meta_path, json)?;
        Ok(())
    }

    /// Read the metadata sidecar, if any.
    pub fn meta(&self, instrument: &str) -> Option<StoreMeta> {
        let content = fs::read_to_string(self.meta_path(instrument)).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Per-instrument stored/range/count summary, from sidecars only.
    pub fn status(&self, instruments: &[&str]) -> Vec<StoreStatus> {
        instruments
            .iter()
            .map(|name| {
                let meta = self.meta(name);
                StoreStatus {
                    instrument: name.to_string(),
                    stored: meta.is_some(),
                    start_date: meta.as_ref().map(|m| m.start_date),
                    end_date: meta.as_ref().map(|m| m.end_date),
                    record_count: meta.as_ref().map(|m| m.record_count),
                }
            })
            .collect()
    }
}

fn parse_row(row: &csv::StringRecord, line: usize) -> Result<PriceRecord, String> {
    let cell = |idx: usize, name: &str| -> Result<&str, String> {
        row.get(idx)
            .ok_or_else(|| format!("line {line}: missing '{name}' cell"))
    };

    let date_text = cell(0, "Date")?;
    let date = NaiveDate::parse_from_str(date_text.trim(), "%Y-%m-%d")
        .map_err(|e| format!("line {line}: bad date '{date_text}': {e}"))?;

    let number = |idx: usize, name: &str| -> Result<f64, String> {
        let text = cell(idx, name)?;
        parse_numeric_field(text)
            .ok_or_else(|| format!("line {line}: unparsable '{name}' value '{text}'"))
    };

    let close = number(1, "Price")?;
    let open = number(2, "Open")?;
    let high = number(3, "High")?;
    let low = number(4, "Low")?;

    // Optional column: blank or unrenderable values are simply absent.
    let change_percent = row.get(5).and_then(|t| {
        let t = t.trim();
        if t.is_empty() {
            None
        } else {
            parse_numeric_field(t)
        }
    });

    Ok(PriceRecord {
        date,
        close,
        open,
        high,
        low,
        change_percent,
    })
}

fn write_csv(path: &Path, series: &Series) -> Result<(), StoreError> {
    let file = fs::File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);

    writer
        .write_record(HEADER)
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    for record in series.records() {
        let change = record
            .change_percent
            .map(|c| c.to_string())
            .unwrap_or_default();
        writer
            .write_record([
                record.date.format("%Y-%m-%d").to_string(),
                record.close.to_string(),
                record.open.to_string(),
                record.high.to_string(),
                record.low.to_string(),
                change,
            ])
            .map_err(|e| std::io::Error::other(e.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}
