//! Chart-data sink — writes one CSV per instrument for an external plotter.
//!
//! Columns: `Date, Close, <derived columns sorted by name>`. Undefined
//! indicator positions are left blank. Derived columns live only in these
//! chart files; the canonical history never carries them.

use quotewatch_core::data::instrument_slug;
use quotewatch_core::domain::Series;
use quotewatch_core::indicators::DerivedColumns;
use quotewatch_core::pipeline::{PlotSink, SinkError};
use std::fs;
use std::path::PathBuf;

pub struct ChartCsvSink {
    out_dir: PathBuf,
}

impl ChartCsvSink {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    pub fn chart_path(&self, instrument: &str) -> PathBuf {
        self.out_dir
            .join(format!("{}_chart.csv", instrument_slug(instrument)))
    }
}

impl PlotSink for ChartCsvSink {
    fn render(
        &self,
        instrument: &str,
        series: &Series,
        columns: &DerivedColumns,
    ) -> Result<(), SinkError> {
        let io_err = |e: &dyn std::fmt::Display| SinkError(format!("chart write: {e}"));

        fs::create_dir_all(&self.out_dir).map_err(|e| io_err(&e))?;
        let path = self.chart_path(instrument);
        let mut writer = csv::Writer::from_path(&path).map_err(|e| io_err(&e))?;

        let names = columns.names();
        let mut header = vec!["Date".to_string(), "Close".to_string()];
        header.extend(names.iter().map(|n| n.to_string()));
        writer.write_record(&header).map_err(|e| io_err(&e))?;

        for (i, record) in series.records().iter().enumerate() {
            let mut row = vec![
                record.date.format("%Y-%m-%d").to_string(),
                record.close.to_string(),
            ];
            for name in &names {
                let value = columns.get(name, i).unwrap_or(f64::NAN);
                row.push(if value.is_nan() {
                    String::new()
                } else {
                    value.to_string()
                });
            }
            writer.write_record(&row).map_err(|e| io_err(&e))?;
        }

        writer.flush().map_err(|e| io_err(&e))?;
        Ok(())
    }
}
