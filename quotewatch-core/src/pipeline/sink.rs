//! Plot sink seam.
//!
//! The sink consumes a finalized series plus its derived columns and draws
//! (or exports) it; the pipeline has no contract on its output beyond
//! supplying well-formed, aligned input.

use crate::domain::Series;
use crate::indicators::DerivedColumns;
use thiserror::Error;

/// A sink failed to consume the enriched series.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{0}")]
pub struct SinkError(pub String);

/// Consumer of `(series, derived columns)` pairs.
pub trait PlotSink: Send + Sync {
    fn render(
        &self,
        instrument: &str,
        series: &Series,
        columns: &DerivedColumns,
    ) -> Result<(), SinkError>;
}

/// Sink that discards everything (tests, headless runs).
pub struct NullSink;

impl PlotSink for NullSink {
    fn render(
        &self,
        _instrument: &str,
        _series: &Series,
        _columns: &DerivedColumns,
    ) -> Result<(), SinkError> {
        Ok(())
    }
}
