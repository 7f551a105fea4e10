//! Pipeline orchestrator — drives fetch → merge → persist → compute → render
//! for each tracked instrument, one at a time.
//!
//! Failure of one instrument never aborts the batch: every instrument gets
//! exactly one outcome, and indicator computation only happens once the
//! merged series has been persisted.

pub mod progress;
pub mod sink;

pub use progress::{RunProgress, SilentProgress, StdoutProgress};
pub use sink::{NullSink, PlotSink, SinkError};

use crate::config::IndicatorParams;
use crate::data::merge::{merge_history, merge_raw};
use crate::data::provider::{ProviderError, QuoteProvider};
use crate::data::store::{CsvStore, StoreError};
use crate::domain::{RejectedRecord, Series};
use crate::indicators::compute_standard_set;
use chrono::NaiveDate;
use thiserror::Error;
use tracing::{info, warn};

/// Where in the per-instrument state machine a failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetching,
    Merging,
    Persisting,
    Computing,
    Rendering,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Fetching => "fetching",
            Stage::Merging => "merging",
            Stage::Persisting => "persisting",
            Stage::Computing => "computing",
            Stage::Rendering => "rendering",
        };
        f.write_str(s)
    }
}

/// Per-instrument pipeline failure, tagged with the instrument it belongs to.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{instrument}: could not resolve to a source URL")]
    Resolution { instrument: String },

    #[error("{instrument}: fetch failed: {source}")]
    Fetch {
        instrument: String,
        source: ProviderError,
    },

    #[error("{instrument}: record rejected: {source}")]
    Rejected {
        instrument: String,
        source: RejectedRecord,
    },

    /// The persisted history could not be parsed. Hard failure for this
    /// instrument: proceeding with an empty series would overwrite valid
    /// history, so an operator has to look at the file.
    #[error("{instrument}: history store needs operator attention: {source}")]
    CorruptStore {
        instrument: String,
        source: StoreError,
    },

    #[error("{instrument}: failed to persist series: {source}")]
    Store {
        instrument: String,
        source: StoreError,
    },

    #[error("{instrument}: plot sink failed: {source}")]
    Render {
        instrument: String,
        source: SinkError,
    },
}

impl PipelineError {
    pub fn instrument(&self) -> &str {
        match self {
            Self::Resolution { instrument }
            | Self::Fetch { instrument, .. }
            | Self::Rejected { instrument, .. }
            | Self::CorruptStore { instrument, .. }
            | Self::Store { instrument, .. }
            | Self::Render { instrument, .. } => instrument,
        }
    }

    /// The state-machine stage the failure is attributed to.
    pub fn stage(&self) -> Stage {
        match self {
            Self::Resolution { .. } | Self::Fetch { .. } => Stage::Fetching,
            Self::Rejected { .. } | Self::CorruptStore { .. } => Stage::Merging,
            Self::Store { .. } => Stage::Persisting,
            Self::Render { .. } => Stage::Rendering,
        }
    }
}

/// What a successful per-instrument run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub record_count: usize,
    pub last_date: Option<NaiveDate>,
    /// History rows refused by validation (backfill only; always 0 for the
    /// daily update, which fails outright on a rejected record).
    pub rejected: usize,
}

/// One outcome per instrument, success or failure.
#[derive(Debug)]
pub struct InstrumentOutcome {
    pub instrument: String,
    pub result: Result<RunReport, PipelineError>,
}

/// Summary of a batch run.
#[derive(Debug)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub outcomes: Vec<InstrumentOutcome>,
}

impl RunSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }

    /// The failures, in input order.
    pub fn errors(&self) -> impl Iterator<Item = &PipelineError> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().err())
    }
}

/// Daily update: fetch today's quote for every instrument, merge it into the
/// stored history, persist, compute the standard indicator set, and hand the
/// enriched series to the plot sink.
pub fn run(
    instruments: &[&str],
    provider: &dyn QuoteProvider,
    store: &CsvStore,
    sink: &dyn PlotSink,
    params: &IndicatorParams,
    progress: &dyn RunProgress,
) -> RunSummary {
    drive(instruments, progress, |instrument| {
        update_single(instrument, provider, store, sink, params)
    })
}

/// Seed or extend stored history from the provider's daily table. No
/// indicators and no rendering — this is the bootstrap path.
pub fn backfill(
    instruments: &[&str],
    provider: &dyn QuoteProvider,
    store: &CsvStore,
    progress: &dyn RunProgress,
) -> RunSummary {
    drive(instruments, progress, |instrument| {
        backfill_single(instrument, provider, store)
    })
}

fn drive(
    instruments: &[&str],
    progress: &dyn RunProgress,
    step: impl Fn(&str) -> Result<RunReport, PipelineError>,
) -> RunSummary {
    let total = instruments.len();
    let mut succeeded = 0;
    let mut failed = 0;
    let mut outcomes = Vec::with_capacity(total);

    for (i, &instrument) in instruments.iter().enumerate() {
        progress.on_start(instrument, i, total);

        let result = step(instrument);
        progress.on_complete(instrument, i, total, &result);

        match &result {
            Ok(report) => {
                info!(
                    instrument,
                    records = report.record_count,
                    "instrument updated"
                );
                succeeded += 1;
            }
            Err(e) => {
                warn!(instrument, stage = %e.stage(), error = %e, "instrument failed");
                failed += 1;
            }
        }

        outcomes.push(InstrumentOutcome {
            instrument: instrument.to_string(),
            result,
        });
    }

    progress.on_batch_complete(succeeded, failed, total);

    RunSummary {
        total,
        succeeded,
        failed,
        outcomes,
    }
}

fn update_single(
    instrument: &str,
    provider: &dyn QuoteProvider,
    store: &CsvStore,
    sink: &dyn PlotSink,
    params: &IndicatorParams,
) -> Result<RunReport, PipelineError> {
    let url = resolve(instrument, provider)?;
    let raw = provider
        .fetch_today(&url)
        .map_err(|source| PipelineError::Fetch {
            instrument: instrument.to_string(),
            source,
        })?;

    let existing = load_series(instrument, store)?;
    let merged = merge_raw(&existing, &raw).map_err(|source| PipelineError::Rejected {
        instrument: instrument.to_string(),
        source,
    })?;

    store
        .save(instrument, &merged)
        .map_err(|source| PipelineError::Store {
            instrument: instrument.to_string(),
            source,
        })?;

    // Persisted; only now is the enriched view derived and rendered.
    let columns = compute_standard_set(merged.records(), params);
    sink.render(instrument, &merged, &columns)
        .map_err(|source| PipelineError::Render {
            instrument: instrument.to_string(),
            source,
        })?;

    Ok(RunReport {
        record_count: merged.len(),
        last_date: merged.last().map(|r| r.date),
        rejected: 0,
    })
}

fn backfill_single(
    instrument: &str,
    provider: &dyn QuoteProvider,
    store: &CsvStore,
) -> Result<RunReport, PipelineError> {
    let url = resolve(instrument, provider)?;
    let raws = provider
        .fetch_history(&url)
        .map_err(|source| PipelineError::Fetch {
            instrument: instrument.to_string(),
            source,
        })?;

    let existing = load_series(instrument, store)?;
    let (merged, rejected) = merge_history(&existing, &raws);
    for rejection in &rejected {
        warn!(instrument, %rejection, "history row rejected");
    }

    store
        .save(instrument, &merged)
        .map_err(|source| PipelineError::Store {
            instrument: instrument.to_string(),
            source,
        })?;

    Ok(RunReport {
        record_count: merged.len(),
        last_date: merged.last().map(|r| r.date),
        rejected: rejected.len(),
    })
}

fn resolve(instrument: &str, provider: &dyn QuoteProvider) -> Result<String, PipelineError> {
    match provider.resolve(instrument) {
        Ok(url) => Ok(url),
        Err(ProviderError::InstrumentNotFound { .. }) => Err(PipelineError::Resolution {
            instrument: instrument.to_string(),
        }),
        Err(source) => Err(PipelineError::Fetch {
            instrument: instrument.to_string(),
            source,
        }),
    }
}

fn load_series(instrument: &str, store: &CsvStore) -> Result<Series, PipelineError> {
    store.load(instrument).map_err(|e| match e {
        corrupt @ StoreError::Corrupt { .. } => PipelineError::CorruptStore {
            instrument: instrument.to_string(),
            source: corrupt,
        },
        io => PipelineError::Store {
            instrument: instrument.to_string(),
            source: io,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_attribution() {
        let e = PipelineError::Resolution {
            instrument: "Tesla".into(),
        };
        assert_eq!(e.stage(), Stage::Fetching);
        assert_eq!(e.instrument(), "Tesla");

        let e = PipelineError::Rejected {
            instrument: "Tesla".into(),
            source: RejectedRecord::MissingField {
                date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                field: "close",
            },
        };
        assert_eq!(e.stage(), Stage::Merging);
    }

    #[test]
    fn stage_display_names() {
        assert_eq!(Stage::Fetching.to_string(), "fetching");
        assert_eq!(Stage::Rendering.to_string(), "rendering");
    }
}
