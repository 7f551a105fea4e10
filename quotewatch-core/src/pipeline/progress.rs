//! Progress callbacks for batch runs.

use super::{PipelineError, RunReport};

/// Progress callback for multi-instrument runs.
pub trait RunProgress: Send {
    /// Called when an instrument's run starts.
    fn on_start(&self, instrument: &str, index: usize, total: usize);

    /// Called when an instrument's run completes.
    fn on_complete(
        &self,
        instrument: &str,
        index: usize,
        total: usize,
        result: &Result<RunReport, PipelineError>,
    );

    /// Called when the entire batch is done.
    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize);
}

/// Simple progress reporter that prints to stdout.
pub struct StdoutProgress;

impl RunProgress for StdoutProgress {
    fn on_start(&self, instrument: &str, index: usize, total: usize) {
        println!("[{}/{}] Updating {instrument}...", index + 1, total);
    }

    fn on_complete(
        &self,
        instrument: &str,
        _index: usize,
        _total: usize,
        result: &Result<RunReport, PipelineError>,
    ) {
        match result {
            Ok(report) => {
                println!("  OK: {instrument} ({} records)", report.record_count)
            }
            Err(e) => println!("  FAIL: {e}"),
        }
    }

    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize) {
        println!("\nRun complete: {succeeded}/{total} succeeded, {failed} failed");
    }
}

/// Progress reporter that stays quiet (tests, embedding).
pub struct SilentProgress;

impl RunProgress for SilentProgress {
    fn on_start(&self, _instrument: &str, _index: usize, _total: usize) {}

    fn on_complete(
        &self,
        _instrument: &str,
        _index: usize,
        _total: usize,
        _result: &Result<RunReport, PipelineError>,
    ) {
    }

    fn on_batch_complete(&self, _succeeded: usize, _failed: usize, _total: usize) {}
}
