//! Quote provider trait and structured error types.
//!
//! The QuoteProvider trait abstracts over quote sources so the pipeline can
//! swap implementations and mock for tests. Providers hand back raw field
//! values exactly as observed — validation happens at the merge boundary,
//! not here.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raw daily quote from a provider, before validation.
///
/// Every numeric field is optional: a value the source failed to render or
/// that did not parse as a number is simply absent, never a crash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawQuote {
    pub date: NaiveDate,
    pub close: Option<f64>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub change_percent: Option<f64>,
}

/// Structured error types for provider operations.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("instrument not found: {instrument}")]
    InstrumentNotFound { instrument: String },

    #[error("network unreachable: {0}")]
    Network(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("provider error: {0}")]
    Other(String),
}

/// Trait for quote sources.
///
/// The store and merger sit above this trait — providers know nothing about
/// persistence.
pub trait QuoteProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Map an instrument name to its source URL.
    ///
    /// `InstrumentNotFound` when the search yields nothing; the orchestrator
    /// maps that to a resolution failure for the instrument.
    fn resolve(&self, instrument: &str) -> Result<String, ProviderError>;

    /// Fetch the current trading day's raw quote.
    fn fetch_today(&self, url: &str) -> Result<RawQuote, ProviderError>;

    /// Fetch recent daily history, most useful for the initial backfill.
    fn fetch_history(&self, url: &str) -> Result<Vec<RawQuote>, ProviderError>;
}

/// Parse a numeric field the way quote pages render them.
///
/// Tolerates thousands separators, a trailing `%`, surrounding parentheses
/// and an explicit leading `+`: `"1,234.56"`, `"(+1.23%)"`, `"-0.85%"`.
/// Anything that still fails to parse is absence, not an error.
pub fn parse_numeric_field(text: &str) -> Option<f64> {
    let mut s = text.trim();
    s = s.strip_prefix('(').unwrap_or(s);
    s = s.strip_suffix(')').unwrap_or(s);
    s = s.strip_suffix('%').unwrap_or(s);
    let cleaned = s.replace(',', "");
    cleaned.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
