//! HTTP quote provider.
//!
//! Talks to the quote site's JSON endpoints: a search endpoint for name →
//! URL resolution, the instrument page's quote endpoint for today's fields,
//! and the `-historical-data` sibling page for the recent daily table.
//!
//! The site has no official API and is subject to unannounced format
//! changes; every field arrives as a string and goes through
//! `parse_numeric_field`, so a renamed or garbled field degrades to an
//! absent value rather than a parse crash.

use super::provider::{parse_numeric_field, ProviderError, QuoteProvider, RawQuote};
use chrono::NaiveDate;
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://www.investing.com";

/// Search endpoint response.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    quotes: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    url: String,
}

/// One daily row as the quote endpoints render it — all strings.
#[derive(Debug, Deserialize)]
struct QuoteRow {
    date: Option<String>,
    price: Option<String>,
    open: Option<String>,
    high: Option<String>,
    low: Option<String>,
    change_percent: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    rows: Vec<QuoteRow>,
}

/// Blocking HTTP provider with a bounded request timeout.
pub struct HttpQuoteProvider {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpQuoteProvider {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Point the provider at a different host (tests, mirrors).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ProviderError> {
        let resp = self
            .client
            .get(url)
            .query(query)
            .send()
            .map_err(classify_transport_error)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ProviderError::Other(format!("HTTP {status} for {url}")));
        }

        resp.json::<T>()
            .map_err(|e| ProviderError::ResponseFormatChanged(format!("{url}: {e}")))
    }
}

impl Default for HttpQuoteProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl QuoteProvider for HttpQuoteProvider {
    fn name(&self) -> &str {
        "http"
    }

    fn resolve(&self, instrument: &str) -> Result<String, ProviderError> {
        let search_url = format!("{}/search/", self.base_url);
        let resp: SearchResponse = self.get_json(&search_url, &[("q", instrument)])?;

        match resp.quotes.into_iter().next() {
            Some(hit) => Ok(format!("{}{}", self.base_url, hit.url)),
            None => Err(ProviderError::InstrumentNotFound {
                instrument: instrument.to_string(),
            }),
        }
    }

    fn fetch_today(&self, url: &str) -> Result<RawQuote, ProviderError> {
        let row: QuoteRow = self.get_json(url, &[])?;
        Ok(row_to_quote(&row))
    }

    fn fetch_history(&self, url: &str) -> Result<Vec<RawQuote>, ProviderError> {
        let history_url = format!("{url}-historical-data");
        let resp: HistoryResponse = self.get_json(&history_url, &[])?;
        Ok(resp.rows.iter().map(row_to_quote).collect())
    }
}

fn classify_transport_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout(e.to_string())
    } else {
        ProviderError::Network(e.to_string())
    }
}

/// Convert a raw row into a RawQuote.
///
/// A missing or unparsable date falls back to the local calendar day — the
/// quote page renders today's figures without restating the date.
fn row_to_quote(row: &QuoteRow) -> RawQuote {
    let date = row
        .date
        .as_deref()
        .and_then(|d| NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d").ok())
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    RawQuote {
        date,
        close: row.price.as_deref().and_then(parse_numeric_field),
        open: row.open.as_deref().and_then(parse_numeric_field),
        high: row.high.as_deref().and_then(parse_numeric_field),
        low: row.low.as_deref().and_then(parse_numeric_field),
        change_percent: row.change_percent.as_deref().and_then(parse_numeric_field),
    }
}
