//! PriceRecord — the fundamental per-day data unit.

use crate::data::provider::RawQuote;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// OHLC + change data for a single instrument on a single trading day.
///
/// `close` is the "Price" column of the persisted table. `change_percent`
/// may be absent when the source page renders it unparsable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub date: NaiveDate,
    pub close: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub change_percent: Option<f64>,
}

/// Why an incoming quote was refused at the merge boundary.
///
/// A rejection leaves the existing series untouched; it is reported per
/// instrument, never swallowed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RejectedRecord {
    #[error("{date}: required field '{field}' is missing or unparsable")]
    MissingField { date: NaiveDate, field: &'static str },

    #[error("{date}: field '{field}' must be positive, got {value}")]
    NonPositive {
        date: NaiveDate,
        field: &'static str,
        value: f64,
    },

    #[error("{date}: OHLC range is inconsistent (low {low}, open {open}, close {close}, high {high})")]
    InconsistentRange {
        date: NaiveDate,
        low: f64,
        open: f64,
        close: f64,
        high: f64,
    },
}

impl PriceRecord {
    /// Validate a raw quote into a well-formed record.
    ///
    /// Required: close, open, high, low — all positive, with
    /// `low <= {open, close} <= high`. `change_percent` stays optional.
    pub fn from_raw(raw: &RawQuote) -> Result<Self, RejectedRecord> {
        let date = raw.date;
        let close = require(date, "close", raw.close)?;
        let open = require(date, "open", raw.open)?;
        let high = require(date, "high", raw.high)?;
        let low = require(date, "low", raw.low)?;

        if low > open || low > close || high < open || high < close || high < low {
            return Err(RejectedRecord::InconsistentRange {
                date,
                low,
                open,
                close,
                high,
            });
        }

        Ok(Self {
            date,
            close,
            open,
            high,
            low,
            change_percent: raw.change_percent,
        })
    }
}

fn require(
    date: NaiveDate,
    field: &'static str,
    value: Option<f64>,
) -> Result<f64, RejectedRecord> {
    match value {
        None => Err(RejectedRecord::MissingField { date, field }),
        Some(v) if !(v > 0.0) || !v.is_finite() => {
            Err(RejectedRecord::NonPositive { date, field, value: v })
        }
        Some(v) => Ok(v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(close: Option<f64>) -> RawQuote {
        RawQuote {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            close,
            open: Some(100.0),
            high: Some(105.0),
            low: Some(98.0),
            change_percent: Some(1.5),
        }
    }

    #[test]
    fn valid_quote_becomes_record() {
        let rec = PriceRecord::from_raw(&raw(Some(103.0))).unwrap();
        assert_eq!(rec.close, 103.0);
        assert_eq!(rec.change_percent, Some(1.5));
    }

    #[test]
    fn missing_close_is_rejected() {
        let err = PriceRecord::from_raw(&raw(None)).unwrap_err();
        assert!(matches!(
            err,
            RejectedRecord::MissingField { field: "close", .. }
        ));
    }

    #[test]
    fn missing_change_percent_is_fine() {
        let mut q = raw(Some(103.0));
        q.change_percent = None;
        let rec = PriceRecord::from_raw(&q).unwrap();
        assert_eq!(rec.change_percent, None);
    }

    #[test]
    fn non_positive_price_is_rejected() {
        let err = PriceRecord::from_raw(&raw(Some(-3.0))).unwrap_err();
        assert!(matches!(err, RejectedRecord::NonPositive { .. }));
    }

    #[test]
    fn inverted_range_is_rejected() {
        let mut q = raw(Some(103.0));
        q.low = Some(104.0); // above close
        let err = PriceRecord::from_raw(&q).unwrap_err();
        assert!(matches!(err, RejectedRecord::InconsistentRange { .. }));
    }

    #[test]
    fn nan_field_is_rejected() {
        let err = PriceRecord::from_raw(&raw(Some(f64::NAN))).unwrap_err();
        assert!(matches!(err, RejectedRecord::NonPositive { .. }));
    }

    #[test]
    fn record_serialization_roundtrip() {
        let rec = PriceRecord::from_raw(&raw(Some(103.0))).unwrap();
        let json = serde_json::to_string(&rec).unwrap();
        let deser: PriceRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(rec, deser);
    }
}
