//! Series — ordered per-instrument price history.
//!
//! Invariant: record dates are strictly ascending by position, therefore
//! unique. Every constructor and every producer (store load, merger) either
//! preserves the invariant or fails; nothing else hands out a `Series`.

use super::record::PriceRecord;
use chrono::NaiveDate;
use thiserror::Error;

/// Two records in a candidate series share a date.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("duplicate date {date} in series for '{instrument}'")]
pub struct DuplicateDate {
    pub instrument: String,
    pub date: NaiveDate,
}

/// Ordered price history for exactly one instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    instrument: String,
    records: Vec<PriceRecord>,
}

impl Series {
    /// An empty history for the given instrument.
    pub fn empty(instrument: impl Into<String>) -> Self {
        Self {
            instrument: instrument.into(),
            records: Vec::new(),
        }
    }

    /// Build a series from records in any order.
    ///
    /// Sorts ascending by date and fails on duplicates — callers loading
    /// persisted data map the failure to a corruption error.
    pub fn from_records(
        instrument: impl Into<String>,
        mut records: Vec<PriceRecord>,
    ) -> Result<Self, DuplicateDate> {
        let instrument = instrument.into();
        records.sort_by_key(|r| r.date);
        for pair in records.windows(2) {
            if pair[0].date == pair[1].date {
                return Err(DuplicateDate {
                    instrument,
                    date: pair[0].date,
                });
            }
        }
        Ok(Self {
            instrument,
            records,
        })
    }

    /// Construct from records already known to be ascending and unique.
    pub(crate) fn from_vec_unchecked(instrument: String, records: Vec<PriceRecord>) -> Self {
        debug_assert!(records.windows(2).all(|p| p[0].date < p[1].date));
        Self {
            instrument,
            records,
        }
    }

    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    pub fn records(&self) -> &[PriceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first(&self) -> Option<&PriceRecord> {
        self.records.first()
    }

    pub fn last(&self) -> Option<&PriceRecord> {
        self.records.last()
    }

    /// Binary search by date: `Ok(i)` if present, `Err(i)` with the sorted
    /// insertion point otherwise.
    pub fn index_of(&self, date: NaiveDate) -> Result<usize, usize> {
        self.records.binary_search_by_key(&date, |r| r.date)
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.index_of(date).is_ok()
    }
}
