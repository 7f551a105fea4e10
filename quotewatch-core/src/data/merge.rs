//! Record merger — reconcile an observed day against the stored series.
//!
//! Merging is pure and idempotent: the output has exactly one record per
//! distinct date in the union of inputs, ascending. Re-applying the same
//! day's record is a no-op beyond field equality, which is what lets the
//! scheduler re-run intraday without ever duplicating a row.

use super::provider::RawQuote;
use crate::domain::{PriceRecord, RejectedRecord, Series};

/// Merge one validated record into a series.
///
/// - empty series → one-record series
/// - existing date → replace that record's fields (update semantics)
/// - new date → sorted insert
pub fn merge(existing: &Series, incoming: PriceRecord) -> Series {
    let mut records = existing.records().to_vec();
    match existing.index_of(incoming.date) {
        Ok(i) => records[i] = incoming,
        Err(i) => records.insert(i, incoming),
    }
    Series::from_vec_unchecked(existing.instrument().to_string(), records)
}

/// Validate a raw quote, then merge it.
///
/// On rejection the existing series is simply not replaced — the caller
/// reports the rejection and keeps what it has.
pub fn merge_raw(existing: &Series, raw: &RawQuote) -> Result<Series, RejectedRecord> {
    let record = PriceRecord::from_raw(raw)?;
    Ok(merge(existing, record))
}

/// Merge a batch of raw quotes (backfill path).
///
/// Every parsable row is merged; rejections are collected, not fatal. Later
/// rows win when the batch itself repeats a date.
pub fn merge_history(existing: &Series, raws: &[RawQuote]) -> (Series, Vec<RejectedRecord>) {
    let mut series = existing.clone();
    let mut rejected = Vec::new();
    for raw in raws {
        match merge_raw(&series, raw) {
            Ok(next) => series = next,
            Err(e) => rejected.push(e),
        }
    }
    (series, rejected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn rec(day: u32, close: f64) -> PriceRecord {
        PriceRecord {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            close,
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            change_percent: None,
        }
    }

    fn two_day_series() -> Series {
        Series::from_records("Tesla", vec![rec(1, 100.0), rec(2, 102.0)]).unwrap()
    }

    #[test]
    fn merge_into_empty_yields_single_record() {
        let merged = merge(&Series::empty("Tesla"), rec(2, 103.0));
        assert_eq!(merged.len(), 1);
        assert_eq!(merged.records()[0].close, 103.0);
    }

    #[test]
    fn same_date_updates_in_place() {
        // existing [(01-01, 100), (01-02, 102)]; incoming (01-02, 103)
        let merged = merge(&two_day_series(), rec(2, 103.0));
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.records()[0].close, 100.0);
        assert_eq!(merged.records()[1].close, 103.0);
    }

    #[test]
    fn new_date_inserts_ascending() {
        let merged = merge(&two_day_series(), rec(3, 105.0));
        assert_eq!(merged.len(), 3);
        let last = merged.last().unwrap();
        assert_eq!(last.date, NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
        assert_eq!(last.close, 105.0);
    }

    #[test]
    fn out_of_order_arrival_keeps_ordering() {
        let merged = merge(&two_day_series(), rec(1, 99.0));
        let merged = merge(&merged, {
            let mut r = rec(1, 99.0);
            r.date = NaiveDate::from_ymd_opt(2023, 12, 29).unwrap();
            r
        });
        let dates: Vec<_> = merged.records().iter().map(|r| r.date).collect();
        let mut sorted = dates.clone();
        sorted.sort();
        assert_eq!(dates, sorted);
    }

    #[test]
    fn merge_is_idempotent() {
        let once = merge(&two_day_series(), rec(3, 105.0));
        let twice = merge(&once, rec(3, 105.0));
        assert_eq!(once, twice);
    }

    #[test]
    fn unparsable_quote_is_rejected_and_nothing_changes() {
        let existing = Series::empty("Tesla");
        let raw = RawQuote {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            close: None,
            open: Some(100.0),
            high: Some(101.0),
            low: Some(99.0),
            change_percent: None,
        };
        assert!(merge_raw(&existing, &raw).is_err());
        assert!(existing.is_empty());
    }

    #[test]
    fn history_batch_collects_rejections() {
        let raws: Vec<RawQuote> = (1..=4)
            .map(|day| RawQuote {
                date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
                close: if day == 3 { None } else { Some(100.0 + day as f64) },
                open: Some(100.0),
                high: Some(110.0),
                low: Some(95.0),
                change_percent: None,
            })
            .collect();

        let (series, rejected) = merge_history(&Series::empty("Tesla"), &raws);
        assert_eq!(series.len(), 3);
        assert_eq!(rejected.len(), 1);
        assert!(matches!(
            rejected[0],
            RejectedRecord::MissingField { field: "close", .. }
        ));
    }
}
