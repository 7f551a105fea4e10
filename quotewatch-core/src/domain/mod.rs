//! Domain types: price records and per-instrument series.

pub mod record;
pub mod series;

pub use record::{PriceRecord, RejectedRecord};
pub use series::{DuplicateDate, Series};
