//! Data layer: quote provider seam, record merger, CSV series store.

pub mod http;
pub mod merge;
pub mod provider;
pub mod store;

pub use http::HttpQuoteProvider;
pub use merge::{merge, merge_history, merge_raw};
pub use provider::{parse_numeric_field, ProviderError, QuoteProvider, RawQuote};
pub use store::{instrument_slug, CsvStore, StoreError, StoreMeta, StoreStatus};
