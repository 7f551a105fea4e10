//! QuoteWatch Core — rolling per-instrument price history and indicators.
//!
//! This crate contains the heart of the tracker:
//! - Domain types (price records, per-instrument series)
//! - CSV-backed series store with atomic replacement
//! - Record merger (insert-or-update by date, duplicate-free)
//! - Indicator engine (moving average, RSI, Bollinger Bands, MACD)
//! - Pipeline orchestrator driving fetch → merge → persist → compute → render

pub mod config;
pub mod data;
pub mod domain;
pub mod indicators;
pub mod pipeline;
