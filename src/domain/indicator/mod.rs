//! Streaming technical indicators.
//!
//! Every indicator is a small state machine with an `update` method taking
//! the next value (or bar) and returning `Option` of its output:
//! - `rolling`: SMA and standard deviation over a fixed window
//! - `rsi`: Wilder RSI
//! - `connors`: Connors RSI with its streak and percent-rank components
//! - `extremes`: rolling highest / lowest
//! - `bollinger`: Bollinger Bands
//! - `vwap`: cumulative VWAP with optional session reset
//! - `zscore`: rolling z-score of a spread
//! - `bank`: the per-instrument set consumed by the strategy evaluators

pub mod bank;
pub mod bollinger;
pub mod connors;
pub mod extremes;
pub mod rolling;
pub mod rsi;
pub mod vwap;
pub mod zscore;

pub use bank::{IndicatorBank, IndicatorState};
pub use bollinger::Bands;
pub use vwap::VwapReset;
