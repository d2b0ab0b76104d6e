//! hedgetrader: streaming indicator, signal and portfolio simulation engine
//! for single-instrument and pairs backtests.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
