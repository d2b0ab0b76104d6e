//! Core domain types and logic: indicators, strategies, positions and the
//! backtest, pairs, sweep and screening engines.

pub mod ohlcv;
pub mod signal;
pub mod event;
pub mod indicator;
pub mod strategy;
pub mod arbitrator;
pub mod position;
pub mod portfolio;
pub mod risk;
pub mod pairs;
pub mod allocator;
pub mod backtest;
pub mod metrics;
pub mod sweep;
pub mod correlation;
pub mod config_validation;
pub mod error;
