//! Pairs z-score hedge.
//!
//! The spread is the one-bar return of the long leg minus that of the short
//! leg. From flat, a z-score above `z_entry` shorts the spread and one below
//! `-z_entry` buys it. An open pair closes on its own cumulative spread P&L
//! first, then on the z-score returning inside `z_exit`.

use chrono::NaiveDate;
use serde::Serialize;

use super::error::HedgeError;
use super::event::ExitReason;
use super::indicator::zscore::ZScore;
use super::position::Side;
use super::signal::SignalKind;

#[derive(Debug, Clone, PartialEq)]
pub struct PairParams {
    pub z_window: usize,
    pub z_entry: f64,
    pub z_exit: f64,
    /// Cumulative spread return that stops the pair out; negative.
    pub stop_loss: f64,
    pub take_profit: f64,
    pub max_investment_pct: f64,
}

impl Default for PairParams {
    fn default() -> Self {
        PairParams {
            z_window: 20,
            z_entry: 2.5,
            z_exit: 1.0,
            stop_loss: -0.4,
            take_profit: 0.4,
            max_investment_pct: 0.1,
        }
    }
}

impl PairParams {
    pub fn validate(&self) -> Result<(), HedgeError> {
        if self.z_window < 2 {
            return Err(HedgeError::invalid_parameter(
                "z_window",
                "need at least 2 bars for a sample deviation",
            ));
        }
        if !(self.z_exit >= 0.0) {
            return Err(HedgeError::invalid_parameter("z_exit", "must be non-negative"));
        }
        if !(self.z_entry > self.z_exit) {
            return Err(HedgeError::invalid_parameter("z_entry", "must exceed z_exit"));
        }
        if !(self.stop_loss < 0.0) {
            return Err(HedgeError::invalid_parameter("stop_loss", "must be negative"));
        }
        if !(self.take_profit > 0.0) {
            return Err(HedgeError::invalid_parameter("take_profit", "must be positive"));
        }
        if !(self.max_investment_pct > 0.0 && self.max_investment_pct <= 1.0) {
            return Err(HedgeError::invalid_parameter(
                "max_investment_pct",
                "must be within (0, 1]",
            ));
        }
        Ok(())
    }
}

/// An open spread position. `Side::Long` is long the spread (long leg bought,
/// short leg sold); `Side::Short` is the reverse.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairPosition {
    pub long_leg: String,
    pub short_leg: String,
    pub side: Side,
    pub entry_spread: f64,
    pub entry_date: NaiveDate,
    pub entry_index: usize,
    pub allocated_capital: f64,
    pub cumulative_pnl: f64,
}

impl PairPosition {
    pub fn key(&self) -> String {
        pair_key(&self.long_leg, &self.short_leg)
    }

    /// Marked value: the allocation grown by the cumulative spread return.
    /// A pair can lose at most what was allocated to it.
    pub fn value(&self) -> f64 {
        (self.allocated_capital * (1.0 + self.cumulative_pnl)).max(0.0)
    }
}

pub fn pair_key(long_leg: &str, short_leg: &str) -> String {
    format!("{long_leg}/{short_leg}")
}

/// Outcome of one bar of pair evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairStep {
    pub signal: SignalKind,
    pub exit_reason: Option<ExitReason>,
    pub spread: Option<f64>,
    pub z: Option<f64>,
    /// Direction-adjusted spread return earned this bar while open.
    pub bar_pnl: f64,
    /// Cumulative P&L after this bar, before any reset on exit.
    pub cumulative_pnl: f64,
}

#[derive(Debug, Clone)]
pub struct PairsHedge {
    params: PairParams,
    zscore: ZScore,
    prev_closes: Option<(f64, f64)>,
    side: Side,
    cumulative_pnl: f64,
}

impl PairsHedge {
    pub fn new(params: PairParams) -> Self {
        PairsHedge {
            zscore: ZScore::new(params.z_window),
            params,
            prev_closes: None,
            side: Side::Flat,
            cumulative_pnl: 0.0,
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn cumulative_pnl(&self) -> f64 {
        self.cumulative_pnl
    }

    pub fn params(&self) -> &PairParams {
        &self.params
    }

    /// Fold one aligned pair of closes. The first bar has no return and so
    /// no spread.
    pub fn update(&mut self, long_close: f64, short_close: f64) -> PairStep {
        let spread = self
            .prev_closes
            .map(|(pl, ps)| (long_close / pl - 1.0) - (short_close / ps - 1.0));
        self.prev_closes = Some((long_close, short_close));
        let z = spread.and_then(|s| self.zscore.update(s));
        self.step(spread, z)
    }

    /// Apply the entry/exit rules to an already computed spread and z-score.
    pub fn step(&mut self, spread: Option<f64>, z: Option<f64>) -> PairStep {
        let mut out = PairStep {
            signal: SignalKind::Hold,
            exit_reason: None,
            spread,
            z,
            bar_pnl: 0.0,
            cumulative_pnl: 0.0,
        };

        match self.side {
            Side::Flat => {
                self.cumulative_pnl = 0.0;
                match z {
                    Some(z) if z > self.params.z_entry => {
                        self.side = Side::Short;
                        out.signal = SignalKind::ShortEntry;
                    }
                    Some(z) if z < -self.params.z_entry => {
                        self.side = Side::Long;
                        out.signal = SignalKind::LongEntry;
                    }
                    _ => {}
                }
            }
            open => {
                let sign = if open == Side::Short { -1.0 } else { 1.0 };
                out.bar_pnl = spread.map_or(0.0, |s| sign * s);
                self.cumulative_pnl += out.bar_pnl;
                out.cumulative_pnl = self.cumulative_pnl;

                let reason = if self.cumulative_pnl < self.params.stop_loss {
                    Some(ExitReason::PnlStop)
                } else if self.cumulative_pnl > self.params.take_profit {
                    Some(ExitReason::PnlTarget)
                } else if z.is_some_and(|z| match open {
                    Side::Short => z <= self.params.z_exit,
                    _ => z >= -self.params.z_exit,
                }) {
                    Some(ExitReason::ZScore)
                } else {
                    None
                };

                if let Some(reason) = reason {
                    out.signal = SignalKind::Exit;
                    out.exit_reason = Some(reason);
                    self.side = Side::Flat;
                    self.cumulative_pnl = 0.0;
                }
            }
        }
        out
    }
}
