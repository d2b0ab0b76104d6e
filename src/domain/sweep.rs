//! Brute-force parameter sweep.
//!
//! Each combination runs as an independent backtest with its own indicator
//! bank and portfolio. Combinations run on the rayon pool and are collected
//! back in enumeration order, so best-Sharpe selection sees the same
//! sequence whatever the thread count.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use tracing::{info, warn};

use super::backtest::{BacktestConfig, run_backtest};
use super::error::HedgeError;
use super::metrics::Metrics;
use super::ohlcv::OhlcvBar;
use super::strategy::StrategyParams;

/// Candidate values per strategy parameter. The cartesian product is
/// enumerated with the last field varying fastest.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamGrid {
    pub mean_reversion_period: Vec<usize>,
    pub mean_reversion_dev_factor: Vec<f64>,
    pub crsi_rsi_period: Vec<usize>,
    pub crsi_streak_period: Vec<usize>,
    pub crsi_rank_period: Vec<usize>,
    pub crsi_lower_threshold: Vec<f64>,
    pub crsi_upper_threshold: Vec<f64>,
    pub trend_following_period: Vec<usize>,
    pub breakout_period: Vec<usize>,
}

impl ParamGrid {
    /// A one-combination grid holding `base`'s values.
    pub fn from_base(base: &StrategyParams) -> Self {
        ParamGrid {
            mean_reversion_period: vec![base.mean_reversion_period],
            mean_reversion_dev_factor: vec![base.mean_reversion_dev_factor],
            crsi_rsi_period: vec![base.crsi_rsi_period],
            crsi_streak_period: vec![base.crsi_streak_period],
            crsi_rank_period: vec![base.crsi_rank_period],
            crsi_lower_threshold: vec![base.crsi_lower_threshold],
            crsi_upper_threshold: vec![base.crsi_upper_threshold],
            trend_following_period: vec![base.trend_following_period],
            breakout_period: vec![base.breakout_period],
        }
    }

    fn radices(&self) -> [usize; 9] {
        [
            self.mean_reversion_period.len(),
            self.mean_reversion_dev_factor.len(),
            self.crsi_rsi_period.len(),
            self.crsi_streak_period.len(),
            self.crsi_rank_period.len(),
            self.crsi_lower_threshold.len(),
            self.crsi_upper_threshold.len(),
            self.trend_following_period.len(),
            self.breakout_period.len(),
        ]
    }

    /// Number of combinations. A product that does not fit in `usize` is
    /// rejected rather than wrapped.
    pub fn size(&self) -> Result<usize, HedgeError> {
        self.radices()
            .iter()
            .try_fold(1usize, |acc, &radix| acc.checked_mul(radix))
            .ok_or_else(|| HedgeError::invalid_parameter("sweep", "grid too large"))
    }

    /// The combination at `index` in enumeration order, with fields outside
    /// the grid taken from `base`. `None` past the end.
    pub fn combination(&self, index: usize, base: &StrategyParams) -> Option<StrategyParams> {
        if index >= self.size().ok()? {
            return None;
        }
        let radices = self.radices();
        let mut digits = [0usize; 9];
        let mut rest = index;
        for (digit, &radix) in digits.iter_mut().zip(radices.iter()).rev() {
            *digit = rest % radix;
            rest /= radix;
        }
        Some(StrategyParams {
            mean_reversion_period: self.mean_reversion_period[digits[0]],
            mean_reversion_dev_factor: self.mean_reversion_dev_factor[digits[1]],
            crsi_rsi_period: self.crsi_rsi_period[digits[2]],
            crsi_streak_period: self.crsi_streak_period[digits[3]],
            crsi_rank_period: self.crsi_rank_period[digits[4]],
            crsi_lower_threshold: self.crsi_lower_threshold[digits[5]],
            crsi_upper_threshold: self.crsi_upper_threshold[digits[6]],
            trend_following_period: self.trend_following_period[digits[7]],
            breakout_period: self.breakout_period[digits[8]],
            ..base.clone()
        })
    }

    /// Indices to evaluate: the full grid, or `sample` of them drawn with a
    /// seeded generator and returned in enumeration order.
    pub fn sample_indices(&self, sample: usize, seed: u64) -> Result<Vec<usize>, HedgeError> {
        let size = self.size()?;
        if sample == 0 || sample >= size {
            return Ok((0..size).collect());
        }
        let mut rng = StdRng::seed_from_u64(seed);
        let mut picked = rand::seq::index::sample(&mut rng, size, sample).into_vec();
        picked.sort_unstable();
        Ok(picked)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SweepRow {
    /// Position of the combination in the full grid enumeration.
    pub index: usize,
    pub params: StrategyParams,
    /// Metrics, or the error that stopped this combination.
    pub outcome: Result<Metrics, String>,
}

impl SweepRow {
    pub fn sharpe(&self) -> Option<f64> {
        self.outcome
            .as_ref()
            .ok()
            .and_then(|m| m.sharpe_ratio)
            .filter(|s| !s.is_nan())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SweepReport {
    pub rows: Vec<SweepRow>,
    /// Position in `rows` of the best-Sharpe combination.
    pub best: Option<usize>,
}

impl SweepReport {
    pub fn best_row(&self) -> Option<&SweepRow> {
        self.best.and_then(|i| self.rows.get(i))
    }

    pub fn failures(&self) -> usize {
        self.rows.iter().filter(|r| r.outcome.is_err()).count()
    }
}

/// Strictly highest defined Sharpe; on ties the earliest row wins.
pub fn select_best(rows: &[SweepRow]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, row) in rows.iter().enumerate() {
        let Some(sharpe) = row.sharpe() else {
            continue;
        };
        if best.is_none_or(|(_, b)| sharpe > b) {
            best = Some((i, sharpe));
        }
    }
    best.map(|(i, _)| i)
}

/// Run every selected combination over `bars`.
///
/// A combination whose run fails is kept as a failed row and skipped by
/// best selection. Only an invalid shared `config` aborts the sweep.
pub fn run_sweep(
    bars: &[OhlcvBar],
    grid: &ParamGrid,
    base: &StrategyParams,
    config: &BacktestConfig,
    sample: usize,
    seed: u64,
) -> Result<SweepReport, HedgeError> {
    config.validate()?;
    let size = grid.size()?;
    if size == 0 {
        return Err(HedgeError::invalid_parameter(
            "sweep",
            "every parameter needs at least one candidate",
        ));
    }
    let indices = grid.sample_indices(sample, seed)?;
    info!(
        combinations = indices.len(),
        grid = size,
        threads = rayon::current_num_threads(),
        "starting sweep"
    );

    let rows: Vec<SweepRow> = indices
        .par_iter()
        .filter_map(|&index| grid.combination(index, base).map(|params| (index, params)))
        .map(|(index, params)| {
            let outcome = run_backtest(bars, &params, config)
                .map(|r| r.metrics)
                .map_err(|e| e.to_string());
            if let Err(reason) = &outcome {
                warn!(index, %reason, "combination failed");
            }
            SweepRow {
                index,
                params,
                outcome,
            }
        })
        .collect();

    let best = select_best(&rows);
    let report = SweepReport { rows, best };
    info!(
        failures = report.failures(),
        best = ?report.best_row().map(|r| r.index),
        "sweep complete"
    );
    Ok(report)
}
