//! Performance metrics derived from a finished run.
//!
//! Everything here is a pure function of the equity curve and the closed
//! trade log.

use std::fmt;

use serde::Serialize;

use super::error::HedgeError;
use super::portfolio::EquityPoint;
use super::position::ClosedTrade;

/// Volatility at or below this is treated as zero when forming Sharpe.
const ZERO_VOLATILITY: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceConfig {
    pub risk_free_rate: f64,
    pub periods_per_year: f64,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        PerformanceConfig {
            risk_free_rate: 0.01,
            periods_per_year: 252.0,
        }
    }
}

impl PerformanceConfig {
    pub fn validate(&self) -> Result<(), HedgeError> {
        if !(0.0..1.0).contains(&self.risk_free_rate) {
            return Err(HedgeError::invalid_parameter(
                "risk_free_rate",
                "must be within [0, 1)",
            ));
        }
        if !(self.periods_per_year > 0.0) || !self.periods_per_year.is_finite() {
            return Err(HedgeError::invalid_parameter(
                "periods_per_year",
                "must be positive",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metrics {
    pub final_equity: f64,
    pub total_return: f64,
    pub annualized_return: f64,
    pub annualized_volatility: f64,
    /// `None` when volatility is zero or there are fewer than two returns.
    pub sharpe_ratio: Option<f64>,
    /// Worst `equity / running_max - 1`; zero or negative.
    pub max_drawdown: f64,
    /// Longest run of bars spent below a prior peak.
    pub max_drawdown_duration: usize,
    pub total_trades: usize,
    pub win_count: usize,
    pub loss_count: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    /// Mean holding length in bars.
    pub avg_trade_duration: f64,
}

impl Metrics {
    pub fn compute(
        equity_curve: &[EquityPoint],
        trades: &[ClosedTrade],
        initial_capital: f64,
        config: &PerformanceConfig,
    ) -> Self {
        let final_equity = equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(initial_capital);

        let total_return = if initial_capital > 0.0 {
            final_equity / initial_capital - 1.0
        } else {
            0.0
        };

        let returns = period_returns(equity_curve);
        let periods = returns.len() as f64;
        let annualized_return = if returns.is_empty() {
            0.0
        } else if 1.0 + total_return <= 0.0 {
            -1.0
        } else {
            (1.0 + total_return).powf(config.periods_per_year / periods) - 1.0
        };

        let annualized_volatility =
            sample_stddev(&returns).map_or(0.0, |sd| sd * config.periods_per_year.sqrt());
        let sharpe_ratio = (annualized_volatility > ZERO_VOLATILITY
            && annualized_volatility.is_finite())
        .then(|| (annualized_return - config.risk_free_rate) / annualized_volatility);

        let (max_drawdown, max_drawdown_duration) = compute_drawdown(equity_curve);

        let mut win_count = 0usize;
        let mut loss_count = 0usize;
        let mut total_wins = 0.0_f64;
        let mut total_losses = 0.0_f64;
        let mut total_bars = 0usize;

        for trade in trades {
            if trade.pnl > 0.0 {
                win_count += 1;
                total_wins += trade.pnl;
            } else if trade.pnl < 0.0 {
                loss_count += 1;
                total_losses += trade.pnl.abs();
            }
            total_bars += trade.bars_held;
        }

        let total_trades = trades.len();
        let win_rate = if total_trades > 0 {
            win_count as f64 / total_trades as f64
        } else {
            0.0
        };

        let profit_factor = if total_losses > 0.0 {
            total_wins / total_losses
        } else if total_wins > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        let avg_win = if win_count > 0 {
            total_wins / win_count as f64
        } else {
            0.0
        };

        let avg_loss = if loss_count > 0 {
            total_losses / loss_count as f64
        } else {
            0.0
        };

        let avg_trade_duration = if total_trades > 0 {
            total_bars as f64 / total_trades as f64
        } else {
            0.0
        };

        Metrics {
            final_equity,
            total_return,
            annualized_return,
            annualized_volatility,
            sharpe_ratio,
            max_drawdown,
            max_drawdown_duration,
            total_trades,
            win_count,
            loss_count,
            win_rate,
            profit_factor,
            avg_win,
            avg_loss,
            avg_trade_duration,
        }
    }
}

impl fmt::Display for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sharpe = match self.sharpe_ratio {
            Some(s) => format!("{s:.4}"),
            None => "None".to_string(),
        };
        writeln!(f, "Final equity:          {:.2}", self.final_equity)?;
        writeln!(f, "Total return:          {:.2}%", self.total_return * 100.0)?;
        writeln!(f, "Annualized return:     {:.2}%", self.annualized_return * 100.0)?;
        writeln!(f, "Annualized volatility: {:.2}%", self.annualized_volatility * 100.0)?;
        writeln!(f, "Sharpe ratio:          {sharpe}")?;
        writeln!(f, "Max drawdown:          {:.2}%", self.max_drawdown * 100.0)?;
        writeln!(f, "Total trades:          {}", self.total_trades)?;
        writeln!(f, "Wins / losses:         {} / {}", self.win_count, self.loss_count)?;
        write!(f, "Avg trade duration:    {:.1} bars", self.avg_trade_duration)
    }
}

/// One-period simple returns of the curve. A non-positive prior equity
/// yields a zero return rather than a division blow-up.
pub fn period_returns(equity_curve: &[EquityPoint]) -> Vec<f64> {
    equity_curve
        .windows(2)
        .map(|w| {
            let prev = w[0].equity;
            if prev > 0.0 {
                w[1].equity / prev - 1.0
            } else {
                0.0
            }
        })
        .collect()
}

fn sample_stddev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(variance.sqrt())
}

fn compute_drawdown(equity_curve: &[EquityPoint]) -> (f64, usize) {
    let Some(first) = equity_curve.first() else {
        return (0.0, 0);
    };

    let mut peak = first.equity;
    let mut max_dd = 0.0_f64;
    let mut current_duration = 0usize;
    let mut max_duration = 0usize;

    for point in equity_curve {
        if point.equity >= peak {
            peak = point.equity;
            current_duration = 0;
        } else if peak > 0.0 {
            max_dd = max_dd.min(point.equity / peak - 1.0);
            current_duration += 1;
            max_duration = max_duration.max(current_duration);
        }
    }

    (max_dd, max_duration)
}
