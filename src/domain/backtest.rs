//! Single-instrument backtest loop.
//!
//! Each bar flows through the indicator bank, the arbitrator and the position
//! manager, and the portfolio is marked to market once before the next bar is
//! read.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use tracing::{debug, info};

use super::arbitrator::Arbitrator;
use super::error::HedgeError;
use super::event::TradeEvent;
use super::indicator::IndicatorBank;
use super::metrics::{Metrics, PerformanceConfig};
use super::ohlcv::OhlcvBar;
use super::portfolio::{EquityPoint, Portfolio};
use super::position::ClosedTrade;
use super::risk::{ExitMode, PositionManager, RiskLimits};
use super::signal::StrategyTag;
use super::strategy::StrategyParams;

/// Which evaluators drive entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrategySelection {
    /// Mean reversion, trend following and breakout in priority order.
    #[default]
    Combined,
    Single(StrategyTag),
}

impl StrategySelection {
    /// Exit policy when none is configured: cross-strategy exits only make
    /// sense with several evaluators.
    pub fn default_exit_mode(self) -> ExitMode {
        match self {
            StrategySelection::Combined => ExitMode::CrossStrategy,
            StrategySelection::Single(_) => ExitMode::StrategyLocal,
        }
    }
}

impl fmt::Display for StrategySelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategySelection::Combined => write!(f, "combined"),
            StrategySelection::Single(tag) => write!(f, "{tag}"),
        }
    }
}

impl FromStr for StrategySelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("combined") {
            return Ok(StrategySelection::Combined);
        }
        match s.parse::<StrategyTag>()? {
            StrategyTag::PairsHedge => {
                Err("pairs_hedge is run with the pairs command".to_string())
            }
            tag => Ok(StrategySelection::Single(tag)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    pub selection: StrategySelection,
    pub exit_mode: ExitMode,
    pub limits: RiskLimits,
    pub performance: PerformanceConfig,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_capital: 100_000.0,
            selection: StrategySelection::Combined,
            exit_mode: StrategySelection::Combined.default_exit_mode(),
            limits: RiskLimits::default(),
            performance: PerformanceConfig::default(),
        }
    }
}

impl BacktestConfig {
    pub fn validate(&self) -> Result<(), HedgeError> {
        if !(self.initial_capital > 0.0) || !self.initial_capital.is_finite() {
            return Err(HedgeError::invalid_parameter(
                "initial_capital",
                "must be positive",
            ));
        }
        self.limits.validate()?;
        self.performance.validate()
    }

    pub fn arbitrator(&self, params: &StrategyParams) -> Result<Arbitrator, HedgeError> {
        match self.selection {
            StrategySelection::Combined => Arbitrator::combined(params),
            StrategySelection::Single(tag) => Arbitrator::single(tag, params),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub code: String,
    pub final_cash: f64,
    pub equity_curve: Vec<EquityPoint>,
    pub events: Vec<TradeEvent>,
    pub trades: Vec<ClosedTrade>,
    pub metrics: Metrics,
}

/// Run one instrument over its full bar sequence.
///
/// A position still open after the last bar stays open and is carried in the
/// final equity at that bar's close.
pub fn run_backtest(
    bars: &[OhlcvBar],
    params: &StrategyParams,
    config: &BacktestConfig,
) -> Result<BacktestResult, HedgeError> {
    params.validate()?;
    config.validate()?;
    let Some(first) = bars.first() else {
        return Err(HedgeError::InsufficientData {
            code: String::new(),
            bars: 0,
            minimum: 1,
        });
    };
    let code = first.code.clone();

    let arbitrator = config.arbitrator(params)?;
    let manager = PositionManager::new(code.clone(), config.limits.clone(), config.exit_mode);
    let mut bank = IndicatorBank::new(params);
    let mut portfolio = Portfolio::new(config.initial_capital);
    let mut prices: HashMap<String, f64> = HashMap::with_capacity(1);

    info!(
        code = %code,
        bars = bars.len(),
        strategy = %config.selection,
        exit_mode = %config.exit_mode,
        "starting backtest"
    );

    for bar in bars {
        let state = bank.update(bar)?;
        manager.step(&mut portfolio, &state, &arbitrator)?;
        prices.insert(code.clone(), bar.close);
        let equity = portfolio.mark_to_market(bar.date, &prices);
        debug!(date = %bar.date, close = bar.close, equity, "bar");
    }

    let metrics = Metrics::compute(
        &portfolio.equity_curve,
        &portfolio.closed_trades,
        portfolio.initial_capital,
        &config.performance,
    );

    info!(
        code = %code,
        trades = metrics.total_trades,
        total_return = metrics.total_return,
        "backtest complete"
    );

    Ok(BacktestResult {
        code,
        final_cash: portfolio.cash,
        equity_curve: portfolio.equity_curve,
        events: portfolio.events,
        trades: portfolio.closed_trades,
        metrics,
    })
}
