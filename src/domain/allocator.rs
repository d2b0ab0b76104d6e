//! Multi-pair hedge run.
//!
//! Several pairs trade concurrently from one cash pool. Each pair entry takes
//! `min(cash, initial_capital) * max_investment_pct` out of cash and returns
//! its marked value on exit. Equity is recorded once per timeline bar.

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::{debug, info};

use super::error::HedgeError;
use super::event::{EventAction, ExitReason, TradeEvent};
use super::metrics::{Metrics, PerformanceConfig};
use super::ohlcv::{OhlcvBar, validate_bars};
use super::pairs::{PairParams, PairPosition, PairStep, PairsHedge, pair_key};
use super::portfolio::{EquityPoint, Portfolio};
use super::position::{ClosedTrade, Side};
use super::signal::{SignalKind, StrategyTag};

/// A spread needs one bar of history before its first return.
const MIN_BARS: usize = 2;

/// Bars for one pair, aligned index by index.
#[derive(Debug, Clone)]
pub struct PairSeries {
    pub long: Vec<OhlcvBar>,
    pub short: Vec<OhlcvBar>,
}

impl PairSeries {
    pub fn long_code(&self) -> &str {
        self.long.first().map_or("", |b| b.code.as_str())
    }

    pub fn short_code(&self) -> &str {
        self.short.first().map_or("", |b| b.code.as_str())
    }

    pub fn key(&self) -> String {
        pair_key(self.long_code(), self.short_code())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PairsConfig {
    pub initial_capital: f64,
    pub params: PairParams,
    pub performance: PerformanceConfig,
}

impl Default for PairsConfig {
    fn default() -> Self {
        PairsConfig {
            initial_capital: 100_000.0,
            params: PairParams::default(),
            performance: PerformanceConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PairsResult {
    pub pairs: Vec<String>,
    pub final_cash: f64,
    pub equity_curve: Vec<EquityPoint>,
    pub events: Vec<TradeEvent>,
    /// One unit per round trip, bought at the allocation and sold at the
    /// released value.
    pub trades: Vec<ClosedTrade>,
    pub metrics: Metrics,
}

/// Check every pair shares one timeline and return it.
fn common_timeline(series: &[PairSeries]) -> Result<Vec<NaiveDate>, HedgeError> {
    let Some(first) = series.first() else {
        return Err(HedgeError::invalid_parameter("pairs", "no pairs configured"));
    };
    let timeline: Vec<NaiveDate> = first.long.iter().map(|b| b.date).collect();

    for pair in series {
        validate_bars(&pair.long, false)?;
        validate_bars(&pair.short, false)?;
        for (legs, bars) in [
            ((first.long_code(), pair.long_code()), &pair.long),
            ((first.long_code(), pair.short_code()), &pair.short),
        ] {
            if bars.len() != timeline.len() {
                return Err(HedgeError::Misaligned {
                    left: legs.0.to_string(),
                    right: legs.1.to_string(),
                    index: bars.len().min(timeline.len()),
                    reason: format!("{} bars against {}", bars.len(), timeline.len()),
                });
            }
            if let Some(index) = bars.iter().zip(&timeline).position(|(b, d)| b.date != *d) {
                return Err(HedgeError::Misaligned {
                    left: legs.0.to_string(),
                    right: legs.1.to_string(),
                    index,
                    reason: format!("{} against {}", bars[index].date, timeline[index]),
                });
            }
        }
    }

    if timeline.len() < MIN_BARS {
        return Err(HedgeError::InsufficientData {
            code: first.key(),
            bars: timeline.len(),
            minimum: MIN_BARS,
        });
    }
    Ok(timeline)
}

pub fn run_pairs(series: &[PairSeries], config: &PairsConfig) -> Result<PairsResult, HedgeError> {
    config.params.validate()?;
    config.performance.validate()?;
    if !(config.initial_capital > 0.0) || !config.initial_capital.is_finite() {
        return Err(HedgeError::invalid_parameter(
            "initial_capital",
            "must be positive",
        ));
    }
    let timeline = common_timeline(series)?;

    let keys: Vec<String> = series.iter().map(PairSeries::key).collect();
    if let Some((i, key)) = keys.iter().enumerate().find(|(i, k)| keys[..*i].contains(k)) {
        return Err(HedgeError::invalid_parameter(
            "pairs",
            format!("{key} listed twice (entry {})", i + 1),
        ));
    }
    let mut hedges: Vec<PairsHedge> = series
        .iter()
        .map(|_| PairsHedge::new(config.params.clone()))
        .collect();
    let mut portfolio = Portfolio::new(config.initial_capital);
    let no_prices: HashMap<String, f64> = HashMap::new();

    info!(pairs = ?keys, bars = timeline.len(), "starting pairs run");

    for (index, &date) in timeline.iter().enumerate() {
        for ((pair, hedge), key) in series.iter().zip(hedges.iter_mut()).zip(&keys) {
            let step = hedge.update(pair.long[index].close, pair.short[index].close);
            apply_step(&mut portfolio, pair, key, &step, date, index, config)?;
        }
        let equity = portfolio.mark_to_market(date, &no_prices);
        debug!(date = %date, equity, cash = portfolio.cash, "bar");
    }

    let metrics = Metrics::compute(
        &portfolio.equity_curve,
        &portfolio.closed_trades,
        portfolio.initial_capital,
        &config.performance,
    );
    info!(
        trades = metrics.total_trades,
        total_return = metrics.total_return,
        "pairs run complete"
    );

    Ok(PairsResult {
        pairs: keys,
        final_cash: portfolio.cash,
        equity_curve: portfolio.equity_curve,
        events: portfolio.events,
        trades: portfolio.closed_trades,
        metrics,
    })
}

fn apply_step(
    portfolio: &mut Portfolio,
    pair: &PairSeries,
    key: &str,
    step: &PairStep,
    date: NaiveDate,
    index: usize,
    config: &PairsConfig,
) -> Result<(), HedgeError> {
    let spread = step.spread.unwrap_or(0.0);

    if let Some(open) = portfolio.pair_mut(key) {
        open.cumulative_pnl = step.cumulative_pnl;
    }

    match step.signal {
        SignalKind::Exit => {
            let Some(closed) = portfolio.close_pair(key) else {
                return Ok(());
            };
            let released = closed.value();
            let reason = step.exit_reason;
            info!(
                pair = key,
                date = %date,
                pnl = released - closed.allocated_capital,
                "pair exit"
            );
            portfolio.record_trade(ClosedTrade {
                code: key.to_string(),
                side: closed.side,
                tag: StrategyTag::PairsHedge,
                quantity: 1.0,
                entry_price: closed.allocated_capital,
                exit_price: released,
                entry_date: closed.entry_date,
                exit_date: date,
                bars_held: index.saturating_sub(closed.entry_index),
                pnl: released - closed.allocated_capital,
                exit_reason: reason.unwrap_or(ExitReason::ZScore),
            });
            portfolio.record_event(TradeEvent {
                date,
                index,
                code: key.to_string(),
                action: EventAction::Exit,
                tag: StrategyTag::PairsHedge,
                price: spread,
                quantity: closed.allocated_capital,
                reason,
            });
        }
        SignalKind::LongEntry | SignalKind::ShortEntry => {
            let pct = config.params.max_investment_pct;
            let allocation = (portfolio.cash * pct).min(portfolio.initial_capital * pct);
            if !(allocation > 0.0) {
                debug!(pair = key, date = %date, "entry skipped, no cash");
                return Ok(());
            }
            let (side, action) = if step.signal == SignalKind::ShortEntry {
                (Side::Short, EventAction::EnterShort)
            } else {
                (Side::Long, EventAction::EnterLong)
            };
            portfolio.open_pair(PairPosition {
                long_leg: pair.long_code().to_string(),
                short_leg: pair.short_code().to_string(),
                side,
                entry_spread: spread,
                entry_date: date,
                entry_index: index,
                allocated_capital: allocation,
                cumulative_pnl: 0.0,
            })?;
            info!(
                pair = key,
                date = %date,
                side = ?side,
                allocation,
                z = ?step.z,
                "pair entry"
            );
            portfolio.record_event(TradeEvent {
                date,
                index,
                code: key.to_string(),
                action,
                tag: StrategyTag::PairsHedge,
                price: spread,
                quantity: allocation,
                reason: None,
            });
        }
        SignalKind::Hold => {}
    }
    Ok(())
}
