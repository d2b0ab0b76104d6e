//! Single-instrument position and risk management.
//!
//! Each bar an open position is checked, in order, for stop-loss,
//! take-profit, its owning strategy's exit and, in cross-strategy mode, a
//! close through any other strategy's reference line. A flat instrument takes
//! the arbitrator's entry signal, if any.

use std::fmt;
use std::str::FromStr;

use tracing::{debug, info};

use super::arbitrator::Arbitrator;
use super::error::HedgeError;
use super::event::{ExitReason, TradeEvent};
use super::indicator::IndicatorState;
use super::portfolio::Portfolio;
use super::position::{Position, Side, risk_prices};
use super::signal::{SignalKind, StrategyTag};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExitMode {
    /// Only the owning strategy's exit rule closes a position.
    StrategyLocal,
    /// A long also closes below any strategy's bearish line, a short above
    /// any bullish line.
    #[default]
    CrossStrategy,
}

impl fmt::Display for ExitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitMode::StrategyLocal => write!(f, "local"),
            ExitMode::CrossStrategy => write!(f, "cross"),
        }
    }
}

impl FromStr for ExitMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" | "strategy_local" => Ok(ExitMode::StrategyLocal),
            "cross" | "cross_strategy" => Ok(ExitMode::CrossStrategy),
            other => Err(format!("unknown exit mode '{other}', expected local or cross")),
        }
    }
}

/// Sizing and protective exits, all as fractions except `commission_pct`.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskLimits {
    /// Share of available cash committed per entry.
    pub position_size: f64,
    /// 0 disables.
    pub stop_loss: f64,
    /// 0 disables.
    pub take_profit: f64,
    /// Percent of notional charged on each side of a trade.
    pub commission_pct: f64,
}

impl Default for RiskLimits {
    fn default() -> Self {
        RiskLimits {
            position_size: 1.0,
            stop_loss: 0.0,
            take_profit: 0.0,
            commission_pct: 0.0,
        }
    }
}

impl RiskLimits {
    pub fn validate(&self) -> Result<(), HedgeError> {
        if !(self.position_size > 0.0 && self.position_size <= 1.0) {
            return Err(HedgeError::invalid_parameter(
                "position_size",
                "must be within (0, 1]",
            ));
        }
        for (name, value) in [
            ("stop_loss", self.stop_loss),
            ("take_profit", self.take_profit),
            ("commission_pct", self.commission_pct),
        ] {
            if !(value >= 0.0) || !value.is_finite() {
                return Err(HedgeError::invalid_parameter(name, "must be non-negative"));
            }
        }
        if self.stop_loss >= 1.0 {
            return Err(HedgeError::invalid_parameter("stop_loss", "must be below 1"));
        }
        Ok(())
    }

    pub fn commission(&self, notional: f64) -> f64 {
        notional * self.commission_pct / 100.0
    }
}

#[derive(Debug, Clone)]
pub struct PositionManager {
    code: String,
    limits: RiskLimits,
    exit_mode: ExitMode,
}

impl PositionManager {
    pub fn new(code: impl Into<String>, limits: RiskLimits, exit_mode: ExitMode) -> Self {
        PositionManager {
            code: code.into(),
            limits,
            exit_mode,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    /// Apply one bar. Returns the entry or exit event when the position
    /// changed.
    pub fn step(
        &self,
        portfolio: &mut Portfolio,
        state: &IndicatorState,
        arbitrator: &Arbitrator,
    ) -> Result<Option<TradeEvent>, HedgeError> {
        if let Some(position) = portfolio.get_position(&self.code) {
            let Some(reason) = self.exit_reason(position, state, arbitrator) else {
                return Ok(None);
            };
            let price = state.close;
            let exit_commission = self.limits.commission(position.quantity * price);
            let closed = portfolio.close_position(
                &self.code,
                price,
                state.date,
                state.index,
                exit_commission,
                reason,
            );
            return Ok(closed.map(|(trade, event)| {
                info!(
                    code = %trade.code,
                    date = %trade.exit_date,
                    tag = %trade.tag,
                    price,
                    pnl = trade.pnl,
                    reason = %reason,
                    "exit"
                );
                event
            }));
        }

        let Some(signal) = arbitrator.arbitrate(state) else {
            return Ok(None);
        };
        let side = match signal.kind {
            SignalKind::LongEntry => Side::Long,
            SignalKind::ShortEntry => Side::Short,
            SignalKind::Exit | SignalKind::Hold => return Ok(None),
        };
        self.enter(portfolio, state, side, signal.tag).map(|event| {
            if let Some(e) = &event {
                info!(
                    code = %e.code,
                    date = %e.date,
                    tag = %e.tag,
                    price = e.price,
                    side = ?side,
                    "entry"
                );
            }
            event
        })
    }

    /// First applicable exit for an open position, stops before strategies.
    pub fn exit_reason(
        &self,
        position: &Position,
        state: &IndicatorState,
        arbitrator: &Arbitrator,
    ) -> Option<ExitReason> {
        let price = state.close;
        if position.should_stop_loss(price) {
            return Some(ExitReason::StopLoss);
        }
        if position.should_take_profit(price) {
            return Some(ExitReason::TakeProfit);
        }
        if arbitrator
            .evaluator(position.strategy_tag)
            .is_some_and(|e| e.evaluate(state, position.side) == SignalKind::Exit)
        {
            return Some(ExitReason::Strategy);
        }
        if self.exit_mode == ExitMode::CrossStrategy
            && crosses_any_line(position.side, state, arbitrator)
        {
            return Some(ExitReason::CrossStrategy);
        }
        None
    }

    fn enter(
        &self,
        portfolio: &mut Portfolio,
        state: &IndicatorState,
        side: Side,
        tag: StrategyTag,
    ) -> Result<Option<TradeEvent>, HedgeError> {
        let price = state.close;
        let budget = portfolio.cash * self.limits.position_size;
        // notional plus commission must fit the budget
        let quantity = budget / (price * (1.0 + self.limits.commission_pct / 100.0));
        if !quantity.is_finite() || quantity <= 0.0 {
            debug!(
                code = %self.code,
                date = %state.date,
                cash = portfolio.cash,
                "entry skipped, no cash"
            );
            return Ok(None);
        }
        let (stop_loss, take_profit) =
            risk_prices(side, price, self.limits.stop_loss, self.limits.take_profit);
        let position = Position {
            code: self.code.clone(),
            side,
            quantity,
            entry_price: price,
            entry_date: state.date,
            entry_index: state.index,
            strategy_tag: tag,
            stop_loss,
            take_profit,
            entry_commission: self.limits.commission(quantity * price),
        };
        portfolio.open_position(position).map(Some)
    }
}

fn crosses_any_line(side: Side, state: &IndicatorState, arbitrator: &Arbitrator) -> bool {
    let close = state.close;
    arbitrator.evaluators().any(|e| match side {
        Side::Long => e.bearish_line(state).is_some_and(|line| close < line),
        Side::Short => e.bullish_line(state).is_some_and(|line| close > line),
        Side::Flat => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::Bands;
    use crate::domain::strategy::StrategyParams;
    use chrono::NaiveDate;

    fn state(index: usize, close: f64) -> IndicatorState {
        IndicatorState {
            index,
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(index as u64),
            close,
            bands: None,
            crsi: None,
            trend_sma: None,
            prior_highest: None,
            prior_lowest: None,
            vwap: None,
        }
    }

    fn manager(limits: RiskLimits, mode: ExitMode) -> PositionManager {
        PositionManager::new("SPY", limits, mode)
    }

    fn tf_only() -> Arbitrator {
        Arbitrator::single(StrategyTag::TrendFollowing, &StrategyParams::default()).unwrap()
    }

    #[test]
    fn exit_mode_parse() {
        assert_eq!("local".parse(), Ok(ExitMode::StrategyLocal));
        assert_eq!("Cross".parse(), Ok(ExitMode::CrossStrategy));
        assert!("both".parse::<ExitMode>().is_err());
        assert_eq!(ExitMode::default(), ExitMode::CrossStrategy);
    }

    #[test]
    fn entry_sizes_to_cash_fraction() {
        let mgr = manager(
            RiskLimits {
                position_size: 0.5,
                ..RiskLimits::default()
            },
            ExitMode::StrategyLocal,
        );
        let mut portfolio = Portfolio::new(10_000.0);
        let mut s = state(0, 100.0);
        s.trend_sma = Some(99.0);
        let event = mgr.step(&mut portfolio, &s, &tf_only()).unwrap().unwrap();
        assert_eq!(event.tag, StrategyTag::TrendFollowing);
        let pos = portfolio.get_position("SPY").unwrap();
        assert!((pos.quantity - 50.0).abs() < 1e-9);
        assert!((portfolio.cash - 5_000.0).abs() < 1e-9);
    }

    #[test]
    fn all_in_with_commission_never_overdraws() {
        let mgr = manager(
            RiskLimits {
                commission_pct: 0.5,
                ..RiskLimits::default()
            },
            ExitMode::StrategyLocal,
        );
        let mut portfolio = Portfolio::new(10_000.0);
        let mut s = state(0, 37.0);
        s.trend_sma = Some(30.0);
        mgr.step(&mut portfolio, &s, &tf_only()).unwrap();
        assert!(portfolio.has_position("SPY"));
        assert!(portfolio.cash >= 0.0);
        assert!(portfolio.cash < 1e-6);
    }

    #[test]
    fn stop_loss_beats_strategy_exit() {
        let mgr = manager(
            RiskLimits {
                stop_loss: 0.05,
                ..RiskLimits::default()
            },
            ExitMode::StrategyLocal,
        );
        let arb = tf_only();
        let mut portfolio = Portfolio::new(10_000.0);
        let mut s0 = state(0, 100.0);
        s0.trend_sma = Some(99.0);
        mgr.step(&mut portfolio, &s0, &arb).unwrap();

        // close under both the stop and the SMA
        let mut s1 = state(1, 90.0);
        s1.trend_sma = Some(99.0);
        let event = mgr.step(&mut portfolio, &s1, &arb).unwrap().unwrap();
        assert_eq!(event.reason, Some(ExitReason::StopLoss));
        assert!(!portfolio.has_position("SPY"));
    }

    #[test]
    fn take_profit_beats_strategy_exit() {
        let mgr = manager(
            RiskLimits {
                take_profit: 0.1,
                ..RiskLimits::default()
            },
            ExitMode::StrategyLocal,
        );
        let arb = tf_only();
        let mut portfolio = Portfolio::new(10_000.0);
        let mut s0 = state(0, 100.0);
        s0.trend_sma = Some(99.0);
        mgr.step(&mut portfolio, &s0, &arb).unwrap();

        let mut s1 = state(1, 120.0);
        s1.trend_sma = Some(125.0);
        let event = mgr.step(&mut portfolio, &s1, &arb).unwrap().unwrap();
        assert_eq!(event.reason, Some(ExitReason::TakeProfit));
    }

    #[test]
    fn cross_strategy_exit_only_in_cross_mode() {
        let params = StrategyParams::default();
        let arb = Arbitrator::combined(&params).unwrap();

        let mut entry = state(0, 100.0);
        entry.trend_sma = Some(99.0);
        // below the MR lower band but above the TF sma
        let mut later = state(1, 100.0);
        later.trend_sma = Some(99.0);
        later.bands = Some(Bands {
            upper: 110.0,
            middle: 105.0,
            lower: 100.5,
        });
        later.crsi = Some(50.0);

        for (mode, expect_exit) in [
            (ExitMode::StrategyLocal, false),
            (ExitMode::CrossStrategy, true),
        ] {
            let mgr = manager(RiskLimits::default(), mode);
            let mut portfolio = Portfolio::new(10_000.0);
            let opened = mgr.step(&mut portfolio, &entry, &arb).unwrap().unwrap();
            assert_eq!(opened.tag, StrategyTag::TrendFollowing);
            let event = mgr.step(&mut portfolio, &later, &arb).unwrap();
            assert_eq!(event.is_some(), expect_exit, "{mode}");
            if let Some(e) = event {
                assert_eq!(e.reason, Some(ExitReason::CrossStrategy));
            }
        }
    }

    #[test]
    fn flat_exit_signal_is_ignored() {
        let mgr = manager(RiskLimits::default(), ExitMode::StrategyLocal);
        let mut portfolio = Portfolio::new(10_000.0);
        let mut s = state(0, 98.0);
        s.trend_sma = Some(99.0);
        assert!(mgr.step(&mut portfolio, &s, &tf_only()).unwrap().is_none());
        assert!(portfolio.events.is_empty());
    }

    #[test]
    fn mirrored_short_round_trip() {
        let params = StrategyParams {
            allow_shorting: true,
            ..StrategyParams::default()
        };
        let arb = Arbitrator::single(StrategyTag::TrendFollowing, &params).unwrap();
        let mgr = manager(RiskLimits::default(), ExitMode::StrategyLocal);
        let mut portfolio = Portfolio::new(10_000.0);

        let mut s0 = state(0, 100.0);
        s0.trend_sma = Some(101.0);
        mgr.step(&mut portfolio, &s0, &arb).unwrap();
        assert_eq!(portfolio.side_of("SPY"), Side::Short);

        let mut s1 = state(1, 95.0);
        s1.trend_sma = Some(94.0);
        let event = mgr.step(&mut portfolio, &s1, &arb).unwrap().unwrap();
        assert_eq!(event.reason, Some(ExitReason::Strategy));
        assert!((portfolio.cash - 10_500.0).abs() < 1e-6);
    }

    #[test]
    fn limits_validation() {
        assert!(RiskLimits::default().validate().is_ok());
        let bad = RiskLimits {
            position_size: 1.5,
            ..RiskLimits::default()
        };
        assert!(bad.validate().is_err());
        let neg = RiskLimits {
            stop_loss: -0.1,
            ..RiskLimits::default()
        };
        assert!(neg.validate().is_err());
    }
}
