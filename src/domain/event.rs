//! Entry/exit event log.

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

use super::signal::StrategyTag;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    EnterLong,
    EnterShort,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    /// The owning strategy's own exit rule.
    Strategy,
    /// Close crossed another strategy's reference line.
    CrossStrategy,
    /// Pair z-score returned inside the exit band.
    ZScore,
    /// Pair cumulative P&L fell below its stop.
    PnlStop,
    /// Pair cumulative P&L rose above its target.
    PnlTarget,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExitReason::StopLoss => "stop_loss",
            ExitReason::TakeProfit => "take_profit",
            ExitReason::Strategy => "strategy",
            ExitReason::CrossStrategy => "cross_strategy",
            ExitReason::ZScore => "z_score",
            ExitReason::PnlStop => "pnl_stop",
            ExitReason::PnlTarget => "pnl_target",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeEvent {
    pub date: NaiveDate,
    pub index: usize,
    pub code: String,
    pub action: EventAction,
    pub tag: StrategyTag,
    /// Fill price; for a pair, the spread return on that bar.
    pub price: f64,
    /// Units traded; for a pair, the capital allocated to it.
    pub quantity: f64,
    pub reason: Option<ExitReason>,
}
