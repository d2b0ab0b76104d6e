//! Single-instrument position tracking.

use chrono::NaiveDate;
use serde::Serialize;

use super::event::ExitReason;
use super::signal::StrategyTag;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Flat,
    Long,
    Short,
}

/// An open all-or-nothing position. Quantity is always positive; direction
/// lives in `side`.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub code: String,
    pub side: Side,
    pub quantity: f64,
    pub entry_price: f64,
    pub entry_date: NaiveDate,
    pub entry_index: usize,
    pub strategy_tag: StrategyTag,
    /// Stop price, `None` when the stop is disabled.
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    pub entry_commission: f64,
}

impl Position {
    pub fn is_long(&self) -> bool {
        self.side == Side::Long
    }

    pub fn is_short(&self) -> bool {
        self.side == Side::Short
    }

    pub fn entry_notional(&self) -> f64 {
        self.quantity * self.entry_price
    }

    /// Cash value of the position if closed at `price` before commission.
    /// A short holds its escrowed entry notional plus its running profit,
    /// and cannot lose more than that escrow.
    pub fn market_value(&self, price: f64) -> f64 {
        match self.side {
            Side::Short => (self.entry_notional() + self.unrealized_pnl(price)).max(0.0),
            _ => self.quantity * price,
        }
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        match self.side {
            Side::Long => self.quantity * (price - self.entry_price),
            Side::Short => self.quantity * (self.entry_price - price),
            Side::Flat => 0.0,
        }
    }

    pub fn should_stop_loss(&self, price: f64) -> bool {
        match (self.side, self.stop_loss) {
            (Side::Long, Some(stop)) => price <= stop,
            (Side::Short, Some(stop)) => price >= stop,
            _ => false,
        }
    }

    pub fn should_take_profit(&self, price: f64) -> bool {
        match (self.side, self.take_profit) {
            (Side::Long, Some(target)) => price >= target,
            (Side::Short, Some(target)) => price <= target,
            _ => false,
        }
    }
}

/// Stop and target prices for an entry at `price`. A zero fraction disables
/// the corresponding bound.
pub fn risk_prices(
    side: Side,
    price: f64,
    stop_loss: f64,
    take_profit: f64,
) -> (Option<f64>, Option<f64>) {
    let sign = match side {
        Side::Short => -1.0,
        _ => 1.0,
    };
    let stop = (stop_loss > 0.0).then(|| price * (1.0 - sign * stop_loss));
    let target = (take_profit > 0.0).then(|| price * (1.0 + sign * take_profit));
    (stop, target)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClosedTrade {
    pub code: String,
    pub side: Side,
    pub tag: StrategyTag,
    pub quantity: f64,
    pub entry_price: f64,
    pub exit_price: f64,
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub bars_held: usize,
    /// Net of entry and exit commission.
    pub pnl: f64,
    pub exit_reason: ExitReason,
}
