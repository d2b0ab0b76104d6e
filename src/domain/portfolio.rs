//! Portfolio state and equity tracking.
//!
//! Cash, open single-instrument and pair positions, the closed trade log, the
//! event log and the equity curve. Every cash movement goes through the
//! open/close methods here so `equity = cash + open value` holds at each
//! recorded point.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use super::error::HedgeError;
use super::event::{EventAction, ExitReason, TradeEvent};
use super::pairs::PairPosition;
use super::position::{ClosedTrade, Position, Side};

/// Relative slack for all-in sizing, where notional plus commission equals
/// cash up to rounding.
const CASH_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
    pub cash: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub cash: f64,
    pub initial_capital: f64,
    pub positions: BTreeMap<String, Position>,
    pub pair_positions: BTreeMap<String, PairPosition>,
    pub closed_trades: Vec<ClosedTrade>,
    pub events: Vec<TradeEvent>,
    pub equity_curve: Vec<EquityPoint>,
}

impl Portfolio {
    pub fn new(initial_capital: f64) -> Self {
        Portfolio {
            cash: initial_capital,
            initial_capital,
            positions: BTreeMap::new(),
            pair_positions: BTreeMap::new(),
            closed_trades: Vec::new(),
            events: Vec::new(),
            equity_curve: Vec::new(),
        }
    }

    pub fn get_position(&self, code: &str) -> Option<&Position> {
        self.positions.get(code)
    }

    pub fn has_position(&self, code: &str) -> bool {
        self.positions.contains_key(code)
    }

    pub fn position_count(&self) -> usize {
        self.positions.len() + self.pair_positions.len()
    }

    /// Book a new position, debiting its notional plus entry commission.
    pub fn open_position(&mut self, position: Position) -> Result<TradeEvent, HedgeError> {
        if self.has_position(&position.code) {
            return Err(HedgeError::invalid_parameter(
                "position",
                format!("{} already has an open position", position.code),
            ));
        }
        let cost = position.entry_notional() + position.entry_commission;
        if !(position.quantity > 0.0) || cost > self.cash * (1.0 + CASH_TOLERANCE) {
            return Err(HedgeError::invalid_parameter(
                "position",
                format!("cost {cost:.2} exceeds cash {:.2}", self.cash),
            ));
        }
        self.cash = (self.cash - cost).max(0.0);

        let event = TradeEvent {
            date: position.entry_date,
            index: position.entry_index,
            code: position.code.clone(),
            action: if position.is_short() {
                EventAction::EnterShort
            } else {
                EventAction::EnterLong
            },
            tag: position.strategy_tag,
            price: position.entry_price,
            quantity: position.quantity,
            reason: None,
        };
        self.events.push(event.clone());
        self.positions.insert(position.code.clone(), position);
        Ok(event)
    }

    /// Liquidate the whole position at `price`, crediting its market value
    /// net of `exit_commission`.
    pub fn close_position(
        &mut self,
        code: &str,
        price: f64,
        date: NaiveDate,
        index: usize,
        exit_commission: f64,
        reason: ExitReason,
    ) -> Option<(ClosedTrade, TradeEvent)> {
        let position = self.positions.remove(code)?;
        let proceeds = (position.market_value(price) - exit_commission).max(0.0);
        self.cash += proceeds;

        // realized change in cash over the round trip
        let pnl = proceeds - position.entry_notional() - position.entry_commission;
        let trade = ClosedTrade {
            code: position.code.clone(),
            side: position.side,
            tag: position.strategy_tag,
            quantity: position.quantity,
            entry_price: position.entry_price,
            exit_price: price,
            entry_date: position.entry_date,
            exit_date: date,
            bars_held: index.saturating_sub(position.entry_index),
            pnl,
            exit_reason: reason,
        };
        let event = TradeEvent {
            date,
            index,
            code: position.code,
            action: EventAction::Exit,
            tag: position.strategy_tag,
            price,
            quantity: position.quantity,
            reason: Some(reason),
        };
        self.closed_trades.push(trade.clone());
        self.events.push(event.clone());
        Some((trade, event))
    }

    /// Move `allocated_capital` out of cash into a new pair position.
    pub fn open_pair(&mut self, pair: PairPosition) -> Result<(), HedgeError> {
        let key = pair.key();
        if self.pair_positions.contains_key(&key) {
            return Err(HedgeError::invalid_parameter(
                "pair",
                format!("{key} already has an open position"),
            ));
        }
        if !(pair.allocated_capital > 0.0) || pair.allocated_capital > self.cash {
            return Err(HedgeError::invalid_parameter(
                "pair",
                format!(
                    "allocation {:.2} exceeds cash {:.2}",
                    pair.allocated_capital, self.cash
                ),
            ));
        }
        self.cash -= pair.allocated_capital;
        self.pair_positions.insert(key, pair);
        Ok(())
    }

    pub fn pair_mut(&mut self, key: &str) -> Option<&mut PairPosition> {
        self.pair_positions.get_mut(key)
    }

    /// Release a pair's marked value back to cash.
    pub fn close_pair(&mut self, key: &str) -> Option<PairPosition> {
        let pair = self.pair_positions.remove(key)?;
        self.cash += pair.value();
        Some(pair)
    }

    pub fn record_event(&mut self, event: TradeEvent) {
        self.events.push(event);
    }

    pub fn record_trade(&mut self, trade: ClosedTrade) {
        self.closed_trades.push(trade);
    }

    pub fn record_equity(&mut self, date: NaiveDate, equity: f64) {
        self.equity_curve.push(EquityPoint {
            date,
            equity,
            cash: self.cash,
        });
    }

    /// Cash plus the marked value of every open position. A single-instrument
    /// position without a price in `price_map` is valued at entry.
    pub fn total_equity(&self, price_map: &HashMap<String, f64>) -> f64 {
        let position_value: f64 = self
            .positions
            .values()
            .map(|pos| {
                let price = price_map.get(&pos.code).copied().unwrap_or(pos.entry_price);
                pos.market_value(price)
            })
            .sum();
        let pair_value: f64 = self.pair_positions.values().map(PairPosition::value).sum();
        self.cash + position_value + pair_value
    }

    /// Record the equity point for `date` and return it.
    pub fn mark_to_market(&mut self, date: NaiveDate, price_map: &HashMap<String, f64>) -> f64 {
        let equity = self.total_equity(price_map);
        self.record_equity(date, equity);
        equity
    }

    /// Side of the open position on `code`, `Flat` when none.
    pub fn side_of(&self, code: &str) -> Side {
        self.positions.get(code).map_or(Side::Flat, |p| p.side)
    }
}
