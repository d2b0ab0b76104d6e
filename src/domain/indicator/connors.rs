//! Connors RSI: mean of three [0, 100] components.
//!
//! - RSI(rsi_period) of the close
//! - RSI(streak_period) of the signed up/down streak length
//! - percent rank of the latest one-bar percentage change within the
//!   trailing `rank_period` changes
//!
//! Undefined until all three components are defined.

use std::collections::VecDeque;

use super::rsi::WilderRsi;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreakDirection {
    Up,
    Down,
    #[default]
    Flat,
}

/// Signed count of consecutive same-direction closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreakState {
    pub length: i64,
    pub direction: StreakDirection,
}

impl StreakState {
    /// Advance by one close-to-close change; a reversal restarts the count
    /// at +/-1, an unchanged close resets it to 0.
    pub fn advance(&mut self, change: f64) -> i64 {
        if change > 0.0 {
            self.length = if self.length > 0 { self.length + 1 } else { 1 };
            self.direction = StreakDirection::Up;
        } else if change < 0.0 {
            self.length = if self.length < 0 { self.length - 1 } else { -1 };
            self.direction = StreakDirection::Down;
        } else {
            self.length = 0;
            self.direction = StreakDirection::Flat;
        }
        self.length
    }
}

/// Share of the trailing window strictly below the newest value, as 0-100.
///
/// The newest value is part of the window but never counts against itself,
/// so equal values rank by position: earlier duplicates do not count.
#[derive(Debug, Clone)]
pub struct PercentRank {
    period: usize,
    window: VecDeque<f64>,
}

impl PercentRank {
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        PercentRank {
            period,
            window: VecDeque::with_capacity(period + 1),
        }
    }

    pub fn update(&mut self, value: f64) -> Option<f64> {
        self.window.push_back(value);
        if self.window.len() > self.period {
            self.window.pop_front();
        }
        if self.window.len() < self.period {
            return None;
        }
        let below = self.window.iter().filter(|&&x| x < value).count();
        Some(below as f64 / self.period as f64 * 100.0)
    }
}

#[derive(Debug, Clone)]
pub struct ConnorsRsi {
    price_rsi: WilderRsi,
    streak: StreakState,
    streak_rsi: WilderRsi,
    rank: PercentRank,
    prev_close: Option<f64>,
}

impl ConnorsRsi {
    pub fn new(rsi_period: usize, streak_period: usize, rank_period: usize) -> Self {
        ConnorsRsi {
            price_rsi: WilderRsi::new(rsi_period),
            streak: StreakState::default(),
            streak_rsi: WilderRsi::new(streak_period),
            rank: PercentRank::new(rank_period),
            prev_close: None,
        }
    }

    pub fn streak(&self) -> StreakState {
        self.streak
    }

    pub fn update(&mut self, close: f64) -> Option<f64> {
        let price = self.price_rsi.update(close);

        let rank = match self.prev_close {
            Some(prev) => {
                self.streak.advance(close - prev);
                self.rank.update(close / prev - 1.0)
            }
            None => None,
        };
        let streak = self.streak_rsi.update(self.streak.length as f64);
        self.prev_close = Some(close);

        match (price, streak, rank) {
            (Some(p), Some(s), Some(r)) => Some((p + s + r) / 3.0),
            _ => None,
        }
    }
}
