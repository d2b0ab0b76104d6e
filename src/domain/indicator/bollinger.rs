//! Bollinger Bands indicator.
//!
//! Bollinger Bands consist of:
//! - Middle: Simple Moving Average (SMA) over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! Where StdDev is population standard deviation (divides by N, not N-1).
//!
//! Warmup: first (period-1) bars are undefined.

use super::rolling::{Deviation, RollingStats};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

#[derive(Debug, Clone)]
pub struct Bollinger {
    stats: RollingStats,
    multiplier: f64,
}

impl Bollinger {
    pub fn new(period: usize, multiplier: f64) -> Self {
        Bollinger {
            stats: RollingStats::new(period),
            multiplier,
        }
    }

    pub fn update(&mut self, close: f64) -> Option<Bands> {
        self.stats.push(close);
        let middle = self.stats.mean()?;
        let stddev = self.stats.stddev(Deviation::Population)?;
        Some(Bands {
            upper: middle + self.multiplier * stddev,
            middle,
            lower: middle - self.multiplier * stddev,
        })
    }
}
