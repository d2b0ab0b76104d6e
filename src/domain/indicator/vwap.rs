//! Cumulative VWAP = sum(typical_price * volume) / sum(volume).
//!
//! Continuous over the whole series by default; an optional calendar
//! session boundary restarts the running sums.

use chrono::{Datelike, NaiveDate};
use std::fmt;
use std::str::FromStr;

use crate::domain::ohlcv::OhlcvBar;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VwapReset {
    #[default]
    Never,
    Weekly,
    Monthly,
    Yearly,
}

impl VwapReset {
    /// True when `next` starts a new session relative to `prev`.
    pub fn is_boundary(self, prev: NaiveDate, next: NaiveDate) -> bool {
        match self {
            VwapReset::Never => false,
            VwapReset::Weekly => prev.iso_week() != next.iso_week(),
            VwapReset::Monthly => (prev.year(), prev.month()) != (next.year(), next.month()),
            VwapReset::Yearly => prev.year() != next.year(),
        }
    }
}

impl FromStr for VwapReset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "never" | "none" => Ok(VwapReset::Never),
            "weekly" => Ok(VwapReset::Weekly),
            "monthly" => Ok(VwapReset::Monthly),
            "yearly" => Ok(VwapReset::Yearly),
            other => Err(format!("unknown vwap reset '{other}'")),
        }
    }
}

impl fmt::Display for VwapReset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VwapReset::Never => "never",
            VwapReset::Weekly => "weekly",
            VwapReset::Monthly => "monthly",
            VwapReset::Yearly => "yearly",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, Default)]
pub struct Vwap {
    reset: VwapReset,
    price_volume: f64,
    volume: f64,
    last_date: Option<NaiveDate>,
}

impl Vwap {
    pub fn new(reset: VwapReset) -> Self {
        Vwap {
            reset,
            ..Default::default()
        }
    }

    pub fn update(&mut self, bar: &OhlcvBar) -> Option<f64> {
        if let Some(prev) = self.last_date {
            if self.reset.is_boundary(prev, bar.date) {
                self.price_volume = 0.0;
                self.volume = 0.0;
            }
        }
        self.last_date = Some(bar.date);

        self.price_volume += bar.typical_price() * bar.volume;
        self.volume += bar.volume;

        (self.volume > 0.0).then(|| self.price_volume / self.volume)
    }
}
