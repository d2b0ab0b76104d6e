//! OHLCV bar representation and input validation.

use chrono::NaiveDate;
use std::collections::BTreeSet;

use super::error::HedgeError;

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub code: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl OhlcvBar {
    /// (high + low + close) / 3
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }
}

/// Reject input the engine cannot process instead of skipping bars.
///
/// Checks, per bar: strictly increasing dates (duplicates rejected), finite
/// positive prices, and, when `require_volume` is set (VWAP in use), finite
/// positive volume.
pub fn validate_bars(bars: &[OhlcvBar], require_volume: bool) -> Result<(), HedgeError> {
    let mut prev_date: Option<NaiveDate> = None;
    for (index, bar) in bars.iter().enumerate() {
        check_bar(index, prev_date, bar, require_volume)?;
        prev_date = Some(bar.date);
    }
    Ok(())
}

/// Validate a single bar against the date of the bar before it.
pub fn check_bar(
    index: usize,
    prev_date: Option<NaiveDate>,
    bar: &OhlcvBar,
    require_volume: bool,
) -> Result<(), HedgeError> {
    let fail = |reason: String| HedgeError::MalformedBar {
        code: bar.code.clone(),
        index,
        date: bar.date,
        reason,
    };

    if let Some(prev) = prev_date {
        if bar.date == prev {
            return Err(fail(format!("duplicate date {}", bar.date)));
        }
        if bar.date < prev {
            return Err(fail(format!("date goes backwards from {}", prev)));
        }
    }

    for (name, value) in [
        ("open", bar.open),
        ("high", bar.high),
        ("low", bar.low),
        ("close", bar.close),
    ] {
        if !value.is_finite() || value <= 0.0 {
            return Err(fail(format!("non-positive {name} {value}")));
        }
    }

    if bar.high < bar.low {
        return Err(fail(format!("high {} below low {}", bar.high, bar.low)));
    }

    if require_volume && (!bar.volume.is_finite() || bar.volume <= 0.0) {
        return Err(fail(format!("volume {} must be positive", bar.volume)));
    }

    Ok(())
}

/// One-bar percentage changes of the close series; the first bar has none.
pub fn close_returns(bars: &[OhlcvBar]) -> Vec<f64> {
    bars.windows(2)
        .map(|w| w[1].close / w[0].close - 1.0)
        .collect()
}

/// Restrict every series to the dates all of them share, keeping order.
///
/// Windows count bars, so instruments with different holiday calendars must
/// be joined this way before their bars are compared index by index.
pub fn align_on_common_dates(series: &[Vec<OhlcvBar>]) -> Vec<Vec<OhlcvBar>> {
    let Some((first, rest)) = series.split_first() else {
        return Vec::new();
    };
    let mut common: BTreeSet<NaiveDate> = first.iter().map(|b| b.date).collect();
    for bars in rest {
        let dates: BTreeSet<NaiveDate> = bars.iter().map(|b| b.date).collect();
        common.retain(|d| dates.contains(d));
    }
    series
        .iter()
        .map(|bars| {
            bars.iter()
                .filter(|b| common.contains(&b.date))
                .cloned()
                .collect()
        })
        .collect()
}
