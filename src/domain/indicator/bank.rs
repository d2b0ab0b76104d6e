//! Per-instrument indicator bank fed one bar at a time.

use chrono::NaiveDate;

use super::bollinger::{Bands, Bollinger};
use super::connors::ConnorsRsi;
use super::extremes::RollingExtreme;
use super::rolling::Sma;
use super::vwap::Vwap;
use crate::domain::error::HedgeError;
use crate::domain::ohlcv::{OhlcvBar, check_bar};
use crate::domain::strategy::StrategyParams;

/// Indicator values after one bar; `None` means still warming up.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorState {
    pub index: usize,
    pub date: NaiveDate,
    pub close: f64,
    pub bands: Option<Bands>,
    pub crsi: Option<f64>,
    pub trend_sma: Option<f64>,
    /// Highest high of the `breakout_period` bars before this one.
    pub prior_highest: Option<f64>,
    /// Lowest low of the `breakout_period` bars before this one.
    pub prior_lowest: Option<f64>,
    pub vwap: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct IndicatorBank {
    bollinger: Bollinger,
    crsi: ConnorsRsi,
    trend_sma: Sma,
    highest: RollingExtreme,
    lowest: RollingExtreme,
    vwap: Vwap,
    require_volume: bool,
    bars_seen: usize,
    last_date: Option<NaiveDate>,
}

impl IndicatorBank {
    pub fn new(params: &StrategyParams) -> Self {
        IndicatorBank {
            bollinger: Bollinger::new(params.mean_reversion_period, params.mean_reversion_dev_factor),
            crsi: ConnorsRsi::new(
                params.crsi_rsi_period,
                params.crsi_streak_period,
                params.crsi_rank_period,
            ),
            trend_sma: Sma::new(params.trend_following_period),
            highest: RollingExtreme::highest(params.breakout_period),
            lowest: RollingExtreme::lowest(params.breakout_period),
            vwap: Vwap::new(params.vwap_reset),
            require_volume: params.vwap_filter,
            bars_seen: 0,
            last_date: None,
        }
    }

    pub fn bars_seen(&self) -> usize {
        self.bars_seen
    }

    /// Fold one bar into every indicator. Bars must arrive in strictly
    /// increasing date order; anything else is rejected without touching state.
    pub fn update(&mut self, bar: &OhlcvBar) -> Result<IndicatorState, HedgeError> {
        check_bar(self.bars_seen, self.last_date, bar, self.require_volume)?;

        let prior_highest = self.highest.value();
        let prior_lowest = self.lowest.value();
        self.highest.update(bar.high);
        self.lowest.update(bar.low);

        let state = IndicatorState {
            index: self.bars_seen,
            date: bar.date,
            close: bar.close,
            bands: self.bollinger.update(bar.close),
            crsi: self.crsi.update(bar.close),
            trend_sma: self.trend_sma.update(bar.close),
            prior_highest,
            prior_lowest,
            vwap: self.vwap.update(bar),
        };

        self.bars_seen += 1;
        self.last_date = Some(bar.date);
        Ok(state)
    }
}
