//! Strategy parameters and the single-instrument evaluators.
//!
//! Each evaluator is a pure function of the latest [`IndicatorState`] and the
//! current position side. Undefined indicator values never satisfy a
//! condition, so warm-up always reads as HOLD.

use super::error::HedgeError;
use super::indicator::{IndicatorState, VwapReset};
use super::position::Side;
use super::signal::{SignalKind, StrategyTag};

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyParams {
    pub mean_reversion_period: usize,
    pub mean_reversion_dev_factor: f64,
    pub crsi_rsi_period: usize,
    pub crsi_streak_period: usize,
    pub crsi_rank_period: usize,
    pub crsi_lower_threshold: f64,
    pub crsi_upper_threshold: f64,
    pub trend_following_period: usize,
    pub breakout_period: usize,
    pub vwap_filter: bool,
    pub vwap_reset: VwapReset,
    pub allow_shorting: bool,
}

impl Default for StrategyParams {
    fn default() -> Self {
        StrategyParams {
            mean_reversion_period: 20,
            mean_reversion_dev_factor: 2.0,
            crsi_rsi_period: 3,
            crsi_streak_period: 2,
            crsi_rank_period: 100,
            crsi_lower_threshold: 10.0,
            crsi_upper_threshold: 90.0,
            trend_following_period: 50,
            breakout_period: 20,
            vwap_filter: false,
            vwap_reset: VwapReset::Never,
            allow_shorting: false,
        }
    }
}

impl StrategyParams {
    pub fn validate(&self) -> Result<(), HedgeError> {
        for (name, period) in [
            ("mean_reversion_period", self.mean_reversion_period),
            ("crsi_rsi_period", self.crsi_rsi_period),
            ("crsi_streak_period", self.crsi_streak_period),
            ("crsi_rank_period", self.crsi_rank_period),
            ("trend_following_period", self.trend_following_period),
            ("breakout_period", self.breakout_period),
        ] {
            if period == 0 {
                return Err(HedgeError::invalid_parameter(name, "period must be positive"));
            }
        }
        if !(self.mean_reversion_dev_factor > 0.0) {
            return Err(HedgeError::invalid_parameter(
                "mean_reversion_dev_factor",
                "must be positive",
            ));
        }
        for (name, value) in [
            ("crsi_lower_threshold", self.crsi_lower_threshold),
            ("crsi_upper_threshold", self.crsi_upper_threshold),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(HedgeError::invalid_parameter(name, "must be within 0-100"));
            }
        }
        if self.crsi_lower_threshold >= self.crsi_upper_threshold {
            return Err(HedgeError::invalid_parameter(
                "crsi_lower_threshold",
                "must be below crsi_upper_threshold",
            ));
        }
        Ok(())
    }
}

/// A rule set producing one signal per bar.
pub trait Evaluator: Send + Sync {
    fn tag(&self) -> StrategyTag;

    fn long_entry(&self, state: &IndicatorState) -> bool;
    fn long_exit(&self, state: &IndicatorState) -> bool;
    fn short_entry(&self, state: &IndicatorState) -> bool;
    fn short_exit(&self, state: &IndicatorState) -> bool;

    /// Line a long position must stay above under cross-strategy exits.
    fn bearish_line(&self, state: &IndicatorState) -> Option<f64>;
    /// Line a short position must stay below under cross-strategy exits.
    fn bullish_line(&self, state: &IndicatorState) -> Option<f64>;

    fn allows_shorting(&self) -> bool;

    /// While flat an entry wins over an exit condition; while open only the
    /// side's exit rule is consulted.
    fn evaluate(&self, state: &IndicatorState, side: Side) -> SignalKind {
        match side {
            Side::Flat => {
                if self.long_entry(state) {
                    SignalKind::LongEntry
                } else if self.allows_shorting() && self.short_entry(state) {
                    SignalKind::ShortEntry
                } else if self.long_exit(state) {
                    SignalKind::Exit
                } else {
                    SignalKind::Hold
                }
            }
            Side::Long if self.long_exit(state) => SignalKind::Exit,
            Side::Short if self.short_exit(state) => SignalKind::Exit,
            Side::Long | Side::Short => SignalKind::Hold,
        }
    }
}

fn below(close: f64, line: Option<f64>) -> bool {
    line.is_some_and(|l| close < l)
}

fn above(close: f64, line: Option<f64>) -> bool {
    line.is_some_and(|l| close > l)
}

/// Entry gate: passes when the filter is off, otherwise needs a defined VWAP
/// on the required side.
fn vwap_gate(filter: bool, state: &IndicatorState, want_above: bool) -> bool {
    if !filter {
        return true;
    }
    if want_above {
        above(state.close, state.vwap)
    } else {
        below(state.close, state.vwap)
    }
}

/// Exit trigger: only fires with the filter on and VWAP defined.
fn vwap_trigger(filter: bool, state: &IndicatorState, on_above: bool) -> bool {
    filter && vwap_gate(true, state, on_above)
}

/// Buy below the lower band on a deeply oversold Connors RSI.
#[derive(Debug, Clone)]
pub struct MeanReversion {
    pub lower_threshold: f64,
    pub upper_threshold: f64,
    pub vwap_filter: bool,
    pub allow_shorting: bool,
}

impl Evaluator for MeanReversion {
    fn tag(&self) -> StrategyTag {
        StrategyTag::MeanReversion
    }

    fn long_entry(&self, s: &IndicatorState) -> bool {
        below(s.close, s.bands.map(|b| b.lower))
            && s.crsi.is_some_and(|c| c < self.lower_threshold)
            && vwap_gate(self.vwap_filter, s, false)
    }

    fn long_exit(&self, s: &IndicatorState) -> bool {
        above(s.close, s.bands.map(|b| b.upper))
            || s.crsi.is_some_and(|c| c > self.upper_threshold)
            || vwap_trigger(self.vwap_filter, s, true)
    }

    fn short_entry(&self, s: &IndicatorState) -> bool {
        above(s.close, s.bands.map(|b| b.upper))
            && s.crsi.is_some_and(|c| c > self.upper_threshold)
            && vwap_gate(self.vwap_filter, s, true)
    }

    fn short_exit(&self, s: &IndicatorState) -> bool {
        below(s.close, s.bands.map(|b| b.lower))
            || s.crsi.is_some_and(|c| c < self.lower_threshold)
            || vwap_trigger(self.vwap_filter, s, false)
    }

    fn bearish_line(&self, s: &IndicatorState) -> Option<f64> {
        s.bands.map(|b| b.lower)
    }

    fn bullish_line(&self, s: &IndicatorState) -> Option<f64> {
        s.bands.map(|b| b.upper)
    }

    fn allows_shorting(&self) -> bool {
        self.allow_shorting
    }
}

/// Hold while the close stays above its moving average.
#[derive(Debug, Clone)]
pub struct TrendFollowing {
    pub vwap_filter: bool,
    pub allow_shorting: bool,
}

impl Evaluator for TrendFollowing {
    fn tag(&self) -> StrategyTag {
        StrategyTag::TrendFollowing
    }

    fn long_entry(&self, s: &IndicatorState) -> bool {
        above(s.close, s.trend_sma) && vwap_gate(self.vwap_filter, s, true)
    }

    fn long_exit(&self, s: &IndicatorState) -> bool {
        below(s.close, s.trend_sma) || vwap_trigger(self.vwap_filter, s, false)
    }

    fn short_entry(&self, s: &IndicatorState) -> bool {
        below(s.close, s.trend_sma) && vwap_gate(self.vwap_filter, s, false)
    }

    fn short_exit(&self, s: &IndicatorState) -> bool {
        above(s.close, s.trend_sma) || vwap_trigger(self.vwap_filter, s, true)
    }

    fn bearish_line(&self, s: &IndicatorState) -> Option<f64> {
        s.trend_sma
    }

    fn bullish_line(&self, s: &IndicatorState) -> Option<f64> {
        s.trend_sma
    }

    fn allows_shorting(&self) -> bool {
        self.allow_shorting
    }
}

/// Buy a close above the prior `breakout_period` highs.
#[derive(Debug, Clone)]
pub struct Breakout {
    pub vwap_filter: bool,
    pub allow_shorting: bool,
}

impl Evaluator for Breakout {
    fn tag(&self) -> StrategyTag {
        StrategyTag::Breakout
    }

    fn long_entry(&self, s: &IndicatorState) -> bool {
        above(s.close, s.prior_highest) && vwap_gate(self.vwap_filter, s, true)
    }

    fn long_exit(&self, s: &IndicatorState) -> bool {
        below(s.close, s.prior_lowest) || vwap_trigger(self.vwap_filter, s, false)
    }

    fn short_entry(&self, s: &IndicatorState) -> bool {
        below(s.close, s.prior_lowest) && vwap_gate(self.vwap_filter, s, false)
    }

    fn short_exit(&self, s: &IndicatorState) -> bool {
        above(s.close, s.prior_highest) || vwap_trigger(self.vwap_filter, s, true)
    }

    fn bearish_line(&self, s: &IndicatorState) -> Option<f64> {
        s.prior_lowest
    }

    fn bullish_line(&self, s: &IndicatorState) -> Option<f64> {
        s.prior_highest
    }

    fn allows_shorting(&self) -> bool {
        self.allow_shorting
    }
}

/// Build the evaluator for one single-instrument strategy.
pub fn evaluator_for(
    tag: StrategyTag,
    params: &StrategyParams,
) -> Result<Box<dyn Evaluator>, HedgeError> {
    let evaluator: Box<dyn Evaluator> = match tag {
        StrategyTag::MeanReversion => Box::new(MeanReversion {
            lower_threshold: params.crsi_lower_threshold,
            upper_threshold: params.crsi_upper_threshold,
            vwap_filter: params.vwap_filter,
            allow_shorting: params.allow_shorting,
        }),
        StrategyTag::TrendFollowing => Box::new(TrendFollowing {
            vwap_filter: params.vwap_filter,
            allow_shorting: params.allow_shorting,
        }),
        StrategyTag::Breakout => Box::new(Breakout {
            vwap_filter: params.vwap_filter,
            allow_shorting: params.allow_shorting,
        }),
        StrategyTag::PairsHedge => {
            return Err(HedgeError::invalid_parameter(
                "strategy",
                "pairs_hedge runs on two instruments, not one",
            ));
        }
    };
    Ok(evaluator)
}
