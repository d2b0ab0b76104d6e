//! Fixed-priority signal arbitration.
//!
//! Evaluators are held in priority order. While flat the first one with a
//! non-HOLD signal decides the bar and the rest are not consulted.

use super::error::HedgeError;
use super::indicator::IndicatorState;
use super::position::Side;
use super::signal::{Signal, SignalKind, StrategyTag};
use super::strategy::{Evaluator, StrategyParams, evaluator_for};

/// Priority of the combined engine.
pub const COMBINED_ORDER: [StrategyTag; 3] = [
    StrategyTag::MeanReversion,
    StrategyTag::TrendFollowing,
    StrategyTag::Breakout,
];

pub struct Arbitrator {
    evaluators: Vec<Box<dyn Evaluator>>,
}

impl std::fmt::Debug for Arbitrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arbitrator")
            .field("order", &self.tags())
            .finish()
    }
}

impl Arbitrator {
    /// Evaluators in the given order; the first has the highest priority.
    pub fn from_evaluators(evaluators: Vec<Box<dyn Evaluator>>) -> Self {
        Arbitrator { evaluators }
    }

    pub fn combined(params: &StrategyParams) -> Result<Self, HedgeError> {
        let evaluators = COMBINED_ORDER
            .iter()
            .map(|&tag| evaluator_for(tag, params))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_evaluators(evaluators))
    }

    pub fn single(tag: StrategyTag, params: &StrategyParams) -> Result<Self, HedgeError> {
        Ok(Self::from_evaluators(vec![evaluator_for(tag, params)?]))
    }

    /// The action for a flat instrument, `None` when every evaluator holds.
    pub fn arbitrate(&self, state: &IndicatorState) -> Option<Signal> {
        self.evaluators.iter().find_map(|e| {
            let kind = e.evaluate(state, Side::Flat);
            (kind != SignalKind::Hold).then(|| Signal::new(kind, e.tag()))
        })
    }

    pub fn evaluator(&self, tag: StrategyTag) -> Option<&dyn Evaluator> {
        self.evaluators
            .iter()
            .find(|e| e.tag() == tag)
            .map(|e| e.as_ref())
    }

    pub fn evaluators(&self) -> impl Iterator<Item = &dyn Evaluator> {
        self.evaluators.iter().map(|e| e.as_ref())
    }

    pub fn tags(&self) -> Vec<StrategyTag> {
        self.evaluators.iter().map(|e| e.tag()).collect()
    }
}
