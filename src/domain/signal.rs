//! Per-bar strategy signals.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    LongEntry,
    ShortEntry,
    Exit,
    Hold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyTag {
    MeanReversion,
    TrendFollowing,
    Breakout,
    PairsHedge,
}

impl fmt::Display for StrategyTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StrategyTag::MeanReversion => "mean_reversion",
            StrategyTag::TrendFollowing => "trend_following",
            StrategyTag::Breakout => "breakout",
            StrategyTag::PairsHedge => "pairs_hedge",
        };
        write!(f, "{name}")
    }
}

impl FromStr for StrategyTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "mean_reversion" => Ok(StrategyTag::MeanReversion),
            "trend_following" => Ok(StrategyTag::TrendFollowing),
            "breakout" => Ok(StrategyTag::Breakout),
            "pairs_hedge" | "pairs" => Ok(StrategyTag::PairsHedge),
            other => Err(format!("unknown strategy '{other}'")),
        }
    }
}

/// A signal tagged with the strategy that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signal {
    pub kind: SignalKind,
    pub tag: StrategyTag,
}

impl Signal {
    pub fn new(kind: SignalKind, tag: StrategyTag) -> Self {
        Signal { kind, tag }
    }

    pub fn is_hold(&self) -> bool {
        self.kind == SignalKind::Hold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_round_trips_through_names() {
        for tag in [
            StrategyTag::MeanReversion,
            StrategyTag::TrendFollowing,
            StrategyTag::Breakout,
            StrategyTag::PairsHedge,
        ] {
            assert_eq!(tag.to_string().parse::<StrategyTag>(), Ok(tag));
        }
    }

    #[test]
    fn tag_parse_accepts_spaces_and_dashes() {
        assert_eq!("Mean Reversion".parse(), Ok(StrategyTag::MeanReversion));
        assert_eq!("trend-following".parse(), Ok(StrategyTag::TrendFollowing));
        assert!("momentum".parse::<StrategyTag>().is_err());
    }

    #[test]
    fn hold_detection() {
        assert!(Signal::new(SignalKind::Hold, StrategyTag::Breakout).is_hold());
        assert!(!Signal::new(SignalKind::Exit, StrategyTag::Breakout).is_hold());
    }
}
