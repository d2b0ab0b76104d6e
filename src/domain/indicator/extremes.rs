//! Rolling highest / lowest over the last `period` values.
//!
//! A monotonic deque keeps candidate extremes with their positions, so each
//! update is O(1) amortized.

use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extreme {
    Highest,
    Lowest,
}

#[derive(Debug, Clone)]
pub struct RollingExtreme {
    kind: Extreme,
    period: usize,
    seen: usize,
    candidates: VecDeque<(usize, f64)>,
}

impl RollingExtreme {
    pub fn new(kind: Extreme, period: usize) -> Self {
        RollingExtreme {
            kind,
            period: period.max(1),
            seen: 0,
            candidates: VecDeque::new(),
        }
    }

    pub fn highest(period: usize) -> Self {
        Self::new(Extreme::Highest, period)
    }

    pub fn lowest(period: usize) -> Self {
        Self::new(Extreme::Lowest, period)
    }

    fn dominates(&self, newer: f64, older: f64) -> bool {
        match self.kind {
            Extreme::Highest => newer >= older,
            Extreme::Lowest => newer <= older,
        }
    }

    pub fn update(&mut self, value: f64) -> Option<f64> {
        let index = self.seen;
        self.seen += 1;

        while let Some(&(_, back)) = self.candidates.back() {
            if self.dominates(value, back) {
                self.candidates.pop_back();
            } else {
                break;
            }
        }
        self.candidates.push_back((index, value));

        while let Some(&(front_index, _)) = self.candidates.front() {
            if front_index + self.period <= index {
                self.candidates.pop_front();
            } else {
                break;
            }
        }

        self.value()
    }

    /// Extreme of the last `period` values, undefined until `period` seen.
    pub fn value(&self) -> Option<f64> {
        if self.seen < self.period {
            return None;
        }
        self.candidates.front().map(|&(_, v)| v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn highest_warmup_and_roll() {
        let mut h = RollingExtreme::highest(3);
        assert_eq!(h.update(5.0), None);
        assert_eq!(h.update(9.0), None);
        assert_eq!(h.update(7.0), Some(9.0));
        assert_eq!(h.update(6.0), Some(9.0));
        assert_eq!(h.update(4.0), Some(7.0));
        assert_eq!(h.update(3.0), Some(6.0));
    }

    #[test]
    fn lowest_warmup_and_roll() {
        let mut l = RollingExtreme::lowest(2);
        assert_eq!(l.update(5.0), None);
        assert_eq!(l.update(3.0), Some(3.0));
        assert_eq!(l.update(4.0), Some(3.0));
        assert_eq!(l.update(8.0), Some(4.0));
    }

    proptest! {
        #[test]
        fn matches_batch_max_min(
            values in prop::collection::vec(-1000.0f64..1000.0, 1..150),
            period in 1usize..20,
        ) {
            let mut h = RollingExtreme::highest(period);
            let mut l = RollingExtreme::lowest(period);
            for (i, &v) in values.iter().enumerate() {
                let hv = h.update(v);
                let lv = l.update(v);
                if i + 1 < period {
                    prop_assert!(hv.is_none() && lv.is_none());
                } else {
                    let window = &values[i + 1 - period..=i];
                    let max = window.iter().cloned().fold(f64::MIN, f64::max);
                    let min = window.iter().cloned().fold(f64::MAX, f64::min);
                    prop_assert_eq!(hv, Some(max));
                    prop_assert_eq!(lv, Some(min));
                }
            }
        }
    }
}
