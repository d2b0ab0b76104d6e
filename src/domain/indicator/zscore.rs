//! Rolling z-score: (x - mean) / sample stddev over the last `window` values.
//!
//! Undefined during warm-up and whenever the window has no dispersion, so a
//! flat spread never yields an infinite score.

use super::rolling::{Deviation, RollingStats};

/// Stddev at or below this fraction of the window's scale counts as zero.
const ZERO_DISPERSION: f64 = 1e-12;

#[derive(Debug, Clone)]
pub struct ZScore {
    stats: RollingStats,
}

impl ZScore {
    pub fn new(window: usize) -> Self {
        ZScore {
            stats: RollingStats::new(window),
        }
    }

    pub fn update(&mut self, value: f64) -> Option<f64> {
        self.stats.push(value);
        let mean = self.stats.mean()?;
        let stddev = self.stats.stddev(Deviation::Sample)?;
        if stddev <= ZERO_DISPERSION * mean.abs().max(1.0) {
            return None;
        }
        let z = (value - mean) / stddev;
        z.is_finite().then_some(z)
    }
}
