//! Rolling mean / standard deviation over the last `period` values.
//!
//! Maintained incrementally with Welford-style add/remove updates, so each
//! push is O(1). Every `period` pushes the aggregates are recomputed from the
//! window with a two-pass sum to bound floating-point drift; the amortized
//! cost stays O(1).
//!
//! SMA(n)[i] = mean of the last n values, undefined until n values seen.
//! STDDEV(n)[i] = sqrt(sum((x - SMA)^2) / d), d = n (population) or n - 1 (sample).

use std::collections::VecDeque;

/// Divisor used for the variance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deviation {
    /// Divide by n.
    Population,
    /// Divide by n - 1.
    Sample,
}

#[derive(Debug, Clone)]
pub struct RollingStats {
    period: usize,
    window: VecDeque<f64>,
    mean: f64,
    m2: f64,
    since_resync: usize,
}

impl RollingStats {
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        RollingStats {
            period,
            window: VecDeque::with_capacity(period + 1),
            mean: 0.0,
            m2: 0.0,
            since_resync: 0,
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn push(&mut self, value: f64) {
        self.window.push_back(value);
        let n = self.window.len() as f64;
        let delta = value - self.mean;
        self.mean += delta / n;
        self.m2 += delta * (value - self.mean);

        if self.window.len() > self.period {
            if let Some(old) = self.window.pop_front() {
                let n = self.window.len() as f64;
                let delta = old - self.mean;
                self.mean -= delta / n;
                self.m2 -= delta * (old - self.mean);
            }
        }

        self.since_resync += 1;
        if self.since_resync >= self.period {
            self.resync();
        }
    }

    fn resync(&mut self) {
        let n = self.window.len() as f64;
        if n == 0.0 {
            return;
        }
        let mean = self.window.iter().sum::<f64>() / n;
        self.m2 = self.window.iter().map(|x| (x - mean) * (x - mean)).sum();
        self.mean = mean;
        self.since_resync = 0;
    }

    /// True once `period` values have been seen.
    pub fn is_ready(&self) -> bool {
        self.window.len() == self.period
    }

    pub fn mean(&self) -> Option<f64> {
        self.is_ready().then_some(self.mean)
    }

    pub fn variance(&self, deviation: Deviation) -> Option<f64> {
        if !self.is_ready() {
            return None;
        }
        let divisor = match deviation {
            Deviation::Population => self.period as f64,
            Deviation::Sample if self.period < 2 => return None,
            Deviation::Sample => (self.period - 1) as f64,
        };
        Some(self.m2.max(0.0) / divisor)
    }

    pub fn stddev(&self, deviation: Deviation) -> Option<f64> {
        self.variance(deviation).map(f64::sqrt)
    }

    /// Most recent value pushed.
    pub fn last(&self) -> Option<f64> {
        self.window.back().copied()
    }
}

/// Simple moving average over the last `period` values.
#[derive(Debug, Clone)]
pub struct Sma {
    stats: RollingStats,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        Sma {
            stats: RollingStats::new(period),
        }
    }

    pub fn update(&mut self, value: f64) -> Option<f64> {
        self.stats.push(value);
        self.stats.mean()
    }
}

/// Rolling standard deviation over the last `period` values.
#[derive(Debug, Clone)]
pub struct StdDev {
    stats: RollingStats,
    deviation: Deviation,
}

impl StdDev {
    pub fn new(period: usize, deviation: Deviation) -> Self {
        StdDev {
            stats: RollingStats::new(period),
            deviation,
        }
    }

    pub fn update(&mut self, value: f64) -> Option<f64> {
        self.stats.push(value);
        self.stats.stddev(self.deviation)
    }
}
