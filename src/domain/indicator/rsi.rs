//! RSI (Relative Strength Index), updated one value at a time.
//!
//! Uses Wilder's smoothing for average gain/loss calculation:
//! - First average: simple mean of gains/losses over the first n changes
//! - Subsequent: avg = (prev_avg * (n-1) + current) / n
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100
//!
//! Warmup: n + 1 inputs (n changes) before the first defined value.

#[derive(Debug, Clone)]
pub struct WilderRsi {
    period: usize,
    prev: Option<f64>,
    changes_seen: usize,
    avg_gain: f64,
    avg_loss: f64,
}

impl WilderRsi {
    pub fn new(period: usize) -> Self {
        WilderRsi {
            period: period.max(1),
            prev: None,
            changes_seen: 0,
            avg_gain: 0.0,
            avg_loss: 0.0,
        }
    }

    pub fn update(&mut self, value: f64) -> Option<f64> {
        let prev = self.prev.replace(value)?;
        let change = value - prev;
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);
        let n = self.period as f64;

        if self.changes_seen < self.period {
            // Accumulate sums for the simple-average seed.
            self.avg_gain += gain;
            self.avg_loss += loss;
            self.changes_seen += 1;
            if self.changes_seen < self.period {
                return None;
            }
            self.avg_gain /= n;
            self.avg_loss /= n;
        } else {
            self.avg_gain = (self.avg_gain * (n - 1.0) + gain) / n;
            self.avg_loss = (self.avg_loss * (n - 1.0) + loss) / n;
        }

        Some(rsi_from_averages(self.avg_gain, self.avg_loss))
    }
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(values: &[f64], period: usize) -> Vec<Option<f64>> {
        let mut rsi = WilderRsi::new(period);
        values.iter().map(|&v| rsi.update(v)).collect()
    }

    #[test]
    fn rsi_empty_and_single() {
        assert!(run(&[], 14).is_empty());
        assert_eq!(run(&[100.0], 14), vec![None]);
    }

    #[test]
    fn rsi_warmup_period() {
        let values: Vec<f64> = (1..=15).map(|i| 100.0 + (i as f64 % 5.0) * 2.0).collect();
        let series = run(&values, 14);
        for (i, v) in series.iter().enumerate().take(14) {
            assert!(v.is_none(), "bar {i} should be undefined");
        }
        assert!(series[14].is_some());
    }

    #[test]
    fn rsi_all_gains_no_losses() {
        let values: Vec<f64> = (0..15).map(|i| 100.0 + i as f64).collect();
        let series = run(&values, 14);
        assert!((series[14].unwrap() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rsi_flat_series_is_100() {
        let series = run(&[50.0; 6], 3);
        assert_eq!(series[5], Some(100.0));
    }

    #[test]
    fn rsi_all_losses_no_gains() {
        let values: Vec<f64> = (0..15).map(|i| 100.0 - i as f64).collect();
        let series = run(&values, 14);
        assert!(series[14].unwrap().abs() < f64::EPSILON);
    }

    #[test]
    fn rsi_in_range() {
        let values: Vec<f64> = (1..=40)
            .map(|i| 100.0 + (i as f64 % 7.0 - 3.0) * 2.0)
            .collect();
        for v in run(&values, 14).into_iter().flatten() {
            assert!((0.0..=100.0).contains(&v), "RSI {v} out of range");
        }
    }

    #[test]
    fn rsi_seed_then_wilder_smoothing() {
        // changes: +2, -1, +3 -> seed avg_gain 5/3, avg_loss 1/3
        let series = run(&[10.0, 12.0, 11.0, 14.0, 13.0], 3);
        let seed = 100.0 - 100.0 / (1.0 + 5.0);
        assert!((series[3].unwrap() - seed).abs() < 1e-12);
        // next change -1: gain (5/3*2 + 0)/3, loss (1/3*2 + 1)/3
        let g = (5.0 / 3.0 * 2.0) / 3.0;
        let l = (1.0 / 3.0 * 2.0 + 1.0) / 3.0;
        let expected = 100.0 - 100.0 / (1.0 + g / l);
        assert!((series[4].unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn rsi_known_calculation() {
        let values = [
            44.0, 44.25, 44.50, 43.75, 44.50, 44.25, 44.75, 45.25, 45.50, 45.25, 45.50, 46.0,
            46.25, 46.0, 46.50,
        ];
        let rsi = run(&values, 14)[14].unwrap();
        assert!(rsi > 50.0 && rsi < 100.0, "RSI should be in bullish territory");
    }
}
