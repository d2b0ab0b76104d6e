//! Negative-correlation screening across instruments.
//!
//! Series are joined on shared dates, transformed to the chosen basis and
//! compared pairwise with the Pearson coefficient. No significance testing.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use super::error::HedgeError;
use super::indicator::rolling::Sma;
use super::ohlcv::{OhlcvBar, align_on_common_dates};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrelationBasis {
    DailyReturns,
    /// Returns between the last closes of consecutive ISO weeks.
    WeeklyReturns,
    MonthlyReturns,
    /// Levels of an N-bar simple moving average of the close.
    MovingAverage(usize),
}

impl fmt::Display for CorrelationBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorrelationBasis::DailyReturns => write!(f, "daily"),
            CorrelationBasis::WeeklyReturns => write!(f, "weekly"),
            CorrelationBasis::MonthlyReturns => write!(f, "monthly"),
            CorrelationBasis::MovingAverage(n) => write!(f, "ma{n}"),
        }
    }
}

impl FromStr for CorrelationBasis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        match s.as_str() {
            "daily" => Ok(CorrelationBasis::DailyReturns),
            "weekly" => Ok(CorrelationBasis::WeeklyReturns),
            "monthly" => Ok(CorrelationBasis::MonthlyReturns),
            other => match other.strip_prefix("ma").map(str::parse::<usize>) {
                Some(Ok(n)) if n > 0 => Ok(CorrelationBasis::MovingAverage(n)),
                _ => Err(format!(
                    "unknown basis '{other}', expected daily, weekly, monthly or maN"
                )),
            },
        }
    }
}

/// Pearson correlation of two equal-length samples. `None` with fewer than
/// two points or when either side has no variance.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx <= 0.0 || syy <= 0.0 {
        return None;
    }
    let r = sxy / (sxx.sqrt() * syy.sqrt());
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}

fn returns(closes: &[f64]) -> Vec<f64> {
    closes.windows(2).map(|w| w[1] / w[0] - 1.0).collect()
}

/// Last close of each period, where `period_of` maps a date to its bucket.
fn period_closes<K: PartialEq>(
    bars: &[OhlcvBar],
    period_of: impl Fn(NaiveDate) -> K,
) -> Vec<f64> {
    let mut closes: Vec<f64> = Vec::new();
    let mut current: Option<K> = None;
    for bar in bars {
        let key = period_of(bar.date);
        match (&current, closes.last_mut()) {
            (Some(k), Some(last)) if *k == key => *last = bar.close,
            _ => closes.push(bar.close),
        }
        current = Some(key);
    }
    closes
}

/// The series each instrument contributes under `basis`. Moving averages
/// drop their warm-up bars, identically for every instrument.
pub fn basis_series(bars: &[OhlcvBar], basis: CorrelationBasis) -> Vec<f64> {
    match basis {
        CorrelationBasis::DailyReturns => {
            let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
            returns(&closes)
        }
        CorrelationBasis::WeeklyReturns => {
            returns(&period_closes(bars, |d| (d.iso_week().year(), d.iso_week().week())))
        }
        CorrelationBasis::MonthlyReturns => {
            returns(&period_closes(bars, |d| (d.year(), d.month())))
        }
        CorrelationBasis::MovingAverage(period) => {
            let mut sma = Sma::new(period);
            bars.iter().filter_map(|b| sma.update(b.close)).collect()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub basis: CorrelationBasis,
    pub codes: Vec<String>,
    /// Row-major; `values[i][j]` is undefined when either series is flat.
    pub values: Vec<Vec<Option<f64>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelatedPair {
    pub first: String,
    pub second: String,
    pub correlation: f64,
}

impl CorrelationMatrix {
    /// Correlate every instrument with every other on their shared dates.
    pub fn compute(
        series: &[Vec<OhlcvBar>],
        basis: CorrelationBasis,
    ) -> Result<Self, HedgeError> {
        if series.len() < 2 {
            return Err(HedgeError::invalid_parameter(
                "codes",
                "screening needs at least two instruments",
            ));
        }
        let aligned = align_on_common_dates(series);
        let codes: Vec<String> = series
            .iter()
            .map(|bars| bars.first().map(|b| b.code.clone()).unwrap_or_default())
            .collect();
        let shared = aligned.first().map_or(0, Vec::len);
        if shared < 3 {
            return Err(HedgeError::InsufficientData {
                code: codes.join(","),
                bars: shared,
                minimum: 3,
            });
        }

        let transformed: Vec<Vec<f64>> = aligned.iter().map(|b| basis_series(b, basis)).collect();
        let n = transformed.len();
        let mut values = vec![vec![None; n]; n];
        for i in 0..n {
            values[i][i] = pearson(&transformed[i], &transformed[i]);
            for j in 0..i {
                let r = pearson(&transformed[i], &transformed[j]);
                values[i][j] = r;
                values[j][i] = r;
            }
        }
        Ok(CorrelationMatrix {
            basis,
            codes,
            values,
        })
    }

    /// Pairs strictly below `threshold`, as (row, earlier column) in matrix
    /// order.
    pub fn negative_pairs(&self, threshold: f64) -> Vec<CorrelatedPair> {
        let mut pairs = Vec::new();
        for (i, row) in self.values.iter().enumerate() {
            for (j, value) in row.iter().enumerate().take(i) {
                if let Some(r) = value.filter(|&r| r < threshold) {
                    pairs.push(CorrelatedPair {
                        first: self.codes[i].clone(),
                        second: self.codes[j].clone(),
                        correlation: r,
                    });
                }
            }
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn series(code: &str, start: NaiveDate, closes: &[f64]) -> Vec<OhlcvBar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| OhlcvBar {
                code: code.into(),
                date: start + chrono::Days::new(i as u64),
                open: c,
                high: c,
                low: c,
                close: c,
                volume: 1.0,
            })
            .collect()
    }

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 1, 3).unwrap()
    }

    #[test]
    fn pearson_known_values() {
        assert_relative_eq!(pearson(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]).unwrap(), 1.0);
        assert_relative_eq!(pearson(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]).unwrap(), -1.0);
        assert_eq!(pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]), None);
        assert_eq!(pearson(&[1.0], &[1.0]), None);
    }

    #[test]
    fn basis_parse() {
        assert_eq!("daily".parse(), Ok(CorrelationBasis::DailyReturns));
        assert_eq!("MA50".parse(), Ok(CorrelationBasis::MovingAverage(50)));
        assert!("ma0".parse::<CorrelationBasis>().is_err());
        assert!("hourly".parse::<CorrelationBasis>().is_err());
        assert_eq!(CorrelationBasis::MovingAverage(20).to_string(), "ma20");
    }

    #[test]
    fn mirrored_returns_are_negatively_correlated() {
        let up: Vec<f64> = (0..30).map(|i| 100.0 + ((i * 7) % 5) as f64).collect();
        let down: Vec<f64> = up.iter().map(|c| 200.0 - c).collect();
        let flat_ish: Vec<f64> = (0..30).map(|i| 50.0 + (i % 2) as f64 * 0.1).collect();
        let data = vec![
            series("AAA", start(), &up),
            series("BBB", start(), &down),
            series("CCC", start(), &flat_ish),
        ];
        let matrix = CorrelationMatrix::compute(&data, CorrelationBasis::DailyReturns).unwrap();
        let r = matrix.values[1][0].unwrap();
        assert!(r < -0.9);
        let pairs = matrix.negative_pairs(-0.5);
        assert_eq!(pairs[0].first, "BBB");
        assert_eq!(pairs[0].second, "AAA");
        assert!(pairs.iter().all(|p| p.correlation < -0.5));
    }

    #[test]
    fn dates_are_inner_joined() {
        let a = series("AAA", start(), &[1.0, 2.0, 3.0, 4.0, 5.0]);
        let later = start() + chrono::Days::new(1);
        let b = series("BBB", later, &[10.0, 20.0, 30.0, 40.0, 50.0]);
        let matrix =
            CorrelationMatrix::compute(&[a, b], CorrelationBasis::MovingAverage(2)).unwrap();
        // shared dates carry closes 2..5 and 10..40, both linear
        assert_relative_eq!(matrix.values[0][1].unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn weekly_basis_uses_last_close_of_week() {
        // 2022-01-03 is a Monday; 14 days span two ISO weeks
        let closes: Vec<f64> = (1..=14).map(f64::from).collect();
        let bars = series("AAA", start(), &closes);
        let weekly = basis_series(&bars, CorrelationBasis::WeeklyReturns);
        assert_eq!(weekly.len(), 1);
        assert_relative_eq!(weekly[0], 14.0 / 7.0 - 1.0);
    }

    #[test]
    fn monthly_basis_buckets_by_month() {
        let start = NaiveDate::from_ymd_opt(2022, 1, 30).unwrap();
        let bars = series("AAA", start, &[1.0, 2.0, 3.0, 4.0]);
        // Jan ends at 2.0, Feb at 4.0
        let monthly = basis_series(&bars, CorrelationBasis::MonthlyReturns);
        assert_eq!(monthly, vec![1.0]);
    }

    #[test]
    fn too_few_instruments() {
        let a = series("AAA", start(), &[1.0, 2.0, 3.0]);
        assert!(CorrelationMatrix::compute(&[a], CorrelationBasis::DailyReturns).is_err());
    }
}
