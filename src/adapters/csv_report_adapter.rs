//! CSV report sink: one file per output kind under a directory.
//!
//! Files are named `{name}_{kind}.csv`, with `/` in pair keys written as `-`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::domain::correlation::CorrelatedPair;
use crate::domain::error::HedgeError;
use crate::domain::event::TradeEvent;
use crate::domain::metrics::Metrics;
use crate::domain::portfolio::EquityPoint;
use crate::domain::position::ClosedTrade;
use crate::domain::sweep::SweepReport;
use crate::ports::report_port::ReportPort;

pub struct CsvReportAdapter {
    out_dir: PathBuf,
}

/// One sweep combination flattened for the table.
#[derive(Debug, Serialize)]
struct SweepCsvRow {
    index: usize,
    mean_reversion_period: usize,
    mean_reversion_dev_factor: f64,
    crsi_rsi_period: usize,
    crsi_streak_period: usize,
    crsi_rank_period: usize,
    crsi_lower_threshold: f64,
    crsi_upper_threshold: f64,
    trend_following_period: usize,
    breakout_period: usize,
    sharpe_ratio: Option<f64>,
    total_return: Option<f64>,
    annualized_return: Option<f64>,
    max_drawdown: Option<f64>,
    total_trades: Option<usize>,
    best: bool,
    error: Option<String>,
}

impl CsvReportAdapter {
    pub fn new(out_dir: PathBuf) -> Result<Self, HedgeError> {
        fs::create_dir_all(&out_dir)?;
        Ok(Self { out_dir })
    }

    pub fn path_for(&self, name: &str, kind: &str) -> PathBuf {
        let stem = name.replace(['/', '\\'], "-");
        self.out_dir.join(format!("{stem}_{kind}.csv"))
    }

    fn write_rows<T: Serialize>(&self, path: &Path, rows: &[T]) -> Result<(), HedgeError> {
        let mut wtr = csv::Writer::from_path(path).map_err(csv_error)?;
        for row in rows {
            wtr.serialize(row).map_err(csv_error)?;
        }
        wtr.flush()?;
        info!(path = %path.display(), rows = rows.len(), "report written");
        Ok(())
    }
}

fn csv_error(e: csv::Error) -> HedgeError {
    HedgeError::Io(e.into())
}

impl ReportPort for CsvReportAdapter {
    fn write_equity_curve(&self, name: &str, curve: &[EquityPoint]) -> Result<(), HedgeError> {
        self.write_rows(&self.path_for(name, "equity"), curve)
    }

    fn write_events(&self, name: &str, events: &[TradeEvent]) -> Result<(), HedgeError> {
        self.write_rows(&self.path_for(name, "events"), events)
    }

    fn write_trades(&self, name: &str, trades: &[ClosedTrade]) -> Result<(), HedgeError> {
        self.write_rows(&self.path_for(name, "trades"), trades)
    }

    fn write_metrics(&self, name: &str, metrics: &Metrics) -> Result<(), HedgeError> {
        self.write_rows(&self.path_for(name, "metrics"), std::slice::from_ref(metrics))
    }

    fn write_sweep(&self, name: &str, report: &SweepReport) -> Result<(), HedgeError> {
        let rows: Vec<SweepCsvRow> = report
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let p = &row.params;
                let metrics = row.outcome.as_ref().ok();
                SweepCsvRow {
                    index: row.index,
                    mean_reversion_period: p.mean_reversion_period,
                    mean_reversion_dev_factor: p.mean_reversion_dev_factor,
                    crsi_rsi_period: p.crsi_rsi_period,
                    crsi_streak_period: p.crsi_streak_period,
                    crsi_rank_period: p.crsi_rank_period,
                    crsi_lower_threshold: p.crsi_lower_threshold,
                    crsi_upper_threshold: p.crsi_upper_threshold,
                    trend_following_period: p.trend_following_period,
                    breakout_period: p.breakout_period,
                    sharpe_ratio: row.sharpe(),
                    total_return: metrics.map(|m| m.total_return),
                    annualized_return: metrics.map(|m| m.annualized_return),
                    max_drawdown: metrics.map(|m| m.max_drawdown),
                    total_trades: metrics.map(|m| m.total_trades),
                    best: report.best == Some(i),
                    error: row.outcome.as_ref().err().cloned(),
                }
            })
            .collect();
        self.write_rows(&self.path_for(name, "sweep"), &rows)
    }

    fn write_correlations(&self, name: &str, pairs: &[CorrelatedPair]) -> Result<(), HedgeError> {
        self.write_rows(&self.path_for(name, "correlations"), pairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::event::{EventAction, ExitReason};
    use crate::domain::metrics::PerformanceConfig;
    use crate::domain::signal::StrategyTag;
    use crate::domain::strategy::StrategyParams;
    use crate::domain::sweep::SweepRow;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn equity_curve_has_header_and_rows() {
        let dir = TempDir::new().unwrap();
        let adapter = CsvReportAdapter::new(dir.path().to_path_buf()).unwrap();
        let curve = vec![
            EquityPoint {
                date: date(2),
                equity: 100.0,
                cash: 100.0,
            },
            EquityPoint {
                date: date(3),
                equity: 101.5,
                cash: 0.0,
            },
        ];
        adapter.write_equity_curve("SPY", &curve).unwrap();

        let text = fs::read_to_string(adapter.path_for("SPY", "equity")).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "date,equity,cash");
        assert_eq!(lines[1], "2024-01-02,100.0,100.0");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn pair_keys_become_file_safe() {
        let dir = TempDir::new().unwrap();
        let adapter = CsvReportAdapter::new(dir.path().to_path_buf()).unwrap();
        let event = TradeEvent {
            date: date(5),
            index: 4,
            code: "XOM/CVX".into(),
            action: EventAction::Exit,
            tag: StrategyTag::PairsHedge,
            price: 0.01,
            quantity: 1000.0,
            reason: Some(ExitReason::ZScore),
        };
        adapter.write_events("XOM/CVX", &[event]).unwrap();

        let path = adapter.path_for("XOM/CVX", "events");
        assert!(path.ends_with("XOM-CVX_events.csv"));
        let text = fs::read_to_string(path).unwrap();
        assert!(text.contains("pairs_hedge"));
        assert!(text.contains("z_score"));
    }

    #[test]
    fn sweep_marks_best_and_failures() {
        let dir = TempDir::new().unwrap();
        let adapter = CsvReportAdapter::new(dir.path().to_path_buf()).unwrap();
        let mut metrics = Metrics::compute(&[], &[], 1.0, &PerformanceConfig::default());
        metrics.sharpe_ratio = Some(1.5);
        let report = SweepReport {
            rows: vec![
                SweepRow {
                    index: 0,
                    params: StrategyParams::default(),
                    outcome: Err("bad period".into()),
                },
                SweepRow {
                    index: 1,
                    params: StrategyParams::default(),
                    outcome: Ok(metrics),
                },
            ],
            best: Some(1),
        };
        adapter.write_sweep("SPY", &report).unwrap();

        let mut rdr = csv::Reader::from_path(adapter.path_for("SPY", "sweep")).unwrap();
        let headers = rdr.headers().unwrap().clone();
        let best_col = headers.iter().position(|h| h == "best").unwrap();
        let error_col = headers.iter().position(|h| h == "error").unwrap();
        let records: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(&records[0][best_col], "false");
        assert_eq!(&records[0][error_col], "bad period");
        assert_eq!(&records[1][best_col], "true");
        assert_eq!(&records[1][error_col], "");
    }
}
