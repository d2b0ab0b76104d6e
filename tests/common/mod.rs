#![allow(dead_code)]

use chrono::NaiveDate;
use hedgetrader::domain::correlation::CorrelatedPair;
use hedgetrader::domain::error::HedgeError;
use hedgetrader::domain::event::TradeEvent;
use hedgetrader::domain::metrics::Metrics;
pub use hedgetrader::domain::ohlcv::OhlcvBar;
use hedgetrader::domain::portfolio::EquityPoint;
use hedgetrader::domain::position::ClosedTrade;
use hedgetrader::domain::sweep::SweepReport;
use hedgetrader::ports::data_port::DataPort;
use hedgetrader::ports::report_port::ReportPort;
use std::cell::RefCell;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, code: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(code.to_string(), bars);
        self
    }

    pub fn with_error(mut self, code: &str, reason: &str) -> Self {
        self.errors.insert(code.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(
        &self,
        code: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<OhlcvBar>, HedgeError> {
        if let Some(reason) = self.errors.get(code) {
            return Err(HedgeError::DataSource {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(code)
            .map(|bars| {
                bars.iter()
                    .filter(|b| start_date.is_none_or(|s| b.date >= s))
                    .filter(|b| end_date.is_none_or(|e| b.date <= e))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_symbols(&self) -> Result<Vec<String>, HedgeError> {
        let mut codes: Vec<String> = self.data.keys().cloned().collect();
        codes.sort();
        Ok(codes)
    }
}

/// Records what each report call received.
#[derive(Default)]
pub struct MockReportPort {
    pub equity: RefCell<Vec<(String, Vec<EquityPoint>)>>,
    pub events: RefCell<Vec<(String, Vec<TradeEvent>)>>,
    pub trades: RefCell<Vec<(String, Vec<ClosedTrade>)>>,
    pub metrics: RefCell<Vec<(String, Metrics)>>,
    pub sweeps: RefCell<Vec<(String, SweepReport)>>,
    pub correlations: RefCell<Vec<(String, Vec<CorrelatedPair>)>>,
}

impl ReportPort for MockReportPort {
    fn write_equity_curve(&self, name: &str, curve: &[EquityPoint]) -> Result<(), HedgeError> {
        self.equity.borrow_mut().push((name.to_string(), curve.to_vec()));
        Ok(())
    }

    fn write_events(&self, name: &str, events: &[TradeEvent]) -> Result<(), HedgeError> {
        self.events.borrow_mut().push((name.to_string(), events.to_vec()));
        Ok(())
    }

    fn write_trades(&self, name: &str, trades: &[ClosedTrade]) -> Result<(), HedgeError> {
        self.trades.borrow_mut().push((name.to_string(), trades.to_vec()));
        Ok(())
    }

    fn write_metrics(&self, name: &str, metrics: &Metrics) -> Result<(), HedgeError> {
        self.metrics.borrow_mut().push((name.to_string(), metrics.clone()));
        Ok(())
    }

    fn write_sweep(&self, name: &str, report: &SweepReport) -> Result<(), HedgeError> {
        self.sweeps.borrow_mut().push((name.to_string(), report.clone()));
        Ok(())
    }

    fn write_correlations(&self, name: &str, pairs: &[CorrelatedPair]) -> Result<(), HedgeError> {
        self.correlations
            .borrow_mut()
            .push((name.to_string(), pairs.to_vec()));
        Ok(())
    }
}

pub fn make_bar(code: &str, date: &str, close: f64) -> OhlcvBar {
    OhlcvBar {
        code: code.to_string(),
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        open: close,
        high: close + 1.0,
        low: close - 1.0,
        close,
        volume: 1000.0,
    }
}

/// Consecutive daily bars from 2024-01-01 with the given closes.
pub fn bars_from_closes(code: &str, closes: &[f64]) -> Vec<OhlcvBar> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| OhlcvBar {
            code: code.to_string(),
            date: start + chrono::Days::new(i as u64),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1000.0,
        })
        .collect()
}

/// A deterministic oscillating series that keeps every strategy busy.
pub fn generate_bars(code: &str, count: usize, phase: f64) -> Vec<OhlcvBar> {
    let closes: Vec<f64> = (0..count)
        .map(|i| {
            let t = i as f64;
            100.0 + 8.0 * (t * 0.13 + phase).sin() + 3.0 * (t * 0.41).cos() + (i % 5) as f64 * 0.3
        })
        .collect();
    let mut bars = bars_from_closes(code, &closes);
    for (i, bar) in bars.iter_mut().enumerate() {
        bar.high = bar.close + 1.0 + (i % 3) as f64 * 0.2;
        bar.low = bar.close - 1.0;
        bar.volume = 1000.0 + (i % 7) as f64 * 150.0;
    }
    bars
}
