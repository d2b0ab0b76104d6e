//! CSV file bar source.
//!
//! One file per instrument, `{base_path}/{CODE}.csv`, with a header row.
//! Column names are matched case-insensitively against the usual spellings
//! (`date`, `open`, `high`, `low`, `close`, `volume`); extra columns such as
//! `Adj Close` are ignored. Rows are returned in file order; ordering and
//! duplicates are checked by the engine, not repaired here.

use crate::domain::error::HedgeError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

pub struct CsvAdapter {
    base_path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(alias = "Date", alias = "DATE", alias = "timestamp")]
    date: NaiveDate,
    #[serde(alias = "Open", alias = "OPEN")]
    open: f64,
    #[serde(alias = "High", alias = "HIGH")]
    high: f64,
    #[serde(alias = "Low", alias = "LOW")]
    low: f64,
    #[serde(alias = "Close", alias = "CLOSE")]
    close: f64,
    #[serde(default, alias = "Volume", alias = "VOLUME")]
    volume: f64,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, code: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", code))
    }
}

impl DataPort for CsvAdapter {
    fn fetch_bars(
        &self,
        code: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<OhlcvBar>, HedgeError> {
        let path = self.csv_path(code);
        let content = fs::read_to_string(&path).map_err(|e| HedgeError::DataSource {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for (line, result) in rdr.deserialize::<CsvRow>().enumerate() {
            let row = result.map_err(|e| HedgeError::DataSource {
                reason: format!("{}: row {}: {}", path.display(), line + 1, e),
            })?;
            if start_date.is_some_and(|s| row.date < s) || end_date.is_some_and(|e| row.date > e) {
                continue;
            }
            bars.push(OhlcvBar {
                code: code.to_string(),
                date: row.date,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume,
            });
        }

        debug!(code, bars = bars.len(), path = %path.display(), "loaded bars");
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, HedgeError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| HedgeError::DataSource {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| HedgeError::DataSource {
                reason: format!("directory entry error: {}", e),
            })?;
            let name = entry.file_name();
            if let Some(code) = name.to_string_lossy().strip_suffix(".csv") {
                symbols.push(code.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        let csv_content = "date,open,high,low,close,volume\n\
            2024-01-15,100.0,110.0,90.0,105.0,50000\n\
            2024-01-16,105.0,115.0,100.0,110.0,60000.5\n\
            2024-01-17,110.0,120.0,105.0,115.0,55000\n";
        fs::write(path.join("XOM.csv"), csv_content).unwrap();

        let yahoo = "Date,Open,High,Low,Close,Adj Close,Volume\n\
            2024-01-15, 50.0, 51.0, 49.0, 50.5, 50.1, 1200\n";
        fs::write(path.join("CVX.csv"), yahoo).unwrap();
        fs::write(path.join("notes.txt"), "ignored").unwrap();

        (dir, path)
    }

    #[test]
    fn fetch_bars_returns_correct_data() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let bars = adapter.fetch_bars("XOM", None, None).unwrap();

        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].code, "XOM");
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(bars[0].open, 100.0);
        assert_eq!(bars[0].high, 110.0);
        assert_eq!(bars[0].low, 90.0);
        assert_eq!(bars[0].close, 105.0);
        assert_eq!(bars[0].volume, 50000.0);
        assert_eq!(bars[1].volume, 60000.5);
    }

    #[test]
    fn fetch_bars_filters_by_date() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let day = NaiveDate::from_ymd_opt(2024, 1, 16).unwrap();
        let bars = adapter.fetch_bars("XOM", Some(day), Some(day)).unwrap();

        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].date, day);
    }

    #[test]
    fn capitalised_headers_and_extra_columns_accepted() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let bars = adapter.fetch_bars("CVX", None, None).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].close, 50.5);
        assert_eq!(bars[0].volume, 1200.0);
    }

    #[test]
    fn unparsable_row_is_data_source_error() {
        let (_dir, path) = setup_test_data();
        fs::write(
            path.join("BAD.csv"),
            "date,open,high,low,close,volume\n2024-01-15,abc,1,1,1,1\n",
        )
        .unwrap();
        let adapter = CsvAdapter::new(path);
        assert!(matches!(
            adapter.fetch_bars("BAD", None, None),
            Err(HedgeError::DataSource { .. })
        ));
    }

    #[test]
    fn fetch_bars_errors_for_missing_file() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        assert!(adapter.fetch_bars("XYZ", None, None).is_err());
    }

    #[test]
    fn list_symbols_returns_csv_stems() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        assert_eq!(adapter.list_symbols().unwrap(), vec!["CVX", "XOM"]);
    }
}
