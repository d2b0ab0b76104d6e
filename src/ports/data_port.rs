//! Bar source port trait.

use crate::domain::error::HedgeError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

pub trait DataPort {
    /// Bars for `code`, ascending by date, limited to the inclusive range
    /// when bounds are given.
    fn fetch_bars(
        &self,
        code: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<OhlcvBar>, HedgeError>;

    fn list_symbols(&self) -> Result<Vec<String>, HedgeError>;
}
