//! Report sink port trait.

use crate::domain::correlation::CorrelatedPair;
use crate::domain::error::HedgeError;
use crate::domain::event::TradeEvent;
use crate::domain::metrics::Metrics;
use crate::domain::portfolio::EquityPoint;
use crate::domain::position::ClosedTrade;
use crate::domain::sweep::SweepReport;

/// Port for writing run outputs. `name` identifies the run, e.g. an
/// instrument code or a pair key.
pub trait ReportPort {
    fn write_equity_curve(&self, name: &str, curve: &[EquityPoint]) -> Result<(), HedgeError>;

    fn write_events(&self, name: &str, events: &[TradeEvent]) -> Result<(), HedgeError>;

    fn write_trades(&self, name: &str, trades: &[ClosedTrade]) -> Result<(), HedgeError>;

    fn write_metrics(&self, name: &str, metrics: &Metrics) -> Result<(), HedgeError>;

    fn write_sweep(&self, name: &str, report: &SweepReport) -> Result<(), HedgeError>;

    fn write_correlations(&self, name: &str, pairs: &[CorrelatedPair]) -> Result<(), HedgeError>;
}
