//! Configuration validation.
//!
//! Checks raw config keys before any engine work, reporting the first
//! offending key. Absent optional keys are fine; present ones must parse and
//! sit in range.

use std::fmt::Display;
use std::str::FromStr;

use crate::domain::backtest::StrategySelection;
use crate::domain::correlation::CorrelationBasis;
use crate::domain::error::HedgeError;
use crate::domain::indicator::VwapReset;
use crate::domain::risk::ExitMode;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

/// `[strategy]` keys holding a bar count.
pub const PERIOD_KEYS: [&str; 6] = [
    "mean_reversion_period",
    "crsi_rsi_period",
    "crsi_streak_period",
    "crsi_rank_period",
    "trend_following_period",
    "breakout_period",
];

/// `[strategy]` keys holding a real value.
pub const REAL_KEYS: [&str; 3] = [
    "mean_reversion_dev_factor",
    "crsi_lower_threshold",
    "crsi_upper_threshold",
];

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), HedgeError> {
    validate_initial_capital(config, "backtest")?;
    validate_position_size(config)?;
    validate_stop_loss(config)?;
    validate_non_negative(config, "backtest", "take_profit")?;
    validate_non_negative(config, "backtest", "commission_pct")?;
    validate_performance(config)?;
    parse_key::<ExitMode>(config, "backtest", "exit_mode")?;
    parse_key::<StrategySelection>(config, "backtest", "strategy")?;
    validate_dates(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), HedgeError> {
    for key in PERIOD_KEYS {
        if let Some(0) = parse_key::<usize>(config, "strategy", key)? {
            return Err(invalid("strategy", key, "period must be positive"));
        }
    }
    if let Some(v) = parse_key::<f64>(config, "strategy", "mean_reversion_dev_factor")? {
        if !(v > 0.0) {
            return Err(invalid(
                "strategy",
                "mean_reversion_dev_factor",
                "must be positive",
            ));
        }
    }
    let lower = parse_key::<f64>(config, "strategy", "crsi_lower_threshold")?.unwrap_or(10.0);
    let upper = parse_key::<f64>(config, "strategy", "crsi_upper_threshold")?.unwrap_or(90.0);
    for (key, value) in [("crsi_lower_threshold", lower), ("crsi_upper_threshold", upper)] {
        if !(0.0..=100.0).contains(&value) {
            return Err(invalid("strategy", key, "must be within 0-100"));
        }
    }
    if lower >= upper {
        return Err(invalid(
            "strategy",
            "crsi_lower_threshold",
            "must be below crsi_upper_threshold",
        ));
    }
    parse_key::<VwapReset>(config, "strategy", "vwap_reset")?;
    Ok(())
}

pub fn validate_pairs_config(config: &dyn ConfigPort) -> Result<(), HedgeError> {
    validate_pair_list(config)?;
    validate_initial_capital(config, "pairs")?;
    let window = parse_key::<usize>(config, "pairs", "z_window")?.unwrap_or(20);
    if window < 2 {
        return Err(invalid("pairs", "z_window", "must be at least 2"));
    }
    let z_entry = parse_key::<f64>(config, "pairs", "z_entry")?.unwrap_or(2.5);
    let z_exit = parse_key::<f64>(config, "pairs", "z_exit")?.unwrap_or(1.0);
    if !(z_exit >= 0.0) {
        return Err(invalid("pairs", "z_exit", "must be non-negative"));
    }
    if !(z_entry > z_exit) {
        return Err(invalid("pairs", "z_entry", "must exceed z_exit"));
    }
    if let Some(v) = parse_key::<f64>(config, "pairs", "stop_loss")? {
        if !(v < 0.0) {
            return Err(invalid("pairs", "stop_loss", "must be negative"));
        }
    }
    if let Some(v) = parse_key::<f64>(config, "pairs", "take_profit")? {
        if !(v > 0.0) {
            return Err(invalid("pairs", "take_profit", "must be positive"));
        }
    }
    if let Some(v) = parse_key::<f64>(config, "pairs", "max_investment_pct")? {
        if !(v > 0.0 && v <= 1.0) {
            return Err(invalid("pairs", "max_investment_pct", "must be within (0, 1]"));
        }
    }
    validate_performance(config)?;
    Ok(())
}

fn validate_pair_list(config: &dyn ConfigPort) -> Result<(), HedgeError> {
    let pairs = config.get_list("pairs", "pairs");
    if pairs.is_empty() {
        return Err(HedgeError::ConfigMissing {
            section: "pairs".to_string(),
            key: "pairs".to_string(),
        });
    }
    for entry in &pairs {
        parse_pair(entry).map_err(|reason| invalid("pairs", "pairs", reason))?;
    }
    Ok(())
}

/// Split `LONG/SHORT` into upper-cased leg codes.
pub fn parse_pair(entry: &str) -> Result<(String, String), String> {
    let Some((long, short)) = entry.split_once('/') else {
        return Err(format!("'{entry}' is not LONG/SHORT"));
    };
    let long = long.trim().to_uppercase();
    let short = short.trim().to_uppercase();
    if long.is_empty() || short.is_empty() {
        return Err(format!("'{entry}' has an empty leg"));
    }
    if long == short {
        return Err(format!("'{entry}' pairs an instrument with itself"));
    }
    Ok((long, short))
}

pub fn validate_sweep_config(config: &dyn ConfigPort) -> Result<(), HedgeError> {
    for key in PERIOD_KEYS {
        for value in parse_list::<usize>(config, "sweep", key)? {
            if value == 0 {
                return Err(invalid("sweep", key, "periods must be positive"));
            }
        }
    }
    for key in REAL_KEYS {
        parse_list::<f64>(config, "sweep", key)?;
    }
    parse_key::<usize>(config, "sweep", "sample")?;
    parse_key::<u64>(config, "sweep", "seed")?;
    Ok(())
}

pub fn validate_screen_config(config: &dyn ConfigPort) -> Result<(), HedgeError> {
    let codes = config.get_list("screen", "codes");
    if codes.len() < 2 {
        return Err(invalid("screen", "codes", "need at least two codes"));
    }
    if let Some(v) = parse_key::<f64>(config, "screen", "threshold")? {
        if !(-1.0..=1.0).contains(&v) {
            return Err(invalid("screen", "threshold", "must be within [-1, 1]"));
        }
    }
    parse_key::<CorrelationBasis>(config, "screen", "basis")?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> HedgeError {
    HedgeError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

/// Parse an optional key. `Ok(None)` when absent.
pub fn parse_key<T>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<T>, HedgeError>
where
    T: FromStr,
    T::Err: Display,
{
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| invalid(section, key, format!("'{raw}': {e}"))),
    }
}

/// Parse every item of a comma-separated key. Empty when absent.
pub fn parse_list<T>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Vec<T>, HedgeError>
where
    T: FromStr,
    T::Err: Display,
{
    config
        .get_list(section, key)
        .iter()
        .map(|item| {
            item.parse::<T>()
                .map_err(|e| invalid(section, key, format!("'{item}': {e}")))
        })
        .collect()
}

fn validate_initial_capital(config: &dyn ConfigPort, section: &str) -> Result<(), HedgeError> {
    if let Some(value) = parse_key::<f64>(config, section, "initial_capital")? {
        if !(value > 0.0) || !value.is_finite() {
            return Err(invalid(
                section,
                "initial_capital",
                "initial_capital must be positive",
            ));
        }
    }
    Ok(())
}

fn validate_position_size(config: &dyn ConfigPort) -> Result<(), HedgeError> {
    if let Some(value) = parse_key::<f64>(config, "backtest", "position_size")? {
        if !(value > 0.0 && value <= 1.0) {
            return Err(invalid(
                "backtest",
                "position_size",
                "position_size must be within (0, 1]",
            ));
        }
    }
    Ok(())
}

fn validate_stop_loss(config: &dyn ConfigPort) -> Result<(), HedgeError> {
    if let Some(value) = parse_key::<f64>(config, "backtest", "stop_loss")? {
        if !(0.0..1.0).contains(&value) {
            return Err(invalid(
                "backtest",
                "stop_loss",
                "stop_loss must be within [0, 1)",
            ));
        }
    }
    Ok(())
}

fn validate_non_negative(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<(), HedgeError> {
    if let Some(value) = parse_key::<f64>(config, section, key)? {
        if !(value >= 0.0) || !value.is_finite() {
            return Err(invalid(section, key, format!("{key} must be non-negative")));
        }
    }
    Ok(())
}

fn validate_performance(config: &dyn ConfigPort) -> Result<(), HedgeError> {
    if let Some(value) = parse_key::<f64>(config, "backtest", "risk_free_rate")? {
        if !(0.0..1.0).contains(&value) {
            return Err(invalid(
                "backtest",
                "risk_free_rate",
                "risk_free_rate must be between 0 and 1",
            ));
        }
    }
    if let Some(value) = parse_key::<f64>(config, "backtest", "periods_per_year")? {
        if !(value > 0.0) || !value.is_finite() {
            return Err(invalid(
                "backtest",
                "periods_per_year",
                "periods_per_year must be positive",
            ));
        }
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), HedgeError> {
    let start = parse_date(config, "start_date")?;
    let end = parse_date(config, "end_date")?;
    if let (Some(start), Some(end)) = (start, end) {
        if start >= end {
            return Err(invalid(
                "backtest",
                "start_date",
                "start_date must be before end_date",
            ));
        }
    }
    Ok(())
}

pub fn parse_date(config: &dyn ConfigPort, key: &str) -> Result<Option<NaiveDate>, HedgeError> {
    match config.get_string("backtest", key) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                invalid(
                    "backtest",
                    key,
                    format!("invalid {key} format, expected YYYY-MM-DD"),
                )
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    fn invalid_key(result: Result<(), HedgeError>) -> String {
        match result {
            Err(HedgeError::ConfigInvalid { key, .. }) => key,
            other => panic!("expected ConfigInvalid, got {other:?}"),
        }
    }

    #[test]
    fn valid_backtest_config_passes() {
        let config = make_config(
            r#"
[backtest]
code = SPY
initial_capital = 100000
position_size = 0.5
stop_loss = 0.05
take_profit = 0.1
commission_pct = 0.1
risk_free_rate = 0.01
periods_per_year = 252
exit_mode = local
strategy = trend_following
start_date = 2020-01-01
end_date = 2024-01-01
"#,
        );
        assert!(validate_backtest_config(&config).is_ok());
    }

    #[test]
    fn empty_backtest_section_uses_defaults() {
        assert!(validate_backtest_config(&make_config("[backtest]\n")).is_ok());
    }

    #[test]
    fn initial_capital_zero_fails() {
        let config = make_config("[backtest]\ninitial_capital = 0\n");
        assert_eq!(invalid_key(validate_backtest_config(&config)), "initial_capital");
    }

    #[test]
    fn non_numeric_value_is_invalid_not_defaulted() {
        let config = make_config("[backtest]\ninitial_capital = lots\n");
        assert_eq!(invalid_key(validate_backtest_config(&config)), "initial_capital");
    }

    #[test]
    fn position_size_above_one_fails() {
        let config = make_config("[backtest]\nposition_size = 1.5\n");
        assert_eq!(invalid_key(validate_backtest_config(&config)), "position_size");
    }

    #[test]
    fn stop_loss_of_one_fails() {
        let config = make_config("[backtest]\nstop_loss = 1.0\n");
        assert_eq!(invalid_key(validate_backtest_config(&config)), "stop_loss");
    }

    #[test]
    fn commission_negative_fails() {
        let config = make_config("[backtest]\ncommission_pct = -0.1\n");
        assert_eq!(invalid_key(validate_backtest_config(&config)), "commission_pct");
    }

    #[test]
    fn risk_free_rate_out_of_range_fails() {
        let config = make_config("[backtest]\nrisk_free_rate = 1.0\n");
        assert_eq!(invalid_key(validate_backtest_config(&config)), "risk_free_rate");
    }

    #[test]
    fn unknown_exit_mode_fails() {
        let config = make_config("[backtest]\nexit_mode = sometimes\n");
        assert_eq!(invalid_key(validate_backtest_config(&config)), "exit_mode");
    }

    #[test]
    fn pairs_strategy_rejected_for_backtest() {
        let config = make_config("[backtest]\nstrategy = pairs_hedge\n");
        assert_eq!(invalid_key(validate_backtest_config(&config)), "strategy");
    }

    #[test]
    fn start_date_after_end_date_fails() {
        let config = make_config("[backtest]\nstart_date = 2024-01-01\nend_date = 2023-01-01\n");
        assert_eq!(invalid_key(validate_backtest_config(&config)), "start_date");
    }

    #[test]
    fn invalid_date_format_fails() {
        let config = make_config("[backtest]\nend_date = 01/02/2024\n");
        assert_eq!(invalid_key(validate_backtest_config(&config)), "end_date");
    }

    #[test]
    fn valid_strategy_config_passes() {
        let config = make_config(
            r#"
[strategy]
mean_reversion_period = 20
mean_reversion_dev_factor = 2.0
crsi_lower_threshold = 5
crsi_upper_threshold = 95
vwap_filter = true
vwap_reset = monthly
"#,
        );
        assert!(validate_strategy_config(&config).is_ok());
    }

    #[test]
    fn zero_period_fails() {
        let config = make_config("[strategy]\nbreakout_period = 0\n");
        assert_eq!(invalid_key(validate_strategy_config(&config)), "breakout_period");
    }

    #[test]
    fn crossed_thresholds_fail() {
        let config = make_config("[strategy]\ncrsi_lower_threshold = 80\ncrsi_upper_threshold = 20\n");
        assert_eq!(
            invalid_key(validate_strategy_config(&config)),
            "crsi_lower_threshold"
        );
    }

    #[test]
    fn unknown_vwap_reset_fails() {
        let config = make_config("[strategy]\nvwap_reset = hourly\n");
        assert_eq!(invalid_key(validate_strategy_config(&config)), "vwap_reset");
    }

    #[test]
    fn valid_pairs_config_passes() {
        let config = make_config(
            "[pairs]\npairs = AAA/BBB, ccc/ddd\nz_entry = 2.5\nz_exit = 1.0\nmax_investment_pct = 0.1\n",
        );
        assert!(validate_pairs_config(&config).is_ok());
    }

    #[test]
    fn missing_pairs_list_fails() {
        let config = make_config("[pairs]\nz_entry = 2.5\n");
        assert!(matches!(
            validate_pairs_config(&config),
            Err(HedgeError::ConfigMissing { .. })
        ));
    }

    #[test]
    fn malformed_pair_fails() {
        let config = make_config("[pairs]\npairs = AAA-BBB\n");
        assert_eq!(invalid_key(validate_pairs_config(&config)), "pairs");
        let config = make_config("[pairs]\npairs = AAA/aaa\n");
        assert_eq!(invalid_key(validate_pairs_config(&config)), "pairs");
    }

    #[test]
    fn entry_band_inside_exit_band_fails() {
        let config = make_config("[pairs]\npairs = A/B\nz_entry = 0.5\nz_exit = 1.0\n");
        assert_eq!(invalid_key(validate_pairs_config(&config)), "z_entry");
    }

    #[test]
    fn pair_investment_above_one_fails() {
        let config = make_config("[pairs]\npairs = A/B\nmax_investment_pct = 1.5\n");
        assert_eq!(
            invalid_key(validate_pairs_config(&config)),
            "max_investment_pct"
        );
        let config = make_config("[pairs]\npairs = A/B\nmax_investment_pct = 1.0\n");
        assert!(validate_pairs_config(&config).is_ok());
    }

    #[test]
    fn positive_pair_stop_fails() {
        let config = make_config("[pairs]\npairs = A/B\nstop_loss = 0.4\n");
        assert_eq!(invalid_key(validate_pairs_config(&config)), "stop_loss");
    }

    #[test]
    fn parse_pair_upper_cases_legs() {
        assert_eq!(parse_pair(" xom / cvx "), Ok(("XOM".into(), "CVX".into())));
        assert!(parse_pair("/CVX").is_err());
    }

    #[test]
    fn sweep_lists_must_parse() {
        let config = make_config("[sweep]\nbreakout_period = 10, 20, x\n");
        assert_eq!(invalid_key(validate_sweep_config(&config)), "breakout_period");
        let config = make_config("[sweep]\nbreakout_period = 10, 0\n");
        assert_eq!(invalid_key(validate_sweep_config(&config)), "breakout_period");
        let config = make_config(
            "[sweep]\nbreakout_period = 10, 20\nmean_reversion_dev_factor = 1.5, 2\nsample = 5\nseed = 7\n",
        );
        assert!(validate_sweep_config(&config).is_ok());
    }

    #[test]
    fn screen_needs_two_codes() {
        let config = make_config("[screen]\ncodes = SPY\n");
        assert_eq!(invalid_key(validate_screen_config(&config)), "codes");
    }

    #[test]
    fn screen_basis_and_threshold_checked() {
        let config = make_config("[screen]\ncodes = A, B\nbasis = hourly\n");
        assert_eq!(invalid_key(validate_screen_config(&config)), "basis");
        let config = make_config("[screen]\ncodes = A, B\nthreshold = -1.5\n");
        assert_eq!(invalid_key(validate_screen_config(&config)), "threshold");
        let config = make_config("[screen]\ncodes = A, B\nthreshold = -0.5\nbasis = ma50\n");
        assert!(validate_screen_config(&config).is_ok());
    }
}
