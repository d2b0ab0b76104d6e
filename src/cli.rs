//! CLI definition and dispatch.
//!
//! Each command loads and validates its config, builds engine inputs through
//! the `build_*` helpers, then hands a [`DataPort`] to a `*_pipeline`
//! function so the orchestration can be driven without files.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;
use tracing::{info, warn};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::allocator::{PairSeries, PairsConfig, PairsResult, run_pairs};
use crate::domain::backtest::{BacktestConfig, BacktestResult, StrategySelection, run_backtest};
use crate::domain::config_validation::{
    parse_date, parse_key, parse_list, parse_pair, validate_backtest_config,
    validate_pairs_config, validate_screen_config, validate_strategy_config,
    validate_sweep_config,
};
use crate::domain::correlation::{CorrelatedPair, CorrelationBasis, CorrelationMatrix};
use crate::domain::error::HedgeError;
use crate::domain::metrics::PerformanceConfig;
use crate::domain::ohlcv::{OhlcvBar, align_on_common_dates};
use crate::domain::pairs::PairParams;
use crate::domain::risk::{ExitMode, RiskLimits};
use crate::domain::strategy::StrategyParams;
use crate::domain::sweep::{ParamGrid, SweepReport, run_sweep};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_SCREEN_THRESHOLD: f64 = -0.5;

#[derive(Parser, Debug)]
#[command(
    name = "hedgetrader",
    about = "Indicator, signal and portfolio backtester for single instruments and pairs"
)]
pub struct Cli {
    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a single-instrument backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        code: Option<String>,
        /// combined, mean_reversion, trend_following or breakout
        #[arg(short, long)]
        strategy: Option<String>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Directory for CSV reports
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run the z-score hedge over the configured pairs
    Pairs {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Grid-search strategy parameters on one instrument
    Sweep {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Evaluate a random subset of this many combinations
        #[arg(long)]
        sample: Option<usize>,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// List negatively correlated instrument pairs
    Screen {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// daily, weekly, monthly or maN
        #[arg(long)]
        basis: Option<String>,
        #[arg(long, allow_negative_numbers = true)]
        threshold: Option<f64>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List instruments available in the data directory
    ListSymbols {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Backtest {
            config,
            code,
            strategy,
            data_dir,
            output,
        } => run_backtest_command(
            &config,
            code.as_deref(),
            strategy.as_deref(),
            data_dir,
            output,
        ),
        Command::Pairs {
            config,
            data_dir,
            output,
        } => run_pairs_command(&config, data_dir, output),
        Command::Sweep {
            config,
            code,
            data_dir,
            output,
            sample,
            seed,
        } => run_sweep_command(&config, code.as_deref(), data_dir, output, sample, seed),
        Command::Screen {
            config,
            data_dir,
            output,
            basis,
            threshold,
        } => run_screen_command(&config, data_dir, output, basis.as_deref(), threshold),
        Command::Validate { config } => run_validate(&config),
        Command::ListSymbols { config, data_dir } => {
            run_list_symbols(config.as_deref(), data_dir)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, HedgeError> {
    info!(path = %path.display(), "loading config");
    FileConfigAdapter::from_file(path)
}

fn key_or<T>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: T,
) -> Result<T, HedgeError>
where
    T: FromStr,
    T::Err: Display,
{
    Ok(parse_key(config, section, key)?.unwrap_or(default))
}

pub fn build_strategy_params(config: &dyn ConfigPort) -> Result<StrategyParams, HedgeError> {
    let d = StrategyParams::default();
    Ok(StrategyParams {
        mean_reversion_period: key_or(
            config,
            "strategy",
            "mean_reversion_period",
            d.mean_reversion_period,
        )?,
        mean_reversion_dev_factor: key_or(
            config,
            "strategy",
            "mean_reversion_dev_factor",
            d.mean_reversion_dev_factor,
        )?,
        crsi_rsi_period: key_or(config, "strategy", "crsi_rsi_period", d.crsi_rsi_period)?,
        crsi_streak_period: key_or(
            config,
            "strategy",
            "crsi_streak_period",
            d.crsi_streak_period,
        )?,
        crsi_rank_period: key_or(config, "strategy", "crsi_rank_period", d.crsi_rank_period)?,
        crsi_lower_threshold: key_or(
            config,
            "strategy",
            "crsi_lower_threshold",
            d.crsi_lower_threshold,
        )?,
        crsi_upper_threshold: key_or(
            config,
            "strategy",
            "crsi_upper_threshold",
            d.crsi_upper_threshold,
        )?,
        trend_following_period: key_or(
            config,
            "strategy",
            "trend_following_period",
            d.trend_following_period,
        )?,
        breakout_period: key_or(config, "strategy", "breakout_period", d.breakout_period)?,
        vwap_filter: config.get_bool("strategy", "vwap_filter", d.vwap_filter),
        vwap_reset: key_or(config, "strategy", "vwap_reset", d.vwap_reset)?,
        allow_shorting: config.get_bool("backtest", "allow_shorting", d.allow_shorting),
    })
}

pub fn build_performance_config(config: &dyn ConfigPort) -> Result<PerformanceConfig, HedgeError> {
    let d = PerformanceConfig::default();
    Ok(PerformanceConfig {
        risk_free_rate: key_or(config, "backtest", "risk_free_rate", d.risk_free_rate)?,
        periods_per_year: key_or(config, "backtest", "periods_per_year", d.periods_per_year)?,
    })
}

pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, HedgeError> {
    let d = BacktestConfig::default();
    let limits = RiskLimits {
        position_size: key_or(config, "backtest", "position_size", d.limits.position_size)?,
        stop_loss: key_or(config, "backtest", "stop_loss", d.limits.stop_loss)?,
        take_profit: key_or(config, "backtest", "take_profit", d.limits.take_profit)?,
        commission_pct: key_or(config, "backtest", "commission_pct", d.limits.commission_pct)?,
    };
    let selection = key_or::<StrategySelection>(config, "backtest", "strategy", d.selection)?;
    Ok(BacktestConfig {
        initial_capital: key_or(config, "backtest", "initial_capital", d.initial_capital)?,
        selection,
        exit_mode: parse_key::<ExitMode>(config, "backtest", "exit_mode")?
            .unwrap_or_else(|| selection.default_exit_mode()),
        limits,
        performance: build_performance_config(config)?,
    })
}

/// Replace the configured selection. Unless `[backtest] exit_mode` is set,
/// the exit policy follows the new selection.
pub fn apply_strategy_override(
    config: &dyn ConfigPort,
    bt_config: &mut BacktestConfig,
    raw: &str,
) -> Result<(), HedgeError> {
    bt_config.selection = raw
        .parse()
        .map_err(|reason: String| HedgeError::invalid_parameter("strategy", reason))?;
    if parse_key::<ExitMode>(config, "backtest", "exit_mode")?.is_none() {
        bt_config.exit_mode = bt_config.selection.default_exit_mode();
    }
    Ok(())
}

/// `[pairs] pairs` as (long, short) codes, in listed order.
pub fn build_pair_list(config: &dyn ConfigPort) -> Result<Vec<(String, String)>, HedgeError> {
    config
        .get_list("pairs", "pairs")
        .iter()
        .map(|entry| {
            parse_pair(entry).map_err(|reason| HedgeError::ConfigInvalid {
                section: "pairs".into(),
                key: "pairs".into(),
                reason,
            })
        })
        .collect()
}

pub fn build_pairs_config(config: &dyn ConfigPort) -> Result<PairsConfig, HedgeError> {
    let d = PairParams::default();
    let backtest_capital = key_or(
        config,
        "backtest",
        "initial_capital",
        PairsConfig::default().initial_capital,
    )?;
    Ok(PairsConfig {
        initial_capital: key_or(config, "pairs", "initial_capital", backtest_capital)?,
        params: PairParams {
            z_window: key_or(config, "pairs", "z_window", d.z_window)?,
            z_entry: key_or(config, "pairs", "z_entry", d.z_entry)?,
            z_exit: key_or(config, "pairs", "z_exit", d.z_exit)?,
            stop_loss: key_or(config, "pairs", "stop_loss", d.stop_loss)?,
            take_profit: key_or(config, "pairs", "take_profit", d.take_profit)?,
            max_investment_pct: key_or(
                config,
                "pairs",
                "max_investment_pct",
                d.max_investment_pct,
            )?,
        },
        performance: build_performance_config(config)?,
    })
}

fn candidates<T>(config: &dyn ConfigPort, key: &str, base: T) -> Result<Vec<T>, HedgeError>
where
    T: FromStr,
    T::Err: Display,
{
    let values = parse_list(config, "sweep", key)?;
    Ok(if values.is_empty() { vec![base] } else { values })
}

/// `[sweep]` candidate lists; a parameter without a list keeps `base`'s value.
pub fn build_param_grid(
    config: &dyn ConfigPort,
    base: &StrategyParams,
) -> Result<ParamGrid, HedgeError> {
    Ok(ParamGrid {
        mean_reversion_period: candidates(
            config,
            "mean_reversion_period",
            base.mean_reversion_period,
        )?,
        mean_reversion_dev_factor: candidates(
            config,
            "mean_reversion_dev_factor",
            base.mean_reversion_dev_factor,
        )?,
        crsi_rsi_period: candidates(config, "crsi_rsi_period", base.crsi_rsi_period)?,
        crsi_streak_period: candidates(config, "crsi_streak_period", base.crsi_streak_period)?,
        crsi_rank_period: candidates(config, "crsi_rank_period", base.crsi_rank_period)?,
        crsi_lower_threshold: candidates(
            config,
            "crsi_lower_threshold",
            base.crsi_lower_threshold,
        )?,
        crsi_upper_threshold: candidates(
            config,
            "crsi_upper_threshold",
            base.crsi_upper_threshold,
        )?,
        trend_following_period: candidates(
            config,
            "trend_following_period",
            base.trend_following_period,
        )?,
        breakout_period: candidates(config, "breakout_period", base.breakout_period)?,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScreenSettings {
    pub codes: Vec<String>,
    pub basis: CorrelationBasis,
    pub threshold: f64,
}

pub fn build_screen_settings(
    config: &dyn ConfigPort,
    basis_override: Option<&str>,
    threshold_override: Option<f64>,
) -> Result<ScreenSettings, HedgeError> {
    let basis = match basis_override {
        Some(raw) => raw
            .parse()
            .map_err(|reason: String| HedgeError::invalid_parameter("basis", reason))?,
        None => key_or(config, "screen", "basis", CorrelationBasis::DailyReturns)?,
    };
    let threshold = match threshold_override {
        Some(t) => t,
        None => key_or(config, "screen", "threshold", DEFAULT_SCREEN_THRESHOLD)?,
    };
    Ok(ScreenSettings {
        codes: config
            .get_list("screen", "codes")
            .iter()
            .map(|c| c.to_uppercase())
            .collect(),
        basis,
        threshold,
    })
}

pub fn resolve_code(
    code_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<String, HedgeError> {
    code_override
        .map(str::to_string)
        .or_else(|| config.get_string("backtest", "code"))
        .map(|c| c.trim().to_uppercase())
        .filter(|c| !c.is_empty())
        .ok_or_else(|| HedgeError::ConfigMissing {
            section: "backtest".into(),
            key: "code".into(),
        })
}

pub fn resolve_data_dir(data_dir: Option<PathBuf>, config: Option<&dyn ConfigPort>) -> PathBuf {
    data_dir
        .or_else(|| {
            config
                .and_then(|c| c.get_string("backtest", "data_dir"))
                .map(PathBuf::from)
        })
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

pub fn date_range(
    config: &dyn ConfigPort,
) -> Result<(Option<NaiveDate>, Option<NaiveDate>), HedgeError> {
    Ok((parse_date(config, "start_date")?, parse_date(config, "end_date")?))
}

fn fetch_nonempty(
    data: &dyn DataPort,
    code: &str,
    range: (Option<NaiveDate>, Option<NaiveDate>),
) -> Result<Vec<OhlcvBar>, HedgeError> {
    let bars = data.fetch_bars(code, range.0, range.1)?;
    if bars.is_empty() {
        return Err(HedgeError::InsufficientData {
            code: code.to_string(),
            bars: 0,
            minimum: 1,
        });
    }
    Ok(bars)
}

pub fn backtest_pipeline(
    config: &dyn ConfigPort,
    data: &dyn DataPort,
    reports: Option<&dyn ReportPort>,
    code_override: Option<&str>,
    strategy_override: Option<&str>,
) -> Result<BacktestResult, HedgeError> {
    validate_backtest_config(config)?;
    validate_strategy_config(config)?;
    let params = build_strategy_params(config)?;
    let mut bt_config = build_backtest_config(config)?;
    if let Some(raw) = strategy_override {
        apply_strategy_override(config, &mut bt_config, raw)?;
    }
    let code = resolve_code(code_override, config)?;
    let bars = fetch_nonempty(data, &code, date_range(config)?)?;

    let result = run_backtest(&bars, &params, &bt_config)?;

    if let Some(reports) = reports {
        reports.write_equity_curve(&code, &result.equity_curve)?;
        reports.write_events(&code, &result.events)?;
        reports.write_trades(&code, &result.trades)?;
        reports.write_metrics(&code, &result.metrics)?;
    }
    Ok(result)
}

/// Fetch every leg once, inner-join all of them on date and assemble the
/// pair series on that shared timeline.
pub fn pairs_pipeline(
    config: &dyn ConfigPort,
    data: &dyn DataPort,
    reports: Option<&dyn ReportPort>,
) -> Result<PairsResult, HedgeError> {
    validate_pairs_config(config)?;
    let pair_list = build_pair_list(config)?;
    let pairs_config = build_pairs_config(config)?;
    let range = date_range(config)?;

    let mut codes: Vec<String> = Vec::new();
    for (long, short) in &pair_list {
        for code in [long, short] {
            if !codes.contains(code) {
                codes.push(code.clone());
            }
        }
    }
    let raw: Vec<Vec<OhlcvBar>> = codes
        .iter()
        .map(|code| fetch_nonempty(data, code, range))
        .collect::<Result<_, _>>()?;
    let shortest = raw.iter().map(Vec::len).min().unwrap_or(0);
    let aligned = align_on_common_dates(&raw);
    let shared = aligned.first().map_or(0, Vec::len);
    if shared < shortest {
        warn!(shared, shortest, "legs do not share every date; trading the common dates only");
    }

    let leg = |code: &String| -> Vec<OhlcvBar> {
        codes
            .iter()
            .position(|c| c == code)
            .and_then(|i| aligned.get(i).cloned())
            .unwrap_or_default()
    };
    let series: Vec<PairSeries> = pair_list
        .iter()
        .map(|(long, short)| PairSeries {
            long: leg(long),
            short: leg(short),
        })
        .collect();

    let result = run_pairs(&series, &pairs_config)?;

    if let Some(reports) = reports {
        reports.write_equity_curve("pairs", &result.equity_curve)?;
        reports.write_events("pairs", &result.events)?;
        reports.write_trades("pairs", &result.trades)?;
        reports.write_metrics("pairs", &result.metrics)?;
    }
    Ok(result)
}

pub fn sweep_pipeline(
    config: &dyn ConfigPort,
    data: &dyn DataPort,
    reports: Option<&dyn ReportPort>,
    code_override: Option<&str>,
    sample_override: Option<usize>,
    seed_override: Option<u64>,
) -> Result<SweepReport, HedgeError> {
    validate_backtest_config(config)?;
    validate_strategy_config(config)?;
    validate_sweep_config(config)?;
    let base = build_strategy_params(config)?;
    let bt_config = build_backtest_config(config)?;
    let grid = build_param_grid(config, &base)?;
    let sample = match sample_override {
        Some(s) => s,
        None => key_or(config, "sweep", "sample", 0)?,
    };
    let seed = match seed_override {
        Some(s) => s,
        None => key_or(config, "sweep", "seed", 0)?,
    };
    let code = resolve_code(code_override, config)?;
    let bars = fetch_nonempty(data, &code, date_range(config)?)?;

    let report = run_sweep(&bars, &grid, &base, &bt_config, sample, seed)?;

    if let Some(reports) = reports {
        reports.write_sweep(&code, &report)?;
    }
    Ok(report)
}

pub fn screen_pipeline(
    config: &dyn ConfigPort,
    data: &dyn DataPort,
    reports: Option<&dyn ReportPort>,
    basis_override: Option<&str>,
    threshold_override: Option<f64>,
) -> Result<(ScreenSettings, Vec<CorrelatedPair>), HedgeError> {
    validate_screen_config(config)?;
    let settings = build_screen_settings(config, basis_override, threshold_override)?;
    let range = date_range(config)?;
    let series: Vec<Vec<OhlcvBar>> = settings
        .codes
        .iter()
        .map(|code| fetch_nonempty(data, code, range))
        .collect::<Result<_, _>>()?;

    let matrix = CorrelationMatrix::compute(&series, settings.basis)?;
    let pairs = matrix.negative_pairs(settings.threshold);
    info!(
        basis = %settings.basis,
        threshold = settings.threshold,
        found = pairs.len(),
        "screen complete"
    );

    if let Some(reports) = reports {
        reports.write_correlations(&format!("screen_{}", settings.basis), &pairs)?;
    }
    Ok((settings, pairs))
}

fn report_sink(output: Option<PathBuf>) -> Result<Option<CsvReportAdapter>, HedgeError> {
    output.map(CsvReportAdapter::new).transpose()
}

fn run_backtest_command(
    config_path: &Path,
    code: Option<&str>,
    strategy: Option<&str>,
    data_dir: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<(), HedgeError> {
    let config = load_config(config_path)?;
    let data = CsvAdapter::new(resolve_data_dir(data_dir, Some(&config)));
    let sink = report_sink(output)?;
    let result = backtest_pipeline(
        &config,
        &data,
        sink.as_ref().map(|s| s as &dyn ReportPort),
        code,
        strategy,
    )?;

    println!("=== {} ===", result.code);
    println!("{}", result.metrics);
    Ok(())
}

fn run_pairs_command(
    config_path: &Path,
    data_dir: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<(), HedgeError> {
    let config = load_config(config_path)?;
    let data = CsvAdapter::new(resolve_data_dir(data_dir, Some(&config)));
    let sink = report_sink(output)?;
    let result = pairs_pipeline(&config, &data, sink.as_ref().map(|s| s as &dyn ReportPort))?;

    println!("=== {} ===", result.pairs.join(", "));
    println!("{}", result.metrics);
    Ok(())
}

fn run_sweep_command(
    config_path: &Path,
    code: Option<&str>,
    data_dir: Option<PathBuf>,
    output: Option<PathBuf>,
    sample: Option<usize>,
    seed: Option<u64>,
) -> Result<(), HedgeError> {
    let config = load_config(config_path)?;
    let data = CsvAdapter::new(resolve_data_dir(data_dir, Some(&config)));
    let sink = report_sink(output)?;
    let report = sweep_pipeline(
        &config,
        &data,
        sink.as_ref().map(|s| s as &dyn ReportPort),
        code,
        sample,
        seed,
    )?;

    println!(
        "{} combinations, {} failed",
        report.rows.len(),
        report.failures()
    );
    match report.best_row() {
        Some(best) => {
            println!("Best combination #{}: {:?}", best.index, best.params);
            if let Ok(metrics) = &best.outcome {
                println!("{metrics}");
            }
        }
        None => println!("No combination produced a defined Sharpe ratio"),
    }
    Ok(())
}

fn run_screen_command(
    config_path: &Path,
    data_dir: Option<PathBuf>,
    output: Option<PathBuf>,
    basis: Option<&str>,
    threshold: Option<f64>,
) -> Result<(), HedgeError> {
    let config = load_config(config_path)?;
    let data = CsvAdapter::new(resolve_data_dir(data_dir, Some(&config)));
    let sink = report_sink(output)?;
    let (settings, pairs) = screen_pipeline(
        &config,
        &data,
        sink.as_ref().map(|s| s as &dyn ReportPort),
        basis,
        threshold,
    )?;

    if pairs.is_empty() {
        println!(
            "No pairs below {} on {} basis",
            settings.threshold, settings.basis
        );
    }
    for pair in &pairs {
        println!("{}/{}  {:.4}", pair.first, pair.second, pair.correlation);
    }
    Ok(())
}

/// Check every section the file carries; `[backtest]` and `[strategy]`
/// always, the others only when configured.
pub fn validate_all(config: &dyn ConfigPort) -> Result<Vec<&'static str>, HedgeError> {
    let mut checked = vec!["backtest", "strategy"];
    validate_backtest_config(config)?;
    validate_strategy_config(config)?;
    if config.get_string("pairs", "pairs").is_some() {
        validate_pairs_config(config)?;
        checked.push("pairs");
    }
    validate_sweep_config(config)?;
    checked.push("sweep");
    if config.get_string("screen", "codes").is_some() {
        validate_screen_config(config)?;
        checked.push("screen");
    }
    Ok(checked)
}

fn run_validate(config_path: &Path) -> Result<(), HedgeError> {
    let config = load_config(config_path)?;
    let checked = validate_all(&config)?;
    let params = build_strategy_params(&config)?;
    params.validate()?;
    build_backtest_config(&config)?.validate()?;
    println!("Checked sections: {}", checked.join(", "));
    println!("Strategy parameters: {:?}", params);
    println!("Configuration is valid.");
    Ok(())
}

fn run_list_symbols(
    config_path: Option<&Path>,
    data_dir: Option<PathBuf>,
) -> Result<(), HedgeError> {
    let config = config_path.map(load_config).transpose()?;
    let dir = resolve_data_dir(data_dir, config.as_ref().map(|c| c as &dyn ConfigPort));
    let symbols = CsvAdapter::new(dir.clone()).list_symbols()?;
    if symbols.is_empty() {
        warn!(dir = %dir.display(), "no symbols found");
    }
    for symbol in &symbols {
        println!("{symbol}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_backtest_flags() {
        let cli = Cli::try_parse_from([
            "hedgetrader",
            "backtest",
            "-c",
            "run.ini",
            "--code",
            "spy",
            "--strategy",
            "breakout",
        ])
        .unwrap();
        match cli.command {
            Command::Backtest { code, strategy, .. } => {
                assert_eq!(code.as_deref(), Some("spy"));
                assert_eq!(strategy.as_deref(), Some("breakout"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn cli_accepts_negative_threshold() {
        let cli = Cli::try_parse_from([
            "hedgetrader",
            "screen",
            "-c",
            "run.ini",
            "--threshold",
            "-0.7",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Command::Screen { threshold: Some(t), .. } if t == -0.7
        ));
    }

    #[test]
    fn verbose_is_global() {
        let cli = Cli::try_parse_from(["hedgetrader", "validate", "-c", "x.ini", "-v"]).unwrap();
        assert!(cli.verbose);
    }
}
