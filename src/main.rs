use std::path::Path;

use clap::Parser;
use derive_more::{Display, Error};
use error_stack::{Report, ResultExt};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ta_engine::config::{self, AppConfig, JobConfig};
use ta_engine::divergence;
use ta_engine::error::{ConfigError, DataError};
use ta_engine::indicator::Indicator;
use ta_engine::indicator::donchian::Donchian;
use ta_engine::indicator::elder_ray::ElderRay;
use ta_engine::indicator::fractal::Fractals;
use ta_engine::indicator::gmma::Gmma;
use ta_engine::indicator::ichimoku::Ichimoku;
use ta_engine::indicator::klinger::Klinger;
use ta_engine::indicator::ma::{Ema, Hma, Sma, Vwma, Wma};
use ta_engine::indicator::macd::Macd;
use ta_engine::indicator::momentum::{Cci, Momentum, Roc, Tsi, UltimateOscillator};
use ta_engine::indicator::regression::LinearRegression;
use ta_engine::indicator::rsi::Rsi;
use ta_engine::indicator::rvi::Rvi;
use ta_engine::indicator::sar::ParabolicSar;
use ta_engine::indicator::stochastic::Stochastic;
use ta_engine::indicator::volume::{
    AdLine, ChaikinOscillator, Eom, ForceIndex, Obv, RelativeVolume, VolumeMa, VolumeRoc,
};
use ta_engine::model::{Candle, Signal, validate_candles};
use ta_engine::signal;

#[derive(Debug, Display, Error)]
pub enum AppError {
    #[display("configuration error")]
    Config,
    #[display("candle data error")]
    Data,
    #[display("runtime error")]
    Runtime,
}

#[derive(Parser)]
#[command(name = "ta-engine", about = "Technical indicator computation engine")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

fn main() {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Report<AppError>> {
    let cli = Cli::parse();
    let config = config::load(Path::new(&cli.config)).change_context(AppError::Config)?;

    init_tracing(&config);

    let candles = load_candles(Path::new(&config.candles.path)).change_context(AppError::Data)?;
    validate_candles(&candles).change_context(AppError::Data)?;
    info!(
        count = candles.len(),
        path = %config.candles.path,
        "candles loaded"
    );

    for job in &config.jobs {
        let indicator = build_indicator(job).change_context(AppError::Config)?;

        let series = match indicator.compute(&candles) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = ?e, job = %job.name, "indicator computation failed");
                continue;
            }
        };

        let defined = series.iter().filter(|v| v.is_some()).count();
        let last = series.iter().rev().find_map(|v| *v);
        info!(
            job = %job.name,
            indicator = indicator.name(),
            defined,
            last = ?last,
            as_of = %render_timestamp(candles.last().map(|c| c.timestamp)),
            "job computed"
        );

        if let Some(rule) = &job.signal {
            let signals = match rule.as_str() {
                "zero_line" => signal::zero_line(&series),
                "threshold_bounce" => {
                    let oversold = decimal_field(job, job.oversold, "oversold")?;
                    let overbought = decimal_field(job, job.overbought, "overbought")?;
                    signal::threshold_bounce(&series, oversold, overbought)
                        .change_context(AppError::Config)?
                }
                // Unreachable after config validation.
                other => {
                    tracing::warn!(job = %job.name, rule = other, "unknown signal rule");
                    continue;
                }
            };
            let buys = signals.iter().filter(|s| **s == Signal::Buy).count();
            let sells = signals.iter().filter(|s| **s == Signal::Sell).count();
            info!(job = %job.name, rule = %rule, buys, sells, "signals evaluated");
        }

        if let Some(lookback) = job.divergence_lookback {
            let events = divergence::detect(&candles, &series, lookback)
                .change_context(AppError::Runtime)?;
            for event in &events {
                tracing::debug!(
                    job = %job.name,
                    kind = %event.kind,
                    at = %render_timestamp(candles.get(event.index).map(|c| c.timestamp)),
                    "divergence"
                );
            }
            info!(job = %job.name, lookback, divergences = events.len(), "divergence scan done");
        }
    }

    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::new(&config.general.log_level);
    match config.general.log_format.as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .init();
        }
        _ => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }
}

/// Load a candle series from a JSON array file.
fn load_candles(path: &Path) -> Result<Vec<Candle>, Report<DataError>> {
    let content = std::fs::read_to_string(path)
        .change_context(DataError::ReadFile)
        .attach_with(|| format!("path: {}", path.display()))?;
    serde_json::from_str(&content).change_context(DataError::Parse)
}

fn render_timestamp(timestamp: Option<i64>) -> String {
    timestamp
        .and_then(|t| chrono::DateTime::from_timestamp(t, 0))
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "-".into())
}

fn param_usize(job: &JobConfig, key: &str, default: usize) -> Result<usize, Report<ConfigError>> {
    match job.params.get(key) {
        None => Ok(default),
        Some(toml::Value::Integer(v)) if *v > 0 => Ok(*v as usize),
        Some(_) => Err(Report::new(ConfigError::Validation {
            field: format!(
                "jobs[\"{}\"].params.{key} must be a positive integer",
                job.name
            ),
        })),
    }
}

fn param_decimal(
    job: &JobConfig,
    key: &str,
    default: Decimal,
) -> Result<Decimal, Report<ConfigError>> {
    let invalid = || {
        Report::new(ConfigError::Validation {
            field: format!("jobs[\"{}\"].params.{key} must be a number", job.name),
        })
    };
    match job.params.get(key) {
        None => Ok(default),
        Some(toml::Value::Integer(v)) => Ok(Decimal::from(*v)),
        Some(toml::Value::Float(v)) => Decimal::from_f64_retain(*v).ok_or_else(invalid),
        Some(_) => Err(invalid()),
    }
}

fn decimal_field(
    job: &JobConfig,
    value: Option<f64>,
    key: &str,
) -> Result<Decimal, Report<AppError>> {
    let value = value.ok_or_else(|| {
        Report::new(ConfigError::Validation {
            field: format!("jobs[\"{}\"].{key} is required", job.name),
        })
    });
    value
        .and_then(|v| {
            Decimal::from_f64_retain(v).ok_or_else(|| {
                Report::new(ConfigError::Validation {
                    field: format!("jobs[\"{}\"].{key} must be a finite number", job.name),
                })
            })
        })
        .change_context(AppError::Config)
}

/// Build the configured indicator; unknown names and bad parameters are
/// typed config errors, caught here even though `config::load` already
/// vets the indicator name.
fn build_indicator(job: &JobConfig) -> Result<Box<dyn Indicator>, Report<ConfigError>> {
    let bad_params = |e: Report<ta_engine::error::IndicatorError>| {
        e.change_context(ConfigError::Validation {
            field: format!("jobs[\"{}\"].params", job.name),
        })
    };
    let period = param_usize(job, "period", 14)?;

    let indicator: Box<dyn Indicator> = match job.indicator.as_str() {
        "sma" => Box::new(Sma::new(period).map_err(bad_params)?),
        "ema" => Box::new(Ema::new(period).map_err(bad_params)?),
        "wma" => Box::new(Wma::new(period).map_err(bad_params)?),
        "hma" => Box::new(Hma::new(param_usize(job, "period", 9)?).map_err(bad_params)?),
        "vwma" => Box::new(Vwma::new(param_usize(job, "period", 20)?).map_err(bad_params)?),
        "gmma" => Box::new(Gmma::new()),
        "macd" => {
            let fast = param_usize(job, "fast", 12)?;
            let slow = param_usize(job, "slow", 26)?;
            let signal = param_usize(job, "signal", 9)?;
            Box::new(Macd::new(fast, slow, signal).map_err(bad_params)?)
        }
        "ichimoku" => {
            let tenkan = param_usize(job, "tenkan", 9)?;
            let kijun = param_usize(job, "kijun", 26)?;
            let senkou_b = param_usize(job, "senkou_b", 52)?;
            let displacement = param_usize(job, "displacement", 26)?;
            Box::new(Ichimoku::new(tenkan, kijun, senkou_b, displacement).map_err(bad_params)?)
        }
        "parabolic_sar" => {
            let step = param_decimal(job, "step", dec!(0.02))?;
            let max_af = param_decimal(job, "max_af", dec!(0.2))?;
            Box::new(ParabolicSar::new(step, max_af).map_err(bad_params)?)
        }
        "donchian" => Box::new(Donchian::new(param_usize(job, "period", 20)?).map_err(bad_params)?),
        "fractals" => Box::new(Fractals::new(param_usize(job, "wing", 2)?).map_err(bad_params)?),
        "linear_regression" => Box::new(LinearRegression::new(period).map_err(bad_params)?),
        "rsi" => Box::new(Rsi::new(period).map_err(bad_params)?),
        "stochastic" => {
            let k = param_usize(job, "k", 14)?;
            let d = param_usize(job, "d", 3)?;
            let smooth_k = param_usize(job, "smooth_k", 1)?;
            Box::new(Stochastic::new(k, d, smooth_k).map_err(bad_params)?)
        }
        "momentum" => Box::new(Momentum::new(param_usize(job, "period", 10)?).map_err(bad_params)?),
        "roc" => Box::new(Roc::new(param_usize(job, "period", 12)?).map_err(bad_params)?),
        "cci" => Box::new(Cci::new(param_usize(job, "period", 20)?).map_err(bad_params)?),
        "tsi" => {
            let long = param_usize(job, "long", 25)?;
            let short = param_usize(job, "short", 13)?;
            let signal = param_usize(job, "signal", 13)?;
            Box::new(Tsi::new(long, short, signal).map_err(bad_params)?)
        }
        "ultimate_oscillator" => {
            let short = param_usize(job, "short", 7)?;
            let medium = param_usize(job, "medium", 14)?;
            let long = param_usize(job, "long", 28)?;
            Box::new(UltimateOscillator::new(short, medium, long).map_err(bad_params)?)
        }
        "rvi" => Box::new(Rvi::new(param_usize(job, "period", 10)?).map_err(bad_params)?),
        "elder_ray" => Box::new(ElderRay::new(param_usize(job, "period", 13)?).map_err(bad_params)?),
        "klinger" => {
            let fast = param_usize(job, "fast", 34)?;
            let slow = param_usize(job, "slow", 55)?;
            let signal = param_usize(job, "signal", 13)?;
            Box::new(Klinger::new(fast, slow, signal).map_err(bad_params)?)
        }
        "obv" => Box::new(Obv),
        "ad_line" => Box::new(AdLine),
        "chaikin" => {
            let fast = param_usize(job, "fast", 3)?;
            let slow = param_usize(job, "slow", 10)?;
            Box::new(ChaikinOscillator::new(fast, slow).map_err(bad_params)?)
        }
        "force_index" => {
            Box::new(ForceIndex::new(param_usize(job, "period", 13)?).map_err(bad_params)?)
        }
        "eom" => Box::new(Eom::new(period).map_err(bad_params)?),
        "volume_ma" => Box::new(VolumeMa::new(param_usize(job, "period", 20)?).map_err(bad_params)?),
        "volume_roc" => {
            Box::new(VolumeRoc::new(param_usize(job, "period", 12)?).map_err(bad_params)?)
        }
        "relative_volume" => {
            Box::new(RelativeVolume::new(param_usize(job, "period", 20)?).map_err(bad_params)?)
        }
        other => {
            return Err(Report::new(ConfigError::Validation {
                field: format!(
                    "jobs[\"{}\"].indicator \"{other}\" is not a known indicator",
                    job.name
                ),
            }));
        }
    };
    Ok(indicator)
}
