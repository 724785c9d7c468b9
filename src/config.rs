use std::path::Path;

use error_stack::{Report, ResultExt};
use serde::Deserialize;

use crate::error::ConfigError;

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "text".into()
}

fn default_candles_path() -> String {
    "./candles.json".into()
}

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub general: GeneralConfig,
    #[serde(default)]
    pub candles: CandlesConfig,
    #[serde(default)]
    pub jobs: Vec<JobConfig>,
}

#[derive(Debug, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Accepted values: `"text"` | `"json"`
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

#[derive(Debug, Deserialize)]
pub struct CandlesConfig {
    #[serde(default = "default_candles_path")]
    pub path: String,
}

impl Default for CandlesConfig {
    fn default() -> Self {
        Self {
            path: default_candles_path(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct JobConfig {
    pub name: String,
    pub indicator: String,
    #[serde(default)]
    pub params: toml::Table,
    /// Optional signal rule evaluated over the indicator output.
    pub signal: Option<String>,
    pub oversold: Option<f64>,
    pub overbought: Option<f64>,
    /// Optional divergence scan window, in candles.
    pub divergence_lookback: Option<usize>,
}

/// Load and validate an `AppConfig` from a TOML file at `path`.
pub fn load(path: &Path) -> Result<AppConfig, Report<ConfigError>> {
    let content = std::fs::read_to_string(path)
        .change_context(ConfigError::ReadFile)
        .attach_with(|| format!("path: {}", path.display()))?;

    let config: AppConfig = toml::from_str(&content).change_context(ConfigError::Parse {
        reason: "invalid TOML syntax or schema mismatch".into(),
    })?;

    validate(&config)?;

    Ok(config)
}

pub const KNOWN_INDICATORS: &[&str] = &[
    "sma",
    "ema",
    "wma",
    "hma",
    "vwma",
    "gmma",
    "macd",
    "ichimoku",
    "parabolic_sar",
    "donchian",
    "fractals",
    "linear_regression",
    "rsi",
    "stochastic",
    "momentum",
    "roc",
    "cci",
    "tsi",
    "ultimate_oscillator",
    "rvi",
    "elder_ray",
    "klinger",
    "obv",
    "ad_line",
    "chaikin",
    "force_index",
    "eom",
    "volume_ma",
    "volume_roc",
    "relative_volume",
];

const VALID_SIGNALS: &[&str] = &["zero_line", "threshold_bounce"];

fn validate(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    validate_candles_path(config)?;
    validate_job_indicators(config)?;
    validate_job_names_unique(config)?;
    validate_job_signals(config)?;
    Ok(())
}

fn validate_candles_path(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    if config.candles.path.is_empty() {
        return Err(Report::new(ConfigError::Validation {
            field: "candles.path must not be empty".into(),
        }));
    }
    Ok(())
}

fn validate_job_indicators(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    for job in &config.jobs {
        if !KNOWN_INDICATORS.contains(&job.indicator.as_str()) {
            return Err(Report::new(ConfigError::Validation {
                field: format!(
                    "jobs[\"{}\"].indicator \"{}\" is not a known indicator",
                    job.name, job.indicator
                ),
            }));
        }
    }
    Ok(())
}

fn validate_job_names_unique(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    let mut seen = std::collections::HashSet::new();
    for job in &config.jobs {
        if !seen.insert(job.name.as_str()) {
            return Err(Report::new(ConfigError::Validation {
                field: format!("jobs: duplicate name \"{}\"", job.name),
            }));
        }
    }
    Ok(())
}

fn validate_job_signals(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    for job in &config.jobs {
        let Some(signal) = &job.signal else {
            continue;
        };

        if !VALID_SIGNALS.contains(&signal.as_str()) {
            return Err(Report::new(ConfigError::Validation {
                field: format!(
                    "jobs[\"{}\"].signal \"{}\" is not valid",
                    job.name, signal
                ),
            }));
        }

        if signal == "threshold_bounce" && (job.oversold.is_none() || job.overbought.is_none()) {
            return Err(Report::new(ConfigError::Validation {
                field: format!(
                    "jobs[\"{}\"]: oversold and overbought are required for \"threshold_bounce\"",
                    job.name
                ),
            }));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml: &str) -> AppConfig {
        toml::from_str(toml).expect("parse failed")
    }

    #[test]
    fn valid_full_config_parses() {
        let toml = r#"
[general]
log_level = "debug"
log_format = "json"

[candles]
path = "/tmp/candles.json"

[[jobs]]
name = "BTC RSI bounce"
indicator = "rsi"
params = { period = 14 }
signal = "threshold_bounce"
oversold = 30.0
overbought = 70.0
divergence_lookback = 14

[[jobs]]
name = "MACD zero line"
indicator = "macd"
signal = "zero_line"
"#;
        let config = parse(toml);
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.candles.path, "/tmp/candles.json");
        assert_eq!(config.jobs.len(), 2);
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn defaults_applied_when_fields_omitted() {
        let toml = r#"
[general]
"#;
        let config = parse(toml);
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.log_format, "text");
        assert_eq!(config.candles.path, "./candles.json");
        assert!(config.jobs.is_empty());
    }

    #[test]
    fn unknown_indicator_rejected() {
        let toml = r#"
[general]

[[jobs]]
name = "bogus"
indicator = "vortex"
"#;
        let config = parse(toml);
        assert!(validate(&config).is_err());
    }

    #[test]
    fn duplicate_job_names_rejected() {
        let toml = r#"
[general]

[[jobs]]
name = "dup"
indicator = "rsi"

[[jobs]]
name = "dup"
indicator = "sma"
"#;
        let config = parse(toml);
        assert!(validate(&config).is_err());
    }

    #[test]
    fn unknown_signal_rejected() {
        let toml = r#"
[general]

[[jobs]]
name = "bad signal"
indicator = "rsi"
signal = "crossunder"
"#;
        let config = parse(toml);
        assert!(validate(&config).is_err());
    }

    #[test]
    fn thresholds_required_for_bounce_signal() {
        let toml = r#"
[general]

[[jobs]]
name = "missing band"
indicator = "rsi"
signal = "threshold_bounce"
oversold = 30.0
"#;
        let config = parse(toml);
        assert!(validate(&config).is_err());
    }
}
