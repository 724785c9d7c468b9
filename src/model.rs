use std::fmt;

use error_stack::Report;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::IndicatorError;

/// One OHLCV price bar for a fixed time interval.
///
/// Candle sequences handed to the engine must be ordered by timestamp
/// ascending with no duplicates; see [`validate_candles`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Bar open time, unix seconds.
    pub timestamp: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

/// The OHLCV field an indicator reads from each candle.
///
/// String representations match the config file format (e.g. `"close"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PriceField {
    Open,
    High,
    Low,
    Close,
    Volume,
}

impl PriceField {
    /// Parse a config-format string into a `PriceField`.
    pub fn parse(s: &str) -> Result<Self, Report<IndicatorError>> {
        match s {
            "open" => Ok(Self::Open),
            "high" => Ok(Self::High),
            "low" => Ok(Self::Low),
            "close" => Ok(Self::Close),
            "volume" => Ok(Self::Volume),
            other => Err(Report::new(IndicatorError::InvalidField {
                name: other.to_string(),
            })),
        }
    }

    /// Return the config-format string representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::High => "high",
            Self::Low => "low",
            Self::Close => "close",
            Self::Volume => "volume",
        }
    }
}

impl fmt::Display for PriceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An indicator output series: one entry per input candle.
///
/// `None` marks warm-up positions where the computation has insufficient
/// history. Every indicator upholds `output.len() == input.len()`.
pub type Series = Vec<Option<Decimal>>;

/// Per-candle signal classification produced by the signal engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
            Self::Hold => write!(f, "hold"),
        }
    }
}

/// Direction of a detected price/indicator divergence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DivergenceKind {
    Bullish,
    Bearish,
}

impl fmt::Display for DivergenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bullish => write!(f, "bullish"),
            Self::Bearish => write!(f, "bearish"),
        }
    }
}

/// A single divergence occurrence, referencing a position in the original
/// candle sequence. Divergences are reported as a sparse list, not an
/// aligned series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DivergenceEvent {
    pub kind: DivergenceKind,
    pub index: usize,
}

/// Check the engine's input contract: a non-empty candle sequence with
/// strictly increasing timestamps.
pub fn validate_candles(candles: &[Candle]) -> Result<(), Report<IndicatorError>> {
    if candles.is_empty() {
        return Err(Report::new(IndicatorError::EmptyInput));
    }
    for (i, pair) in candles.windows(2).enumerate() {
        if pair[1].timestamp <= pair[0].timestamp {
            return Err(Report::new(IndicatorError::UnorderedCandles { index: i + 1 }));
        }
    }
    Ok(())
}
