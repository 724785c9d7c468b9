use derive_more::{Display, Error};

#[derive(Debug, Display, Error)]
pub enum ConfigError {
    #[display("failed to read config file")]
    ReadFile,
    #[display("failed to parse config: {reason}")]
    Parse { reason: String },
    #[display("invalid config: {field}")]
    Validation { field: String },
}

#[derive(Debug, Display, Error)]
pub enum DataError {
    #[display("failed to read candle file")]
    ReadFile,
    #[display("failed to parse candle file")]
    Parse,
}

/// Validation failures detected before an indicator computation begins.
///
/// Numeric edge cases (zero denominators) are not errors — every formula
/// substitutes a documented fallback value instead. Insufficient warm-up
/// history is not an error either; it is represented as `None` entries in
/// the output series.
#[derive(Debug, Display, Error)]
pub enum IndicatorError {
    #[display("empty candle input")]
    EmptyInput,
    #[display("candles out of order at index {index}")]
    UnorderedCandles { index: usize },
    #[display("length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    #[display("invalid period: {name}")]
    InvalidPeriod { name: String },
    #[display("insufficient data: need {required}, got {available}")]
    InsufficientData { required: usize, available: usize },
    #[display("invalid price field: {name}")]
    InvalidField { name: String },
}
