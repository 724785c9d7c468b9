pub mod donchian;
pub mod elder_ray;
pub mod fractal;
pub mod gmma;
pub mod ichimoku;
pub mod klinger;
pub mod levels;
pub mod ma;
pub mod macd;
pub mod momentum;
pub mod regression;
pub mod rsi;
pub mod rvi;
pub mod sar;
pub mod stochastic;
pub mod volume;

use error_stack::{Report, bail};

use crate::error::IndicatorError;
use crate::model::{Candle, Series};

/// A technical analysis indicator that operates on a slice of candles.
///
/// Candles must be in ascending chronological order (oldest first).
/// Implementations are pure: the same input always produces the same
/// output, and nothing is shared between calls.
pub trait Indicator: Send {
    /// Unique name of this indicator (e.g., "rsi", "sma").
    fn name(&self) -> &str;

    /// Minimum number of candles required to produce at least one defined
    /// output value.
    fn required_candles(&self) -> usize;

    /// Calculate the indicator's primary line from candles.
    ///
    /// The output always has exactly one entry per input candle; warm-up
    /// positions are `None`. Composite indicators expose their full set of
    /// named series through an inherent method alongside this.
    fn compute(&self, candles: &[Candle]) -> Result<Series, Report<IndicatorError>>;
}

/// Shared input check: non-empty and long enough for `required` candles.
pub(crate) fn ensure_history(
    candles: &[Candle],
    required: usize,
) -> Result<(), Report<IndicatorError>> {
    if candles.is_empty() {
        bail!(IndicatorError::EmptyInput);
    }
    if candles.len() < required {
        bail!(IndicatorError::InsufficientData {
            required,
            available: candles.len(),
        });
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use testutil::candles_from_closes;

    #[test]
    fn ensure_history_empty_input() {
        assert!(ensure_history(&[], 1).is_err());
    }

    #[test]
    fn ensure_history_insufficient() {
        let candles = candles_from_closes(&[dec!(1), dec!(2)]);
        assert!(ensure_history(&candles, 3).is_err());
        assert!(ensure_history(&candles, 2).is_ok());
    }
}
