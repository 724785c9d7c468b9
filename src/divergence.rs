//! Price/indicator divergence detection over a sliding lookback window.

use error_stack::{Report, bail};
use rust_decimal::Decimal;

use crate::error::IndicatorError;
use crate::model::{Candle, DivergenceEvent, DivergenceKind};
use crate::window::{self, Extremum};

/// Scan for divergences between price extremes and an aligned indicator
/// series.
///
/// A window ending at index `i` is bullish when the bar at `i` sets the
/// window's lowest low (ties resolved to the earliest bar, so a tie
/// disqualifies) while the indicator at `i` is not the window minimum;
/// bearish symmetrically on highs and maxima. Windows containing any
/// undefined indicator value are skipped. The result is sparse: one
/// event per qualifying window end.
pub fn detect(
    candles: &[Candle],
    indicator: &[Option<Decimal>],
    lookback: usize,
) -> Result<Vec<DivergenceEvent>, Report<IndicatorError>> {
    if lookback == 0 {
        bail!(IndicatorError::InvalidPeriod {
            name: "lookback must be > 0".into(),
        });
    }
    if candles.is_empty() {
        bail!(IndicatorError::EmptyInput);
    }
    if indicator.len() != candles.len() {
        bail!(IndicatorError::LengthMismatch {
            expected: candles.len(),
            actual: indicator.len(),
        });
    }
    if candles.len() < lookback {
        return Ok(Vec::new());
    }

    let last = lookback - 1;
    let mut events = Vec::new();
    for end in last..candles.len() {
        let start = end + 1 - lookback;
        let window_values: Option<Vec<Decimal>> =
            indicator[start..=end].iter().copied().collect();
        let Some(values) = window_values else {
            continue;
        };

        let lows: Vec<Decimal> = candles[start..=end].iter().map(|c| c.low).collect();
        if window::extremum_index(&lows, Extremum::Min) == last
            && window::extremum_index(&values, Extremum::Min) != last
        {
            events.push(DivergenceEvent {
                kind: DivergenceKind::Bullish,
                index: end,
            });
        }

        let highs: Vec<Decimal> = candles[start..=end].iter().map(|c| c.high).collect();
        if window::extremum_index(&highs, Extremum::Max) == last
            && window::extremum_index(&values, Extremum::Max) != last
        {
            events.push(DivergenceEvent {
                kind: DivergenceKind::Bearish,
                index: end,
            });
        }
    }
    Ok(events)
}
