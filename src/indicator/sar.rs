use error_stack::{Report, bail};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::IndicatorError;
use crate::indicator::{Indicator, ensure_history};
use crate::model::{Candle, Series};

/// Parabolic Stop-and-Reverse.
///
/// The one genuinely stateful indicator in the library: a candle-by-candle
/// fold over [`SarState`]. Independent computations for different symbols
/// remain freely parallel; the recurrence itself is sequential.
pub struct ParabolicSar {
    step: Decimal,
    max_af: Decimal,
}

/// Accumulator carried across candles by the SAR recurrence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SarState {
    pub sar: Decimal,
    pub extreme: Decimal,
    pub acceleration: Decimal,
    pub rising: bool,
    prev_high: Decimal,
    prev_low: Decimal,
}

impl ParabolicSar {
    /// Standard parameters: step 0.02, cap 0.2.
    pub fn standard() -> Self {
        Self {
            step: dec!(0.02),
            max_af: dec!(0.2),
        }
    }

    pub fn new(step: Decimal, max_af: Decimal) -> Result<Self, Report<IndicatorError>> {
        if step <= Decimal::ZERO || max_af < step {
            bail!(IndicatorError::InvalidPeriod {
                name: "step must be > 0 and <= max acceleration".into(),
            });
        }
        Ok(Self { step, max_af })
    }

    /// Initial state derived from the first two candles: the second close
    /// decides the starting trend direction.
    fn seed(&self, first: &Candle, second: &Candle) -> SarState {
        let rising = second.close >= first.close;
        SarState {
            sar: if rising { first.low } else { first.high },
            extreme: if rising { first.high } else { first.low },
            acceleration: self.step,
            rising,
            prev_high: first.high,
            prev_low: first.low,
        }
    }

    /// One step of the recurrence: `(prev_state, next_candle)` to
    /// `(new_state, emitted_sar)`.
    pub fn step(&self, state: SarState, candle: &Candle) -> (SarState, Decimal) {
        let mut next = state.sar + state.acceleration * (state.extreme - state.sar);

        // A non-reversal SAR never penetrates the most recent bar's range.
        if state.rising {
            next = next.min(state.prev_low);
        } else {
            next = next.max(state.prev_high);
        }

        let reversed = if state.rising {
            candle.low < next
        } else {
            candle.high > next
        };

        let new_state = if reversed {
            // SAR resets to the prior extreme, the extreme point to the new
            // bar's own extreme, and acceleration back to the start value.
            SarState {
                sar: state.extreme,
                extreme: if state.rising { candle.low } else { candle.high },
                acceleration: self.step,
                rising: !state.rising,
                prev_high: candle.high,
                prev_low: candle.low,
            }
        } else {
            let (extreme, acceleration) = if state.rising && candle.high > state.extreme {
                (candle.high, (state.acceleration + self.step).min(self.max_af))
            } else if !state.rising && candle.low < state.extreme {
                (candle.low, (state.acceleration + self.step).min(self.max_af))
            } else {
                (state.extreme, state.acceleration)
            };
            SarState {
                sar: next,
                extreme,
                acceleration,
                rising: state.rising,
                prev_high: candle.high,
                prev_low: candle.low,
            }
        };

        (new_state, new_state.sar)
    }
}

impl Indicator for ParabolicSar {
    fn name(&self) -> &str {
        "parabolic_sar"
    }

    fn required_candles(&self) -> usize {
        2
    }

    fn compute(&self, candles: &[Candle]) -> Result<Series, Report<IndicatorError>> {
        ensure_history(candles, self.required_candles())?;

        let mut out: Series = Vec::with_capacity(candles.len());
        out.push(None);

        let mut state = self.seed(&candles[0], &candles[1]);
        for candle in &candles[1..] {
            let (next_state, sar) = self.step(state, candle);
            out.push(Some(sar));
            state = next_state;
        }
        Ok(out)
    }
}
