use error_stack::{Report, bail};
use rust_decimal::Decimal;

use crate::error::IndicatorError;
use crate::indicator::{Indicator, ensure_history};
use crate::model::{Candle, PriceField, Series};
use crate::series::extract;
use crate::window::{Extremum, extremum_index};

/// Williams fractals: a candle whose high (low) is the extreme of the
/// `2*wing + 1` bars centred on it.
///
/// Ties are resolved first-occurrence-wins, so a candle that merely equals
/// an earlier extreme in its window is not a fractal.
pub struct Fractals {
    wing: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FractalOutput {
    /// The high price at swing-high positions, `None` elsewhere.
    pub highs: Series,
    /// The low price at swing-low positions, `None` elsewhere.
    pub lows: Series,
}

impl Fractals {
    /// Standard two-bar wings (five-candle pattern).
    pub fn standard() -> Self {
        Self { wing: 2 }
    }

    pub fn new(wing: usize) -> Result<Self, Report<IndicatorError>> {
        if wing == 0 {
            bail!(IndicatorError::InvalidPeriod {
                name: "wing must be > 0".into(),
            });
        }
        Ok(Self { wing })
    }

    fn mark(&self, values: &[Decimal], kind: Extremum) -> Series {
        let n = values.len();
        let span = 2 * self.wing + 1;
        let mut out: Series = vec![None; n];
        for (start, w) in values.windows(span).enumerate() {
            if extremum_index(w, kind) == self.wing {
                let centre = start + self.wing;
                out[centre] = Some(values[centre]);
            }
        }
        out
    }

    pub fn compute_full(
        &self,
        candles: &[Candle],
    ) -> Result<FractalOutput, Report<IndicatorError>> {
        ensure_history(candles, self.required_candles())?;
        let highs = extract(candles, PriceField::High);
        let lows = extract(candles, PriceField::Low);
        Ok(FractalOutput {
            highs: self.mark(&highs, Extremum::Max),
            lows: self.mark(&lows, Extremum::Min),
        })
    }
}

impl Indicator for Fractals {
    fn name(&self) -> &str {
        "fractals"
    }

    fn required_candles(&self) -> usize {
        2 * self.wing + 1
    }

    /// Returns the swing-high series.
    fn compute(&self, candles: &[Candle]) -> Result<Series, Report<IndicatorError>> {
        Ok(self.compute_full(candles)?.highs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicator::testutil::candles_from_hlc;
    use rust_decimal_macros::dec;

    fn bars(highs: &[i64]) -> Vec<Candle> {
        candles_from_hlc(
            &highs
                .iter()
                .map(|&h| (Decimal::from(h), Decimal::from(h) - dec!(5), Decimal::from(h)))
                .collect::<Vec<_>>(),
        )
    }

    #[test]
    fn wing_zero_invalid() {
        assert!(Fractals::new(0).is_err());
    }

    #[test]
    fn insufficient_data() {
        let fractals = Fractals::standard();
        assert!(fractals.compute_full(&bars(&[10, 11, 12, 11])).is_err());
    }

    #[test]
    fn centre_peak_is_a_fractal() {
        let fractals = Fractals::standard();
        let out = fractals.compute_full(&bars(&[10, 11, 15, 11, 10])).unwrap();
        assert_eq!(out.highs, vec![None, None, Some(dec!(15)), None, None]);
        // Lows mirror the highs here (low = high - 5), so the centre is a
        // swing high but not a swing low.
        assert_eq!(out.lows, vec![None; 5]);
    }

    #[test]
    fn tie_with_earlier_bar_is_not_a_fractal() {
        let fractals = Fractals::standard();
        // The centre equals the first bar; first occurrence wins, so no
        // fractal is marked.
        let out = fractals.compute_full(&bars(&[15, 11, 15, 11, 10])).unwrap();
        assert_eq!(out.highs, vec![None; 5]);
    }

    #[test]
    fn swing_low_detected() {
        let fractals = Fractals::standard();
        let out = fractals.compute_full(&bars(&[15, 12, 8, 12, 15])).unwrap();
        assert_eq!(out.lows[2], Some(dec!(3)));
        assert_eq!(out.highs[2], None);
    }

    #[test]
    fn edges_are_never_fractals() {
        let fractals = Fractals::standard();
        let out = fractals
            .compute_full(&bars(&[10, 20, 10, 20, 10, 20, 10]))
            .unwrap();
        assert_eq!(out.highs.len(), 7);
        assert_eq!(out.highs[0], None);
        assert_eq!(out.highs[1], None);
        assert_eq!(out.highs[5], None);
        assert_eq!(out.highs[6], None);
    }
}
