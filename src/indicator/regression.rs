use error_stack::{Report, bail};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::IndicatorError;
use crate::indicator::{Indicator, ensure_history};
use crate::model::{Candle, PriceField, Series};
use crate::series::{extract, left_pad_sparse, safe_div};

/// Per-window least-squares fit of the close price against bar index.
///
/// For each full window the fitted line's value at the window end, its
/// slope, a channel offset by the largest absolute residual, and the
/// coefficient of determination are emitted.
pub struct LinearRegression {
    period: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinRegOutput {
    pub line: Series,
    pub slope: Series,
    pub upper: Series,
    pub lower: Series,
    pub r_squared: Series,
}

impl LinRegOutput {
    /// All-or-nothing record view: defined only where every component is.
    pub fn record(&self, index: usize) -> Option<[Decimal; 5]> {
        match (
            self.line[index],
            self.slope[index],
            self.upper[index],
            self.lower[index],
            self.r_squared[index],
        ) {
            (Some(l), Some(s), Some(u), Some(d), Some(r)) => Some([l, s, u, d, r]),
            _ => None,
        }
    }
}

struct WindowFit {
    line: Decimal,
    slope: Decimal,
    upper: Decimal,
    lower: Decimal,
    r_squared: Decimal,
}

impl LinearRegression {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        if period < 2 {
            bail!(IndicatorError::InvalidPeriod {
                name: "period must be >= 2".into(),
            });
        }
        Ok(Self { period })
    }

    fn fit(window: &[Decimal]) -> WindowFit {
        let p = window.len();
        let n = Decimal::from(p);
        // x is the bar index 0..p; its sums are closed-form.
        let sx = Decimal::from(p * (p - 1) / 2);
        let sxx = Decimal::from((p - 1) * p * (2 * p - 1) / 6);

        let mut sy = Decimal::ZERO;
        let mut sxy = Decimal::ZERO;
        let mut syy = Decimal::ZERO;
        for (i, &y) in window.iter().enumerate() {
            sy += y;
            sxy += Decimal::from(i) * y;
            syy += y * y;
        }

        let denom_x = n * sxx - sx * sx;
        let cov = n * sxy - sx * sy;
        let slope = cov / denom_x;
        let intercept = (sy - slope * sx) / n;
        let line = intercept + slope * Decimal::from(p - 1);

        let max_residual = window
            .iter()
            .enumerate()
            .map(|(i, &y)| (y - (intercept + slope * Decimal::from(i))).abs())
            .max()
            .unwrap_or(Decimal::ZERO);

        // A flat window fits its own mean perfectly.
        let denom_y = n * syy - sy * sy;
        let r_squared = safe_div(cov * cov, denom_x * denom_y, dec!(1));

        WindowFit {
            line,
            slope,
            upper: line + max_residual,
            lower: line - max_residual,
            r_squared,
        }
    }

    pub fn compute_full(
        &self,
        candles: &[Candle],
    ) -> Result<LinRegOutput, Report<IndicatorError>> {
        ensure_history(candles, self.required_candles())?;
        let n = candles.len();
        let closes = extract(candles, PriceField::Close);

        let fits: Vec<WindowFit> = closes.windows(self.period).map(Self::fit).collect();

        let collect = |f: fn(&WindowFit) -> Decimal| -> Series {
            left_pad_sparse(fits.iter().map(|w| Some(f(w))).collect(), n)
        };

        Ok(LinRegOutput {
            line: collect(|w| w.line),
            slope: collect(|w| w.slope),
            upper: collect(|w| w.upper),
            lower: collect(|w| w.lower),
            r_squared: collect(|w| w.r_squared),
        })
    }
}

impl Indicator for LinearRegression {
    fn name(&self) -> &str {
        "linear_regression"
    }

    fn required_candles(&self) -> usize {
        self.period
    }

    /// Returns the fitted line value at each window end.
    fn compute(&self, candles: &[Candle]) -> Result<Series, Report<IndicatorError>> {
        Ok(self.compute_full(candles)?.line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicator::testutil::candles_from_closes;

    #[test]
    fn period_one_invalid() {
        assert!(LinearRegression::new(1).is_err());
    }

    #[test]
    fn perfect_line_recovered() {
        // closes 2, 4, 6, 8: slope 2, line endpoint equals the last close.
        let reg = LinearRegression::new(4).unwrap();
        let candles =
            candles_from_closes(&[dec!(2), dec!(4), dec!(6), dec!(8)]);
        let out = reg.compute_full(&candles).unwrap();
        let [line, slope, upper, lower, r2] = out.record(3).unwrap();
        assert_eq!(slope, dec!(2));
        assert_eq!(line, dec!(8));
        assert_eq!(upper, dec!(8));
        assert_eq!(lower, dec!(8));
        assert_eq!(r2, dec!(1));
    }

    #[test]
    fn flat_window_r_squared_is_one() {
        let reg = LinearRegression::new(5).unwrap();
        let candles = candles_from_closes(&[dec!(3); 8]);
        let out = reg.compute_full(&candles).unwrap();
        for i in 4..8 {
            let [line, slope, _, _, r2] = out.record(i).unwrap();
            assert_eq!(line, dec!(3));
            assert_eq!(slope, Decimal::ZERO);
            assert_eq!(r2, dec!(1));
        }
    }

    #[test]
    fn channel_contains_all_residuals() {
        let reg = LinearRegression::new(4).unwrap();
        let candles =
            candles_from_closes(&[dec!(2), dec!(5), dec!(4), dec!(9)]);
        let out = reg.compute_full(&candles).unwrap();
        let [line, _, upper, lower, _] = out.record(3).unwrap();
        assert!(upper > line);
        assert!(lower < line);
        assert_eq!(upper - line, line - lower);
    }

    #[test]
    fn alignment_and_warm_up() {
        let reg = LinearRegression::new(6).unwrap();
        let closes: Vec<Decimal> = (1..=15).map(Decimal::from).collect();
        let out = reg.compute_full(&candles_from_closes(&closes)).unwrap();
        for series in [&out.line, &out.slope, &out.upper, &out.lower, &out.r_squared] {
            assert_eq!(series.len(), 15);
            assert_eq!(series.iter().filter(|v| v.is_none()).count(), 5);
        }
    }

    #[test]
    fn noisy_fit_r_squared_below_one() {
        let reg = LinearRegression::new(5).unwrap();
        let candles = candles_from_closes(&[
            dec!(1),
            dec!(9),
            dec!(2),
            dec!(8),
            dec!(3),
        ]);
        let out = reg.compute_full(&candles).unwrap();
        let [_, _, _, _, r2] = out.record(4).unwrap();
        assert!(r2 < dec!(1));
        assert!(r2 >= Decimal::ZERO);
    }
}
