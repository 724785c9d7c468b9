use error_stack::{Report, bail};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::IndicatorError;
use crate::indicator::{Indicator, ensure_history};
use crate::model::{Candle, Series};
use crate::series::{left_pad, safe_div};

/// Relative Vigor Index: close-versus-open conviction normalized by the
/// bar range, both sides smoothed with the symmetric (1,2,2,1)/6 weighting
/// before the period sums are taken. A zero range sum reads 0.
pub struct Rvi {
    period: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RviOutput {
    pub rvi: Series,
    pub signal: Series,
}

impl RviOutput {
    /// All-or-nothing record view: defined only where both lines are.
    pub fn record(&self, index: usize) -> Option<(Decimal, Decimal)> {
        match (self.rvi[index], self.signal[index]) {
            (Some(r), Some(s)) => Some((r, s)),
            _ => None,
        }
    }
}

/// Symmetric four-bar weighted smoothing, `(x0 + 2x1 + 2x2 + x3) / 6`.
fn swma(values: &[Decimal]) -> Vec<Decimal> {
    values
        .windows(4)
        .map(|w| (w[0] + dec!(2) * w[1] + dec!(2) * w[2] + w[3]) / dec!(6))
        .collect()
}

impl Rvi {
    /// Standard period: 10.
    pub fn standard() -> Self {
        Self { period: 10 }
    }

    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        if period == 0 {
            bail!(IndicatorError::InvalidPeriod {
                name: "period must be > 0".into(),
            });
        }
        Ok(Self { period })
    }

    pub fn compute_full(&self, candles: &[Candle]) -> Result<RviOutput, Report<IndicatorError>> {
        ensure_history(candles, self.required_candles())?;
        let n = candles.len();

        let conviction: Vec<Decimal> = candles.iter().map(|c| c.close - c.open).collect();
        let range: Vec<Decimal> = candles.iter().map(|c| c.high - c.low).collect();

        let smoothed_conviction = swma(&conviction);
        let smoothed_range = swma(&range);

        let rvi_dense: Vec<Decimal> = smoothed_conviction
            .windows(self.period)
            .zip(smoothed_range.windows(self.period))
            .map(|(num_w, den_w)| {
                let num: Decimal = num_w.iter().copied().sum();
                let den: Decimal = den_w.iter().copied().sum();
                safe_div(num, den, Decimal::ZERO)
            })
            .collect();

        let signal_dense = swma(&rvi_dense);

        Ok(RviOutput {
            rvi: left_pad(rvi_dense, n),
            signal: left_pad(signal_dense, n),
        })
    }
}

impl Indicator for Rvi {
    fn name(&self) -> &str {
        "rvi"
    }

    fn required_candles(&self) -> usize {
        // 3 bars of SWMA warm-up, the period sum, 3 more for the signal.
        self.period + 6
    }

    /// Returns the RVI line.
    fn compute(&self, candles: &[Candle]) -> Result<Series, Report<IndicatorError>> {
        Ok(self.compute_full(candles)?.rvi)
    }
}
