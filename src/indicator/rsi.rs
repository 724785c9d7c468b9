use error_stack::{Report, bail};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::IndicatorError;
use crate::indicator::{Indicator, ensure_history};
use crate::model::{Candle, PriceField, Series};
use crate::series::{extract, left_pad};

/// RSI (Relative Strength Index) using Wilder's smoothing method.
pub struct Rsi {
    period: usize,
}

impl Rsi {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        if period == 0 {
            bail!(IndicatorError::InvalidPeriod {
                name: "period must be > 0".into(),
            });
        }
        Ok(Self { period })
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        "rsi"
    }

    fn required_candles(&self) -> usize {
        self.period + 1
    }

    fn compute(&self, candles: &[Candle]) -> Result<Series, Report<IndicatorError>> {
        ensure_history(candles, self.required_candles())?;
        let prices = extract(candles, PriceField::Close);
        let period = Decimal::from(self.period);

        let deltas: Vec<Decimal> = prices.windows(2).map(|w| w[1] - w[0]).collect();

        // Seed with the simple average of the first `period` gains/losses;
        // losses are kept as positive magnitudes.
        let mut avg_gain: Decimal = deltas[..self.period]
            .iter()
            .map(|&d| d.max(Decimal::ZERO))
            .sum::<Decimal>()
            / period;
        let mut avg_loss: Decimal = deltas[..self.period]
            .iter()
            .map(|&d| (-d).max(Decimal::ZERO))
            .sum::<Decimal>()
            / period;

        let mut values = vec![rsi_value(avg_gain, avg_loss)];

        // Wilder smoothing for subsequent values.
        for &delta in &deltas[self.period..] {
            let gain = delta.max(Decimal::ZERO);
            let loss = (-delta).max(Decimal::ZERO);
            avg_gain = (avg_gain * (period - dec!(1)) + gain) / period;
            avg_loss = (avg_loss * (period - dec!(1)) + loss) / period;
            values.push(rsi_value(avg_gain, avg_loss));
        }

        Ok(left_pad(values, candles.len()))
    }
}

/// `avg_loss == 0` reads 100 exactly — a fixed domain sentinel for an
/// all-gain window, never a fault.
fn rsi_value(avg_gain: Decimal, avg_loss: Decimal) -> Decimal {
    if avg_loss == Decimal::ZERO {
        return dec!(100);
    }
    let rs = avg_gain / avg_loss;
    dec!(100) - dec!(100) / (dec!(1) + rs)
}
