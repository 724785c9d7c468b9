use error_stack::{Report, bail};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::IndicatorError;
use crate::indicator::{Indicator, ensure_history};
use crate::model::{Candle, PriceField, Series, Signal};
use crate::series::{extract, left_pad, zip2};
use crate::window;

/// Donchian Channels: rolling extreme-price envelope.
pub struct Donchian {
    period: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DonchianOutput {
    pub upper: Series,
    pub lower: Series,
    pub middle: Series,
}

impl DonchianOutput {
    /// All-or-nothing record view: defined only where every component is.
    pub fn record(&self, index: usize) -> Option<(Decimal, Decimal, Decimal)> {
        match (self.upper[index], self.lower[index], self.middle[index]) {
            (Some(u), Some(l), Some(m)) => Some((u, l, m)),
            _ => None,
        }
    }
}

impl Donchian {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        if period == 0 {
            bail!(IndicatorError::InvalidPeriod {
                name: "period must be > 0".into(),
            });
        }
        Ok(Self { period })
    }

    pub fn compute_full(
        &self,
        candles: &[Candle],
    ) -> Result<DonchianOutput, Report<IndicatorError>> {
        ensure_history(candles, self.required_candles())?;
        let n = candles.len();
        let highs = extract(candles, PriceField::High);
        let lows = extract(candles, PriceField::Low);

        let upper = left_pad(window::rolling_max(&highs, self.period), n);
        let lower = left_pad(window::rolling_min(&lows, self.period), n);
        let middle = zip2(&upper, &lower, |u, l| (u + l) / dec!(2));

        Ok(DonchianOutput {
            upper,
            lower,
            middle,
        })
    }

    /// Breakout classification: the close is compared against the *prior*
    /// candle's channel bounds, so a bar that itself stretches the channel
    /// still registers as a breakout.
    pub fn breakout_signals(
        &self,
        candles: &[Candle],
    ) -> Result<Vec<Signal>, Report<IndicatorError>> {
        let channel = self.compute_full(candles)?;
        let signals = candles
            .iter()
            .enumerate()
            .map(|(i, candle)| {
                if i == 0 {
                    return Signal::Hold;
                }
                match (channel.upper[i - 1], channel.lower[i - 1]) {
                    (Some(upper), _) if candle.close > upper => Signal::Buy,
                    (_, Some(lower)) if candle.close < lower => Signal::Sell,
                    _ => Signal::Hold,
                }
            })
            .collect();
        Ok(signals)
    }
}

impl Indicator for Donchian {
    fn name(&self) -> &str {
        "donchian"
    }

    fn required_candles(&self) -> usize {
        self.period
    }

    /// Returns the middle line.
    fn compute(&self, candles: &[Candle]) -> Result<Series, Report<IndicatorError>> {
        Ok(self.compute_full(candles)?.middle)
    }
}
