use error_stack::{Report, bail};
use rust_decimal::Decimal;

use crate::error::IndicatorError;
use crate::indicator::{Indicator, ensure_history};
use crate::model::{Candle, PriceField, Series};
use crate::series::{extract, left_pad, zip2};
use crate::window;

/// Moving Average Convergence Divergence.
pub struct Macd {
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
}

/// The three MACD series, each aligned 1:1 with the input candles.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdOutput {
    pub macd: Series,
    pub signal: Series,
    pub histogram: Series,
}

impl MacdOutput {
    /// All-or-nothing record view: defined only where every component is.
    pub fn record(&self, index: usize) -> Option<(Decimal, Decimal, Decimal)> {
        match (self.macd[index], self.signal[index], self.histogram[index]) {
            (Some(m), Some(s), Some(h)) => Some((m, s, h)),
            _ => None,
        }
    }
}

impl Macd {
    pub fn new(
        fast_period: usize,
        slow_period: usize,
        signal_period: usize,
    ) -> Result<Self, Report<IndicatorError>> {
        if fast_period == 0 || slow_period == 0 || signal_period == 0 {
            bail!(IndicatorError::InvalidPeriod {
                name: "all periods must be > 0".into(),
            });
        }
        if fast_period >= slow_period {
            bail!(IndicatorError::InvalidPeriod {
                name: "fast_period must be < slow_period".into(),
            });
        }
        Ok(Self {
            fast_period,
            slow_period,
            signal_period,
        })
    }

    /// Calculate the MACD line, signal line and histogram.
    pub fn compute_full(
        &self,
        candles: &[Candle],
    ) -> Result<MacdOutput, Report<IndicatorError>> {
        ensure_history(candles, self.required_candles())?;
        let n = candles.len();
        let prices = extract(candles, PriceField::Close);

        let fast_ema = left_pad(window::ema(&prices, self.fast_period), n);
        let slow_ema = left_pad(window::ema(&prices, self.slow_period), n);

        // Defined from the point both EMAs are, i.e. index slow_period-1.
        let macd = zip2(&fast_ema, &slow_ema, |f, s| f - s);

        // The signal EMA runs over the defined MACD suffix only, then is
        // re-padded to full length.
        let macd_defined: Vec<Decimal> = macd.iter().filter_map(|v| *v).collect();
        let signal = left_pad(window::ema(&macd_defined, self.signal_period), n);

        let histogram = zip2(&macd, &signal, |m, s| m - s);

        Ok(MacdOutput {
            macd,
            signal,
            histogram,
        })
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        "macd"
    }

    fn required_candles(&self) -> usize {
        self.slow_period + self.signal_period - 1
    }

    /// Returns the MACD line.
    fn compute(&self, candles: &[Candle]) -> Result<Series, Report<IndicatorError>> {
        Ok(self.compute_full(candles)?.macd)
    }
}
