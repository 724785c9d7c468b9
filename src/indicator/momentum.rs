use error_stack::{Report, bail};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::IndicatorError;
use crate::indicator::{Indicator, ensure_history};
use crate::model::{Candle, PriceField, Series};
use crate::series::{extract, left_pad, safe_div};
use crate::window;

/// Simple momentum: `close - close[period ago]`.
pub struct Momentum {
    period: usize,
}

impl Momentum {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        if period == 0 {
            bail!(IndicatorError::InvalidPeriod {
                name: "period must be > 0".into(),
            });
        }
        Ok(Self { period })
    }
}

impl Indicator for Momentum {
    fn name(&self) -> &str {
        "momentum"
    }

    fn required_candles(&self) -> usize {
        self.period + 1
    }

    fn compute(&self, candles: &[Candle]) -> Result<Series, Report<IndicatorError>> {
        ensure_history(candles, self.required_candles())?;
        let closes = extract(candles, PriceField::Close);
        let values: Vec<Decimal> = (self.period..closes.len())
            .map(|i| closes[i] - closes[i - self.period])
            .collect();
        Ok(left_pad(values, candles.len()))
    }
}

/// Rate of Change: percentage move against the close `period` bars back.
/// A zero base price reads 0.
pub struct Roc {
    period: usize,
}

impl Roc {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        if period == 0 {
            bail!(IndicatorError::InvalidPeriod {
                name: "period must be > 0".into(),
            });
        }
        Ok(Self { period })
    }
}

impl Indicator for Roc {
    fn name(&self) -> &str {
        "roc"
    }

    fn required_candles(&self) -> usize {
        self.period + 1
    }

    fn compute(&self, candles: &[Candle]) -> Result<Series, Report<IndicatorError>> {
        ensure_history(candles, self.required_candles())?;
        let closes = extract(candles, PriceField::Close);
        let values: Vec<Decimal> = (self.period..closes.len())
            .map(|i| {
                let base = closes[i - self.period];
                safe_div((closes[i] - base) * dec!(100), base, Decimal::ZERO)
            })
            .collect();
        Ok(left_pad(values, candles.len()))
    }
}

/// Commodity Channel Index over the typical price `(H+L+C)/3`.
/// A zero mean deviation reads 0 exactly.
pub struct Cci {
    period: usize,
}

impl Cci {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        if period == 0 {
            bail!(IndicatorError::InvalidPeriod {
                name: "period must be > 0".into(),
            });
        }
        Ok(Self { period })
    }
}

impl Indicator for Cci {
    fn name(&self) -> &str {
        "cci"
    }

    fn required_candles(&self) -> usize {
        self.period
    }

    fn compute(&self, candles: &[Candle]) -> Result<Series, Report<IndicatorError>> {
        ensure_history(candles, self.required_candles())?;
        let typical: Vec<Decimal> = candles
            .iter()
            .map(|c| (c.high + c.low + c.close) / dec!(3))
            .collect();

        let values: Vec<Decimal> = typical
            .windows(self.period)
            .map(|w| {
                let sma = window::mean(w);
                let mean_dev = w
                    .iter()
                    .map(|&tp| (tp - sma).abs())
                    .sum::<Decimal>()
                    / Decimal::from(self.period);
                let last = w[w.len() - 1];
                safe_div(last - sma, dec!(0.015) * mean_dev, Decimal::ZERO)
            })
            .collect();
        Ok(left_pad(values, candles.len()))
    }
}

/// True Strength Index: double-EMA-smoothed momentum over double-EMA-
/// smoothed absolute momentum, scaled to ±100, with an EMA signal line.
pub struct Tsi {
    long_period: usize,
    short_period: usize,
    signal_period: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TsiOutput {
    pub tsi: Series,
    pub signal: Series,
}

impl TsiOutput {
    /// All-or-nothing record view: defined only where both lines are.
    pub fn record(&self, index: usize) -> Option<(Decimal, Decimal)> {
        match (self.tsi[index], self.signal[index]) {
            (Some(t), Some(s)) => Some((t, s)),
            _ => None,
        }
    }
}

impl Tsi {
    /// Standard parameters: 25 / 13 / 13.
    pub fn standard() -> Self {
        Self {
            long_period: 25,
            short_period: 13,
            signal_period: 13,
        }
    }

    pub fn new(
        long_period: usize,
        short_period: usize,
        signal_period: usize,
    ) -> Result<Self, Report<IndicatorError>> {
        if long_period == 0 || short_period == 0 || signal_period == 0 {
            bail!(IndicatorError::InvalidPeriod {
                name: "all periods must be > 0".into(),
            });
        }
        Ok(Self {
            long_period,
            short_period,
            signal_period,
        })
    }

    pub fn compute_full(&self, candles: &[Candle]) -> Result<TsiOutput, Report<IndicatorError>> {
        ensure_history(candles, self.required_candles())?;
        let n = candles.len();
        let closes = extract(candles, PriceField::Close);

        let deltas: Vec<Decimal> = closes.windows(2).map(|w| w[1] - w[0]).collect();
        let abs_deltas: Vec<Decimal> = deltas.iter().map(|d| d.abs()).collect();

        let smooth = |values: &[Decimal]| -> Vec<Decimal> {
            window::ema(&window::ema(values, self.long_period), self.short_period)
        };

        let numerator = smooth(&deltas);
        let denominator = smooth(&abs_deltas);

        let tsi_dense: Vec<Decimal> = numerator
            .into_iter()
            .zip(denominator)
            .map(|(num, den)| safe_div(dec!(100) * num, den, Decimal::ZERO))
            .collect();

        let signal = left_pad(window::ema(&tsi_dense, self.signal_period), n);
        Ok(TsiOutput {
            tsi: left_pad(tsi_dense, n),
            signal,
        })
    }
}

impl Indicator for Tsi {
    fn name(&self) -> &str {
        "tsi"
    }

    fn required_candles(&self) -> usize {
        self.long_period + self.short_period + self.signal_period - 1
    }

    /// Returns the TSI line.
    fn compute(&self, candles: &[Candle]) -> Result<Series, Report<IndicatorError>> {
        Ok(self.compute_full(candles)?.tsi)
    }
}

/// Ultimate Oscillator: buying pressure against true range over three
/// nested horizons. A zero true-range sum reads as a neutral 0.5 average,
/// so a fully flat window yields 50.
pub struct UltimateOscillator {
    short: usize,
    medium: usize,
    long: usize,
}

impl UltimateOscillator {
    /// Standard parameters: 7 / 14 / 28.
    pub fn standard() -> Self {
        Self {
            short: 7,
            medium: 14,
            long: 28,
        }
    }

    pub fn new(short: usize, medium: usize, long: usize) -> Result<Self, Report<IndicatorError>> {
        if short == 0 {
            bail!(IndicatorError::InvalidPeriod {
                name: "all periods must be > 0".into(),
            });
        }
        if short >= medium || medium >= long {
            bail!(IndicatorError::InvalidPeriod {
                name: "periods must be strictly increasing".into(),
            });
        }
        Ok(Self {
            short,
            medium,
            long,
        })
    }

    fn average(bp: &[Decimal], tr: &[Decimal], end: usize, period: usize) -> Decimal {
        let bp_sum: Decimal = bp[end - period..end].iter().copied().sum();
        let tr_sum: Decimal = tr[end - period..end].iter().copied().sum();
        safe_div(bp_sum, tr_sum, dec!(0.5))
    }
}

impl Indicator for UltimateOscillator {
    fn name(&self) -> &str {
        "ultimate_oscillator"
    }

    fn required_candles(&self) -> usize {
        self.long + 1
    }

    fn compute(&self, candles: &[Candle]) -> Result<Series, Report<IndicatorError>> {
        ensure_history(candles, self.required_candles())?;
        let n = candles.len();

        // Buying pressure and true range, one entry per candle pair.
        let mut bp = Vec::with_capacity(n - 1);
        let mut tr = Vec::with_capacity(n - 1);
        for pair in candles.windows(2) {
            let prev_close = pair[0].close;
            let low = pair[1].low.min(prev_close);
            let high = pair[1].high.max(prev_close);
            bp.push(pair[1].close - low);
            tr.push(high - low);
        }

        let values: Vec<Decimal> = (self.long..n)
            .map(|i| {
                let a_short = Self::average(&bp, &tr, i, self.short);
                let a_medium = Self::average(&bp, &tr, i, self.medium);
                let a_long = Self::average(&bp, &tr, i, self.long);
                dec!(100) * (dec!(4) * a_short + dec!(2) * a_medium + a_long) / dec!(7)
            })
            .collect();
        Ok(left_pad(values, n))
    }
}
