use error_stack::{Report, bail};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::IndicatorError;
use crate::indicator::{Indicator, ensure_history};
use crate::model::{Candle, PriceField, Series, Signal};
use crate::series::{extract, left_pad, safe_div};
use crate::window;

/// Volume scale for the Ease of Movement box ratio.
const EOM_VOLUME_SCALE: Decimal = dec!(100_000_000);

/// On-Balance Volume: a running sum seeded with the first candle's
/// volume, adding on up-closes, subtracting on down-closes and holding
/// on unchanged closes. Defined at every index.
pub struct Obv;

impl Indicator for Obv {
    fn name(&self) -> &str {
        "obv"
    }

    fn required_candles(&self) -> usize {
        1
    }

    fn compute(&self, candles: &[Candle]) -> Result<Series, Report<IndicatorError>> {
        ensure_history(candles, self.required_candles())?;
        let mut total = candles[0].volume;
        let mut out = vec![Some(total)];
        for pair in candles.windows(2) {
            if pair[1].close > pair[0].close {
                total += pair[1].volume;
            } else if pair[1].close < pair[0].close {
                total -= pair[1].volume;
            }
            out.push(Some(total));
        }
        Ok(out)
    }
}

/// Accumulation/Distribution line: cumulative money-flow volume, where
/// the money-flow multiplier is `((c-l)-(h-c))/(h-l)` and a zero-range
/// bar contributes nothing.
pub struct AdLine;

impl Indicator for AdLine {
    fn name(&self) -> &str {
        "ad_line"
    }

    fn required_candles(&self) -> usize {
        1
    }

    fn compute(&self, candles: &[Candle]) -> Result<Series, Report<IndicatorError>> {
        ensure_history(candles, self.required_candles())?;
        let mut total = Decimal::ZERO;
        let out = candles
            .iter()
            .map(|c| {
                let multiplier = safe_div(
                    (c.close - c.low) - (c.high - c.close),
                    c.high - c.low,
                    Decimal::ZERO,
                );
                total += multiplier * c.volume;
                Some(total)
            })
            .collect();
        Ok(out)
    }
}

/// Chaikin oscillator: fast-minus-slow EMA of the A/D line.
pub struct ChaikinOscillator {
    fast: usize,
    slow: usize,
}

impl ChaikinOscillator {
    /// Standard periods: 3 / 10.
    pub fn standard() -> Self {
        Self { fast: 3, slow: 10 }
    }

    pub fn new(fast: usize, slow: usize) -> Result<Self, Report<IndicatorError>> {
        if fast == 0 || slow == 0 {
            bail!(IndicatorError::InvalidPeriod {
                name: "all periods must be > 0".into(),
            });
        }
        if fast >= slow {
            bail!(IndicatorError::InvalidPeriod {
                name: "fast period must be shorter than slow".into(),
            });
        }
        Ok(Self { fast, slow })
    }
}

impl Indicator for ChaikinOscillator {
    fn name(&self) -> &str {
        "chaikin"
    }

    fn required_candles(&self) -> usize {
        self.slow
    }

    fn compute(&self, candles: &[Candle]) -> Result<Series, Report<IndicatorError>> {
        ensure_history(candles, self.required_candles())?;
        let ad: Vec<Decimal> = AdLine.compute(candles)?.into_iter().flatten().collect();
        let fast = window::ema(&ad, self.fast);
        let slow = window::ema(&ad, self.slow);
        // Both EMAs are dense; align them at the tail and subtract.
        let skip = fast.len() - slow.len();
        let dense: Vec<Decimal> = fast[skip..]
            .iter()
            .zip(&slow)
            .map(|(f, s)| f - s)
            .collect();
        Ok(left_pad(dense, candles.len()))
    }
}

/// Force Index: `(close - prev_close) * volume`, EMA-smoothed.
pub struct ForceIndex {
    period: usize,
}

impl ForceIndex {
    /// Standard period: 13.
    pub fn standard() -> Self {
        Self { period: 13 }
    }

    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        if period == 0 {
            bail!(IndicatorError::InvalidPeriod {
                name: "period must be > 0".into(),
            });
        }
        Ok(Self { period })
    }
}

impl Indicator for ForceIndex {
    fn name(&self) -> &str {
        "force_index"
    }

    fn required_candles(&self) -> usize {
        self.period + 1
    }

    fn compute(&self, candles: &[Candle]) -> Result<Series, Report<IndicatorError>> {
        ensure_history(candles, self.required_candles())?;
        let raw: Vec<Decimal> = candles
            .windows(2)
            .map(|pair| (pair[1].close - pair[0].close) * pair[1].volume)
            .collect();
        Ok(left_pad(window::ema(&raw, self.period), candles.len()))
    }
}

/// Ease of Movement: midpoint move divided by the box ratio
/// (scaled volume over bar range), SMA-smoothed. A zero-volume bar
/// reads 0.
pub struct Eom {
    period: usize,
}

impl Eom {
    /// Standard period: 14.
    pub fn standard() -> Self {
        Self { period: 14 }
    }

    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        if period == 0 {
            bail!(IndicatorError::InvalidPeriod {
                name: "period must be > 0".into(),
            });
        }
        Ok(Self { period })
    }
}

impl Indicator for Eom {
    fn name(&self) -> &str {
        "eom"
    }

    fn required_candles(&self) -> usize {
        self.period + 1
    }

    fn compute(&self, candles: &[Candle]) -> Result<Series, Report<IndicatorError>> {
        ensure_history(candles, self.required_candles())?;
        let raw: Vec<Decimal> = candles
            .windows(2)
            .map(|pair| {
                let midpoint_move = (pair[1].high + pair[1].low) / dec!(2)
                    - (pair[0].high + pair[0].low) / dec!(2);
                let range = pair[1].high - pair[1].low;
                // eom = move / ((vol/scale) / range) = move*range*scale/vol
                safe_div(
                    midpoint_move * range * EOM_VOLUME_SCALE,
                    pair[1].volume,
                    Decimal::ZERO,
                )
            })
            .collect();
        Ok(left_pad(window::sma(&raw, self.period), candles.len()))
    }
}

/// Simple moving average of volume.
pub struct VolumeMa {
    period: usize,
}

impl VolumeMa {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        if period == 0 {
            bail!(IndicatorError::InvalidPeriod {
                name: "period must be > 0".into(),
            });
        }
        Ok(Self { period })
    }
}

impl Indicator for VolumeMa {
    fn name(&self) -> &str {
        "volume_ma"
    }

    fn required_candles(&self) -> usize {
        self.period
    }

    fn compute(&self, candles: &[Candle]) -> Result<Series, Report<IndicatorError>> {
        ensure_history(candles, self.required_candles())?;
        let volumes = extract(candles, PriceField::Volume);
        Ok(left_pad(window::sma(&volumes, self.period), candles.len()))
    }
}

/// Volume rate of change; a zero base volume reads 0.
pub struct VolumeRoc {
    period: usize,
}

impl VolumeRoc {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        if period == 0 {
            bail!(IndicatorError::InvalidPeriod {
                name: "period must be > 0".into(),
            });
        }
        Ok(Self { period })
    }
}

impl Indicator for VolumeRoc {
    fn name(&self) -> &str {
        "volume_roc"
    }

    fn required_candles(&self) -> usize {
        self.period + 1
    }

    fn compute(&self, candles: &[Candle]) -> Result<Series, Report<IndicatorError>> {
        ensure_history(candles, self.required_candles())?;
        let volumes = extract(candles, PriceField::Volume);
        let dense: Vec<Decimal> = volumes
            .windows(self.period + 1)
            .map(|w| safe_div((w[self.period] - w[0]) * dec!(100), w[0], Decimal::ZERO))
            .collect();
        Ok(left_pad(dense, candles.len()))
    }
}

/// Current volume relative to its moving average; a zero average reads
/// 1 (ordinary volume).
pub struct RelativeVolume {
    period: usize,
}

impl RelativeVolume {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        if period == 0 {
            bail!(IndicatorError::InvalidPeriod {
                name: "period must be > 0".into(),
            });
        }
        Ok(Self { period })
    }
}

impl Indicator for RelativeVolume {
    fn name(&self) -> &str {
        "relative_volume"
    }

    fn required_candles(&self) -> usize {
        self.period
    }

    fn compute(&self, candles: &[Candle]) -> Result<Series, Report<IndicatorError>> {
        ensure_history(candles, self.required_candles())?;
        let volumes = extract(candles, PriceField::Volume);
        let ma = window::sma(&volumes, self.period);
        let dense: Vec<Decimal> = ma
            .into_iter()
            .zip(&volumes[self.period - 1..])
            .map(|(avg, &vol)| safe_div(vol, avg, dec!(1)))
            .collect();
        Ok(left_pad(dense, candles.len()))
    }
}

/// A volume-surge bar with a clear direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClimaxKind {
    Buying,
    Selling,
}

/// Volume-confirmed breakout and climax detection over a shared window.
pub struct VolumeSurge {
    period: usize,
    multiplier: Decimal,
}

impl VolumeSurge {
    pub fn new(period: usize, multiplier: Decimal) -> Result<Self, Report<IndicatorError>> {
        if period == 0 {
            bail!(IndicatorError::InvalidPeriod {
                name: "period must be > 0".into(),
            });
        }
        if multiplier <= Decimal::ZERO {
            bail!(IndicatorError::InvalidPeriod {
                name: "multiplier must be > 0".into(),
            });
        }
        Ok(Self { period, multiplier })
    }

    /// Volume moving average over the window ending at the *previous*
    /// candle, so the surge check never compares a bar against itself.
    fn prior_volume_ma(&self, candles: &[Candle]) -> Series {
        let volumes = extract(candles, PriceField::Volume);
        let ma = left_pad(window::sma(&volumes, self.period), candles.len());
        crate::series::shift_forward(&ma, 1)
    }

    fn surges(&self, candles: &[Candle]) -> Vec<bool> {
        self.prior_volume_ma(candles)
            .iter()
            .zip(candles)
            .map(|(avg, c)| avg.is_some_and(|avg| c.volume > self.multiplier * avg))
            .collect()
    }

    /// Breakout signals: close beyond the prior window's high/low bound
    /// on surging volume. Quiet or warm-up bars hold.
    pub fn breakout_signals(
        &self,
        candles: &[Candle],
    ) -> Result<Vec<Signal>, Report<IndicatorError>> {
        ensure_history(candles, self.period + 1)?;
        let highs = extract(candles, PriceField::High);
        let lows = extract(candles, PriceField::Low);
        let upper = left_pad(window::rolling_max(&highs, self.period), candles.len());
        let lower = left_pad(window::rolling_min(&lows, self.period), candles.len());
        let surges = self.surges(candles);

        let out = candles
            .iter()
            .enumerate()
            .map(|(i, c)| {
                if i == 0 || !surges[i] {
                    return Signal::Hold;
                }
                match (upper[i - 1], lower[i - 1]) {
                    (Some(upper), _) if c.close > upper => Signal::Buy,
                    (_, Some(lower)) if c.close < lower => Signal::Sell,
                    _ => Signal::Hold,
                }
            })
            .collect();
        Ok(out)
    }

    /// Climax marks: surging volume on a directional bar.
    pub fn climaxes(
        &self,
        candles: &[Candle],
    ) -> Result<Vec<Option<ClimaxKind>>, Report<IndicatorError>> {
        ensure_history(candles, self.period + 1)?;
        let surges = self.surges(candles);
        let out = candles
            .iter()
            .zip(surges)
            .map(|(c, surge)| {
                if !surge || c.close == c.open {
                    None
                } else if c.close > c.open {
                    Some(ClimaxKind::Buying)
                } else {
                    Some(ClimaxKind::Selling)
                }
            })
            .collect();
        Ok(out)
    }
}
