use error_stack::{Report, bail};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::IndicatorError;
use crate::indicator::{Indicator, ensure_history};
use crate::model::{Candle, Series};
use crate::series::{left_pad, safe_div, zip2};
use crate::window;

/// Klinger Volume Oscillator.
///
/// Volume force per bar is signed by the trend of `high + low + close`
/// and scaled by the ratio of the bar's range to the accumulated
/// cumulative measurement. The oscillator is the fast-minus-slow EMA of
/// the force series, with an EMA signal line on top.
pub struct Klinger {
    fast: usize,
    slow: usize,
    signal: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KlingerOutput {
    pub oscillator: Series,
    pub signal: Series,
}

impl KlingerOutput {
    /// All-or-nothing record view: defined only where both lines are.
    pub fn record(&self, index: usize) -> Option<(Decimal, Decimal)> {
        match (self.oscillator[index], self.signal[index]) {
            (Some(osc), Some(sig)) => Some((osc, sig)),
            _ => None,
        }
    }
}

impl Klinger {
    /// Standard parameters: 34 / 55 / 13.
    pub fn standard() -> Self {
        Self {
            fast: 34,
            slow: 55,
            signal: 13,
        }
    }

    pub fn new(fast: usize, slow: usize, signal: usize) -> Result<Self, Report<IndicatorError>> {
        if fast == 0 || slow == 0 || signal == 0 {
            bail!(IndicatorError::InvalidPeriod {
                name: "all periods must be > 0".into(),
            });
        }
        if fast >= slow {
            bail!(IndicatorError::InvalidPeriod {
                name: "fast period must be shorter than slow".into(),
            });
        }
        Ok(Self { fast, slow, signal })
    }

    /// Signed volume force per candle pair; the first candle has no
    /// trend reference, so the series starts one bar in.
    fn volume_force(candles: &[Candle]) -> Vec<Decimal> {
        let hlc: Vec<Decimal> = candles.iter().map(|c| c.high + c.low + c.close).collect();

        let mut out = Vec::with_capacity(candles.len() - 1);
        let mut prev_trend = Decimal::ZERO;
        let mut cm = Decimal::ZERO;
        let mut prev_dm = candles[0].high - candles[0].low;

        for i in 1..candles.len() {
            let trend = if hlc[i] > hlc[i - 1] { dec!(1) } else { dec!(-1) };
            let dm = candles[i].high - candles[i].low;
            cm = if trend == prev_trend {
                cm + dm
            } else {
                prev_dm + dm
            };
            let ratio = safe_div(dec!(2) * dm, cm, Decimal::ZERO);
            let force = if cm == Decimal::ZERO {
                Decimal::ZERO
            } else {
                candles[i].volume * (ratio - dec!(1)).abs() * trend * dec!(100)
            };
            out.push(force);
            prev_trend = trend;
            prev_dm = dm;
        }
        out
    }

    pub fn compute_full(
        &self,
        candles: &[Candle],
    ) -> Result<KlingerOutput, Report<IndicatorError>> {
        ensure_history(candles, self.required_candles())?;
        let n = candles.len();

        let force = Self::volume_force(candles);
        let fast = left_pad(window::ema(&force, self.fast), n);
        let slow = left_pad(window::ema(&force, self.slow), n);
        let oscillator = zip2(&fast, &slow, |f, s| f - s);

        let dense: Vec<Decimal> = oscillator.iter().flatten().copied().collect();
        let signal = left_pad(window::ema(&dense, self.signal), n);

        Ok(KlingerOutput { oscillator, signal })
    }
}

impl Indicator for Klinger {
    fn name(&self) -> &str {
        "klinger"
    }

    fn required_candles(&self) -> usize {
        // One bar consumed by the trend pairing, then the slow EMA and
        // the signal EMA on top of it.
        1 + self.slow + self.signal - 1
    }

    /// Returns the oscillator line.
    fn compute(&self, candles: &[Candle]) -> Result<Series, Report<IndicatorError>> {
        Ok(self.compute_full(candles)?.oscillator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicator::testutil::{candles_from_closes, candles_from_hlc};

    #[test]
    fn invalid_periods() {
        assert!(Klinger::new(0, 55, 13).is_err());
        assert!(Klinger::new(55, 34, 13).is_err());
        assert!(Klinger::new(34, 34, 13).is_err());
    }

    #[test]
    fn insufficient_data() {
        let klinger = Klinger::standard();
        assert!(
            klinger
                .compute_full(&candles_from_closes(&[dec!(1); 50]))
                .is_err()
        );
    }

    #[test]
    fn flat_bars_read_zero() {
        // Zero-range bars keep the cumulative measurement at zero, so
        // every force value falls back to 0 and both lines stay there.
        let klinger = Klinger::new(2, 3, 2).unwrap();
        let out = klinger
            .compute_full(&candles_from_closes(&[dec!(10); 10]))
            .unwrap();
        for v in out.oscillator.iter().flatten() {
            assert_eq!(*v, Decimal::ZERO);
        }
        for v in out.signal.iter().flatten() {
            assert_eq!(*v, Decimal::ZERO);
        }
    }

    #[test]
    fn sustained_uptrend_reads_positive_force() {
        let klinger = Klinger::new(2, 3, 2).unwrap();
        let bars: Vec<(Decimal, Decimal, Decimal)> = (0..12)
            .map(|i| {
                let base = Decimal::from(10 + i);
                (base + dec!(1), base - dec!(1), base)
            })
            .collect();
        let force = Klinger::volume_force(&candles_from_hlc(&bars));
        assert!(force.iter().all(|f| *f >= Decimal::ZERO));
    }

    #[test]
    fn alignment_and_warm_up() {
        let klinger = Klinger::new(2, 3, 2).unwrap();
        let bars: Vec<(Decimal, Decimal, Decimal)> = (0..12)
            .map(|i| {
                let base = Decimal::from(10 + (i * 7) % 5);
                (base + dec!(2), base - dec!(2), base)
            })
            .collect();
        let out = klinger.compute_full(&candles_from_hlc(&bars)).unwrap();
        assert_eq!(out.oscillator.len(), 12);
        assert_eq!(out.signal.len(), 12);
        // Oscillator: 1 (pairing) + 2 (slow EMA); signal adds 1 more.
        assert_eq!(out.oscillator.iter().filter(|v| v.is_none()).count(), 3);
        assert_eq!(out.signal.iter().filter(|v| v.is_none()).count(), 4);
        assert!(out.record(3).is_none());
        assert!(out.record(4).is_some());
    }
}
