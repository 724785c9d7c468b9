use error_stack::{Report, bail};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::IndicatorError;
use crate::indicator::{Indicator, ensure_history};
use crate::model::{Candle, PriceField, Series};
use crate::series::{extract, left_pad, safe_div};
use crate::window;

/// Stochastic oscillator.
///
/// `%K = (close - lowest low) / (highest high - lowest low) * 100`, with a
/// zero-range window fixed at 50 (a flat window reads neutral, never a
/// fault). `%K` may be pre-smoothed (`smooth_k > 1`, the "slow"
/// stochastic); `%D` is a simple moving average of `%K`.
pub struct Stochastic {
    k_period: usize,
    d_period: usize,
    smooth_k: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StochasticOutput {
    pub k: Series,
    pub d: Series,
}

impl StochasticOutput {
    /// All-or-nothing record view: defined only where both lines are.
    pub fn record(&self, index: usize) -> Option<(Decimal, Decimal)> {
        match (self.k[index], self.d[index]) {
            (Some(k), Some(d)) => Some((k, d)),
            _ => None,
        }
    }
}

impl Stochastic {
    /// Standard fast stochastic: 14 / 3, no %K smoothing.
    pub fn standard() -> Self {
        Self {
            k_period: 14,
            d_period: 3,
            smooth_k: 1,
        }
    }

    pub fn new(
        k_period: usize,
        d_period: usize,
        smooth_k: usize,
    ) -> Result<Self, Report<IndicatorError>> {
        if k_period == 0 || d_period == 0 || smooth_k == 0 {
            bail!(IndicatorError::InvalidPeriod {
                name: "all periods must be > 0".into(),
            });
        }
        Ok(Self {
            k_period,
            d_period,
            smooth_k,
        })
    }

    pub fn compute_full(
        &self,
        candles: &[Candle],
    ) -> Result<StochasticOutput, Report<IndicatorError>> {
        ensure_history(candles, self.required_candles())?;
        let n = candles.len();
        let highs = extract(candles, PriceField::High);
        let lows = extract(candles, PriceField::Low);
        let closes = extract(candles, PriceField::Close);

        let highest = window::rolling_max(&highs, self.k_period);
        let lowest = window::rolling_min(&lows, self.k_period);

        let raw_k: Vec<Decimal> = highest
            .into_iter()
            .zip(lowest)
            .zip(&closes[self.k_period - 1..])
            .map(|((hh, ll), &close)| {
                safe_div((close - ll) * dec!(100), hh - ll, dec!(50))
            })
            .collect();

        let k_dense = if self.smooth_k > 1 {
            window::sma(&raw_k, self.smooth_k)
        } else {
            raw_k
        };
        let d_dense = window::sma(&k_dense, self.d_period);

        Ok(StochasticOutput {
            k: left_pad(k_dense, n),
            d: left_pad(d_dense, n),
        })
    }
}

impl Indicator for Stochastic {
    fn name(&self) -> &str {
        "stochastic"
    }

    fn required_candles(&self) -> usize {
        self.k_period + self.smooth_k - 1 + self.d_period - 1
    }

    /// Returns the %K line.
    fn compute(&self, candles: &[Candle]) -> Result<Series, Report<IndicatorError>> {
        Ok(self.compute_full(candles)?.k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicator::testutil::{candles_from_closes, candles_from_hlc};

    #[test]
    fn zero_period_invalid() {
        assert!(Stochastic::new(0, 3, 1).is_err());
        assert!(Stochastic::new(14, 0, 1).is_err());
        assert!(Stochastic::new(14, 3, 0).is_err());
    }

    #[test]
    fn insufficient_data() {
        let stoch = Stochastic::standard();
        assert!(stoch.compute_full(&candles_from_closes(&[dec!(1); 10])).is_err());
    }

    #[test]
    fn close_at_window_high_reads_100() {
        let stoch = Stochastic::new(3, 1, 1).unwrap();
        let candles = candles_from_hlc(&[
            (dec!(10), dec!(5), dec!(6)),
            (dec!(11), dec!(6), dec!(7)),
            (dec!(12), dec!(7), dec!(12)),
        ]);
        let out = stoch.compute_full(&candles).unwrap();
        // (12 - 5) / (12 - 5) * 100
        assert_eq!(out.k[2], Some(dec!(100)));
    }

    #[test]
    fn zero_range_window_reads_50() {
        let stoch = Stochastic::new(3, 1, 1).unwrap();
        let candles = candles_from_closes(&[dec!(7); 5]);
        let out = stoch.compute_full(&candles).unwrap();
        for v in out.k.iter().skip(2) {
            assert_eq!(*v, Some(dec!(50)));
        }
    }

    #[test]
    fn d_is_sma_of_k() {
        let stoch = Stochastic::new(3, 2, 1).unwrap();
        let candles = candles_from_hlc(&[
            (dec!(10), dec!(0), dec!(5)),
            (dec!(10), dec!(0), dec!(2)),
            (dec!(10), dec!(0), dec!(8)),
            (dec!(10), dec!(0), dec!(4)),
        ]);
        let out = stoch.compute_full(&candles).unwrap();
        let k2 = out.k[2].unwrap();
        let k3 = out.k[3].unwrap();
        assert_eq!(out.d[3], Some((k2 + k3) / dec!(2)));
    }

    #[test]
    fn alignment_and_warm_up() {
        let stoch = Stochastic::new(5, 3, 3).unwrap();
        let closes: Vec<Decimal> = (1..=20).map(Decimal::from).collect();
        let out = stoch.compute_full(&candles_from_closes(&closes)).unwrap();
        assert_eq!(out.k.len(), 20);
        assert_eq!(out.d.len(), 20);
        // %K: 4 (raw) + 2 (smoothing); %D adds 2 more.
        assert_eq!(out.k.iter().filter(|v| v.is_none()).count(), 6);
        assert_eq!(out.d.iter().filter(|v| v.is_none()).count(), 8);
    }

    #[test]
    fn k_stays_in_bounds() {
        let stoch = Stochastic::standard();
        let bars: Vec<(Decimal, Decimal, Decimal)> = (0..40)
            .map(|i| {
                let base = Decimal::from((i * 13) % 17 + 10);
                (base + dec!(2), base - dec!(2), base)
            })
            .collect();
        let out = stoch.compute_full(&candles_from_hlc(&bars)).unwrap();
        for v in out.k.into_iter().flatten() {
            assert!(v >= Decimal::ZERO && v <= dec!(100));
        }
    }
}
