use error_stack::{Report, bail};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::IndicatorError;
use crate::indicator::{Indicator, ensure_history};
use crate::model::{Candle, PriceField, Series};
use crate::series::{extract, left_pad, safe_div, zip2};
use crate::window;

/// Simple Moving Average.
pub struct Sma {
    period: usize,
    field: PriceField,
}

impl Sma {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        Self::with_field(period, PriceField::Close)
    }

    pub fn with_field(period: usize, field: PriceField) -> Result<Self, Report<IndicatorError>> {
        if period == 0 {
            bail!(IndicatorError::InvalidPeriod {
                name: "period must be > 0".into(),
            });
        }
        Ok(Self { period, field })
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        "sma"
    }

    fn required_candles(&self) -> usize {
        self.period
    }

    fn compute(&self, candles: &[Candle]) -> Result<Series, Report<IndicatorError>> {
        ensure_history(candles, self.required_candles())?;
        let values = extract(candles, self.field);
        Ok(left_pad(window::sma(&values, self.period), candles.len()))
    }
}

/// Exponential Moving Average, seeded with the SMA of the first full window.
pub struct Ema {
    period: usize,
    field: PriceField,
}

impl Ema {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        Self::with_field(period, PriceField::Close)
    }

    pub fn with_field(period: usize, field: PriceField) -> Result<Self, Report<IndicatorError>> {
        if period == 0 {
            bail!(IndicatorError::InvalidPeriod {
                name: "period must be > 0".into(),
            });
        }
        Ok(Self { period, field })
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        "ema"
    }

    fn required_candles(&self) -> usize {
        self.period
    }

    fn compute(&self, candles: &[Candle]) -> Result<Series, Report<IndicatorError>> {
        ensure_history(candles, self.required_candles())?;
        let values = extract(candles, self.field);
        Ok(left_pad(window::ema(&values, self.period), candles.len()))
    }
}

/// Weighted Moving Average with ascending integer weights.
pub struct Wma {
    period: usize,
    field: PriceField,
}

impl Wma {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        Self::with_field(period, PriceField::Close)
    }

    pub fn with_field(period: usize, field: PriceField) -> Result<Self, Report<IndicatorError>> {
        if period == 0 {
            bail!(IndicatorError::InvalidPeriod {
                name: "period must be > 0".into(),
            });
        }
        Ok(Self { period, field })
    }
}

impl Indicator for Wma {
    fn name(&self) -> &str {
        "wma"
    }

    fn required_candles(&self) -> usize {
        self.period
    }

    fn compute(&self, candles: &[Candle]) -> Result<Series, Report<IndicatorError>> {
        ensure_history(candles, self.required_candles())?;
        let values = extract(candles, self.field);
        Ok(left_pad(window::wma(&values, self.period), candles.len()))
    }
}

/// Hull Moving Average: `wma(2*wma(n/2) - wma(n), sqrt(n))`.
pub struct Hma {
    period: usize,
}

impl Hma {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        if period < 2 {
            bail!(IndicatorError::InvalidPeriod {
                name: "period must be >= 2".into(),
            });
        }
        Ok(Self { period })
    }

    fn sqrt_period(&self) -> usize {
        self.period.isqrt().max(1)
    }
}

impl Indicator for Hma {
    fn name(&self) -> &str {
        "hma"
    }

    fn required_candles(&self) -> usize {
        self.period + self.sqrt_period() - 1
    }

    fn compute(&self, candles: &[Candle]) -> Result<Series, Report<IndicatorError>> {
        ensure_history(candles, self.required_candles())?;
        let n = candles.len();
        let values = extract(candles, PriceField::Close);

        let half = (self.period / 2).max(1);
        let wma_half = left_pad(window::wma(&values, half), n);
        let wma_full = left_pad(window::wma(&values, self.period), n);
        let raw = zip2(&wma_half, &wma_full, |h, f| dec!(2) * h - f);

        // The raw series is defined from index period-1 onward; run the
        // final smoothing over that suffix and restore full alignment.
        let defined: Vec<Decimal> = raw.iter().filter_map(|v| *v).collect();
        Ok(left_pad(
            window::wma(&defined, self.sqrt_period()),
            n,
        ))
    }
}

/// Volume-Weighted Moving Average: `Σ close*volume / Σ volume` per window.
/// A window with zero total volume falls back to the plain close mean.
pub struct Vwma {
    period: usize,
}

impl Vwma {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        if period == 0 {
            bail!(IndicatorError::InvalidPeriod {
                name: "period must be > 0".into(),
            });
        }
        Ok(Self { period })
    }
}

impl Indicator for Vwma {
    fn name(&self) -> &str {
        "vwma"
    }

    fn required_candles(&self) -> usize {
        self.period
    }

    fn compute(&self, candles: &[Candle]) -> Result<Series, Report<IndicatorError>> {
        ensure_history(candles, self.required_candles())?;
        let values: Vec<Decimal> = candles
            .windows(self.period)
            .map(|w| {
                let weighted: Decimal = w.iter().map(|c| c.close * c.volume).sum();
                let total_volume: Decimal = w.iter().map(|c| c.volume).sum();
                let fallback =
                    window::mean(&w.iter().map(|c| c.close).collect::<Vec<_>>());
                safe_div(weighted, total_volume, fallback)
            })
            .collect();
        Ok(left_pad(values, candles.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicator::testutil::candles_from_closes;
    use crate::model::Candle;

    #[test]
    fn sma_period_zero_invalid() {
        assert!(Sma::new(0).is_err());
    }

    #[test]
    fn sma_insufficient_data() {
        let sma = Sma::new(5).unwrap();
        assert!(sma.compute(&candles_from_closes(&[dec!(1); 4])).is_err());
    }

    #[test]
    fn sma_known_scenario() {
        // closes [1,2,3,4,5], period 3 -> [None, None, 2, 3, 4]
        let sma = Sma::new(3).unwrap();
        let candles =
            candles_from_closes(&[dec!(1), dec!(2), dec!(3), dec!(4), dec!(5)]);
        let out = sma.compute(&candles).unwrap();
        assert_eq!(
            out,
            vec![None, None, Some(dec!(2)), Some(dec!(3)), Some(dec!(4))]
        );
    }

    #[test]
    fn sma_warm_up_count() {
        let sma = Sma::new(4).unwrap();
        let candles = candles_from_closes(&[dec!(2); 10]);
        let out = sma.compute(&candles).unwrap();
        assert_eq!(out.len(), 10);
        assert_eq!(out.iter().filter(|v| v.is_none()).count(), 3);
        assert_eq!(out.iter().filter(|v| v.is_some()).count(), 7);
    }

    #[test]
    fn ema_constant_series_stays_constant() {
        let ema = Ema::new(5).unwrap();
        let candles = candles_from_closes(&[dec!(5); 30]);
        let out = ema.compute(&candles).unwrap();
        assert_eq!(out.len(), 30);
        for v in out.iter().skip(4) {
            assert_eq!(*v, Some(dec!(5)));
        }
        for v in out.iter().take(4) {
            assert_eq!(*v, None);
        }
    }

    #[test]
    fn ema_seed_equals_sma() {
        let ema = Ema::new(3).unwrap();
        let candles = candles_from_closes(&[dec!(1), dec!(2), dec!(3), dec!(4)]);
        let out = ema.compute(&candles).unwrap();
        assert_eq!(out[2], Some(dec!(2)));
    }

    #[test]
    fn wma_known_value() {
        // (1*1 + 2*2 + 3*3) / 6 = 14/6
        let wma = Wma::new(3).unwrap();
        let candles = candles_from_closes(&[dec!(1), dec!(2), dec!(3)]);
        let out = wma.compute(&candles).unwrap();
        assert_eq!(out, vec![None, None, Some(dec!(14) / dec!(6))]);
    }

    #[test]
    fn hma_constant_series_stays_constant() {
        let hma = Hma::new(9).unwrap();
        let candles = candles_from_closes(&[dec!(7); 20]);
        let out = hma.compute(&candles).unwrap();
        assert_eq!(out.len(), 20);
        // Warm-up: (9-1) + (3-1) = 10 leading None entries.
        assert_eq!(out.iter().filter(|v| v.is_none()).count(), 10);
        for v in out.iter().skip(10) {
            assert_eq!(*v, Some(dec!(7)));
        }
    }

    #[test]
    fn hma_period_one_invalid() {
        assert!(Hma::new(1).is_err());
    }

    #[test]
    fn vwma_weights_by_volume() {
        let mut candles = candles_from_closes(&[dec!(10), dec!(20)]);
        candles[0].volume = dec!(1);
        candles[1].volume = dec!(3);
        let vwma = Vwma::new(2).unwrap();
        let out = vwma.compute(&candles).unwrap();
        // (10*1 + 20*3) / 4 = 17.5
        assert_eq!(out, vec![None, Some(dec!(17.5))]);
    }

    #[test]
    fn vwma_zero_volume_falls_back_to_mean() {
        let mut candles = candles_from_closes(&[dec!(10), dec!(20)]);
        for c in &mut candles {
            c.volume = Decimal::ZERO;
        }
        let vwma = Vwma::new(2).unwrap();
        let out = vwma.compute(&candles).unwrap();
        assert_eq!(out, vec![None, Some(dec!(15))]);
    }

    #[test]
    fn field_selector_reads_volume() {
        let mut candles = candles_from_closes(&[dec!(1), dec!(2), dec!(3)]);
        for (i, c) in candles.iter_mut().enumerate() {
            c.volume = Decimal::from(10 * (i + 1));
        }
        let sma = Sma::with_field(3, PriceField::Volume).unwrap();
        let out = sma.compute(&candles).unwrap();
        assert_eq!(out[2], Some(dec!(20)));
    }

    #[test]
    fn alignment_holds_for_all_averages() {
        let candles = candles_from_closes(
            &(1..=40).map(Decimal::from).collect::<Vec<_>>(),
        );
        let indicators: Vec<Box<dyn Indicator>> = vec![
            Box::new(Sma::new(5).unwrap()),
            Box::new(Ema::new(5).unwrap()),
            Box::new(Wma::new(5).unwrap()),
            Box::new(Hma::new(9).unwrap()),
            Box::new(Vwma::new(5).unwrap()),
        ];
        for indicator in indicators {
            let out = indicator.compute(&candles).unwrap();
            assert_eq!(out.len(), candles.len(), "{}", indicator.name());
        }
    }

    #[test]
    fn recomputation_is_bit_identical() {
        let closes: Vec<Decimal> = (1..=30)
            .map(|i| Decimal::from(i * 7 % 13) + dec!(0.5))
            .collect();
        let candles: Vec<Candle> = candles_from_closes(&closes);
        let ema = Ema::new(6).unwrap();
        assert_eq!(ema.compute(&candles).unwrap(), ema.compute(&candles).unwrap());
    }
}
