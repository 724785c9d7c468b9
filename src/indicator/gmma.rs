use error_stack::Report;
use rust_decimal::Decimal;

use crate::error::IndicatorError;
use crate::indicator::{Indicator, ensure_history};
use crate::model::{Candle, PriceField, Series};
use crate::series::{extract, left_pad};
use crate::window;

/// Guppy Multiple Moving Average: a short-term trader ribbon and a
/// long-term investor ribbon of EMAs.
pub struct Gmma;

const SHORT_PERIODS: [usize; 6] = [3, 5, 8, 10, 12, 15];
const LONG_PERIODS: [usize; 6] = [30, 35, 40, 45, 50, 60];

#[derive(Debug, Clone, PartialEq)]
pub struct GmmaOutput {
    /// EMAs of periods 3, 5, 8, 10, 12, 15, in that order.
    pub short: Vec<Series>,
    /// EMAs of periods 30, 35, 40, 45, 50, 60, in that order.
    pub long: Vec<Series>,
}

impl GmmaOutput {
    /// All-or-nothing record view across both ribbons.
    pub fn record(&self, index: usize) -> Option<(Vec<Decimal>, Vec<Decimal>)> {
        let short: Option<Vec<Decimal>> = self.short.iter().map(|s| s[index]).collect();
        let long: Option<Vec<Decimal>> = self.long.iter().map(|s| s[index]).collect();
        match (short, long) {
            (Some(s), Some(l)) => Some((s, l)),
            _ => None,
        }
    }
}

impl Gmma {
    pub fn new() -> Self {
        Self
    }

    pub fn compute_full(
        &self,
        candles: &[Candle],
    ) -> Result<GmmaOutput, Report<IndicatorError>> {
        ensure_history(candles, self.required_candles())?;
        let n = candles.len();
        let closes = extract(candles, PriceField::Close);

        let ribbon = |periods: &[usize]| -> Vec<Series> {
            periods
                .iter()
                .map(|&p| left_pad(window::ema(&closes, p), n))
                .collect()
        };

        Ok(GmmaOutput {
            short: ribbon(&SHORT_PERIODS),
            long: ribbon(&LONG_PERIODS),
        })
    }
}

impl Default for Gmma {
    fn default() -> Self {
        Self::new()
    }
}

impl Indicator for Gmma {
    fn name(&self) -> &str {
        "gmma"
    }

    fn required_candles(&self) -> usize {
        *LONG_PERIODS.last().expect("long ribbon is non-empty")
    }

    /// Returns the slowest long-ribbon EMA.
    fn compute(&self, candles: &[Candle]) -> Result<Series, Report<IndicatorError>> {
        let mut out = self.compute_full(candles)?;
        Ok(out.long.pop().expect("long ribbon is non-empty"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicator::testutil::candles_from_closes;
    use rust_decimal_macros::dec;

    #[test]
    fn insufficient_data() {
        let gmma = Gmma::new();
        assert!(gmma.compute_full(&candles_from_closes(&[dec!(1); 59])).is_err());
    }

    #[test]
    fn ribbons_are_aligned() {
        let gmma = Gmma::new();
        let closes: Vec<Decimal> = (1..=70).map(Decimal::from).collect();
        let out = gmma.compute_full(&candles_from_closes(&closes)).unwrap();
        assert_eq!(out.short.len(), 6);
        assert_eq!(out.long.len(), 6);
        for series in out.short.iter().chain(out.long.iter()) {
            assert_eq!(series.len(), 70);
        }
    }

    #[test]
    fn warm_up_per_ribbon_member() {
        let gmma = Gmma::new();
        let closes: Vec<Decimal> = (1..=70).map(Decimal::from).collect();
        let out = gmma.compute_full(&candles_from_closes(&closes)).unwrap();
        // EMA(3) warms up after 2 bars, EMA(60) after 59.
        assert_eq!(out.short[0].iter().filter(|v| v.is_none()).count(), 2);
        assert_eq!(out.long[5].iter().filter(|v| v.is_none()).count(), 59);
    }

    #[test]
    fn constant_series_converges_everywhere() {
        let gmma = Gmma::new();
        let out = gmma
            .compute_full(&candles_from_closes(&[dec!(4); 80]))
            .unwrap();
        let (short, long) = out.record(79).unwrap();
        assert!(short.iter().all(|&v| v == dec!(4)));
        assert!(long.iter().all(|&v| v == dec!(4)));
    }

    #[test]
    fn record_undefined_during_warm_up() {
        let gmma = Gmma::new();
        let closes: Vec<Decimal> = (1..=70).map(Decimal::from).collect();
        let out = gmma.compute_full(&candles_from_closes(&closes)).unwrap();
        assert!(out.record(30).is_none());
        assert!(out.record(59).is_some());
    }
}
