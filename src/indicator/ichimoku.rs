use error_stack::{Report, bail};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::IndicatorError;
use crate::indicator::{Indicator, ensure_history};
use crate::model::{Candle, PriceField, Series};
use crate::series::{extract, left_pad, shift_backward, shift_forward, zip2};
use crate::window;

/// Ichimoku Kinko Hyo.
///
/// Senkou spans are displaced forward (leading), the Chikou span backward
/// (lagging); displacement pads the vacated end with undefined entries so
/// every series stays aligned with the candle count.
pub struct Ichimoku {
    tenkan_period: usize,
    kijun_period: usize,
    senkou_b_period: usize,
    displacement: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IchimokuOutput {
    pub tenkan: Series,
    pub kijun: Series,
    pub senkou_a: Series,
    pub senkou_b: Series,
    pub chikou: Series,
}

impl IchimokuOutput {
    /// All-or-nothing record view: defined only where every component is.
    pub fn record(&self, index: usize) -> Option<[Decimal; 5]> {
        match (
            self.tenkan[index],
            self.kijun[index],
            self.senkou_a[index],
            self.senkou_b[index],
            self.chikou[index],
        ) {
            (Some(t), Some(k), Some(a), Some(b), Some(c)) => Some([t, k, a, b, c]),
            _ => None,
        }
    }
}

impl Ichimoku {
    /// Standard parameters: 9 / 26 / 52 with a 26-bar displacement.
    pub fn standard() -> Self {
        Self {
            tenkan_period: 9,
            kijun_period: 26,
            senkou_b_period: 52,
            displacement: 26,
        }
    }

    pub fn new(
        tenkan_period: usize,
        kijun_period: usize,
        senkou_b_period: usize,
        displacement: usize,
    ) -> Result<Self, Report<IndicatorError>> {
        if tenkan_period == 0 || kijun_period == 0 || senkou_b_period == 0 {
            bail!(IndicatorError::InvalidPeriod {
                name: "all periods must be > 0".into(),
            });
        }
        Ok(Self {
            tenkan_period,
            kijun_period,
            senkou_b_period,
            displacement,
        })
    }

    /// Midpoint line `(highest high + lowest low) / 2` over `period`.
    fn midpoint(highs: &[Decimal], lows: &[Decimal], period: usize, n: usize) -> Series {
        let values: Vec<Decimal> = window::rolling_max(highs, period)
            .into_iter()
            .zip(window::rolling_min(lows, period))
            .map(|(hh, ll)| (hh + ll) / dec!(2))
            .collect();
        left_pad(values, n)
    }

    pub fn compute_full(
        &self,
        candles: &[Candle],
    ) -> Result<IchimokuOutput, Report<IndicatorError>> {
        ensure_history(candles, self.required_candles())?;
        let n = candles.len();
        let highs = extract(candles, PriceField::High);
        let lows = extract(candles, PriceField::Low);
        let closes: Series = extract(candles, PriceField::Close)
            .into_iter()
            .map(Some)
            .collect();

        let tenkan = Self::midpoint(&highs, &lows, self.tenkan_period, n);
        let kijun = Self::midpoint(&highs, &lows, self.kijun_period, n);

        let senkou_a_raw = zip2(&tenkan, &kijun, |t, k| (t + k) / dec!(2));
        let senkou_a = shift_forward(&senkou_a_raw, self.displacement);

        let senkou_b_raw = Self::midpoint(&highs, &lows, self.senkou_b_period, n);
        let senkou_b = shift_forward(&senkou_b_raw, self.displacement);

        let chikou = shift_backward(&closes, self.displacement);

        Ok(IchimokuOutput {
            tenkan,
            kijun,
            senkou_a,
            senkou_b,
            chikou,
        })
    }
}

impl Indicator for Ichimoku {
    fn name(&self) -> &str {
        "ichimoku"
    }

    fn required_candles(&self) -> usize {
        self.senkou_b_period.max(self.kijun_period).max(self.tenkan_period)
    }

    /// Returns the Kijun (base) line.
    fn compute(&self, candles: &[Candle]) -> Result<Series, Report<IndicatorError>> {
        Ok(self.compute_full(candles)?.kijun)
    }
}
