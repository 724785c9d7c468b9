use error_stack::{Report, bail};
use rust_decimal::Decimal;

use crate::error::IndicatorError;
use crate::indicator::{Indicator, ensure_history};
use crate::model::{Candle, PriceField, Series};
use crate::series::{extract, left_pad, zip2};
use crate::window;

/// Elder-Ray: bull power `high - EMA(close)` and bear power
/// `low - EMA(close)`.
pub struct ElderRay {
    period: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElderRayOutput {
    pub bull: Series,
    pub bear: Series,
}

impl ElderRayOutput {
    /// All-or-nothing record view: defined only where both powers are.
    pub fn record(&self, index: usize) -> Option<(Decimal, Decimal)> {
        match (self.bull[index], self.bear[index]) {
            (Some(bull), Some(bear)) => Some((bull, bear)),
            _ => None,
        }
    }
}

impl ElderRay {
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

    pub fn compute_full(
        &self,
        candles: &[Candle],
    ) -> Result<ElderRayOutput, Report<IndicatorError>> {
        ensure_history(candles, self.required_candles())?;
        let n = candles.len();
        let closes = extract(candles, PriceField::Close);
        let ema = left_pad(window::ema(&closes, self.period), n);

        let highs: Series = extract(candles, PriceField::High)
            .into_iter()
            .map(Some)
            .collect();
        let lows: Series = extract(candles, PriceField::Low)
            .into_iter()
            .map(Some)
            .collect();

        Ok(ElderRayOutput {
            bull: zip2(&highs, &ema, |high, e| high - e),
            bear: zip2(&lows, &ema, |low, e| low - e),
        })
    }
}

impl Indicator for ElderRay {
    fn name(&self) -> &str {
        "elder_ray"
    }

    fn required_candles(&self) -> usize {
        self.period
    }

    /// Returns the bull-power line.
    fn compute(&self, candles: &[Candle]) -> Result<Series, Report<IndicatorError>> {
        Ok(self.compute_full(candles)?.bull)
    }
}
