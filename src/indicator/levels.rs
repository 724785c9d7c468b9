use error_stack::{Report, bail};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::IndicatorError;
use crate::model::Candle;

/// A round-number price level with its touch statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceLevel {
    pub price: Decimal,
    pub touches: usize,
    pub strength: Decimal,
}

/// Psychological level detection: a grid of round prices spanning the
/// observed range, ranked by how often candle ranges straddle them.
pub struct PsychLevels;

impl PsychLevels {
    /// Grid step for a given price range: the largest power of ten not
    /// exceeding the range, halved until the range spans at least five
    /// steps.
    fn grid_step(range: Decimal) -> Decimal {
        let mut step = dec!(1);
        while step * dec!(10) <= range {
            step *= dec!(10);
        }
        while range / step < dec!(5) {
            step /= dec!(2);
        }
        step
    }

    pub fn detect(&self, candles: &[Candle]) -> Result<Vec<PriceLevel>, Report<IndicatorError>> {
        if candles.is_empty() {
            bail!(IndicatorError::EmptyInput);
        }
        let min_low = candles
            .iter()
            .map(|c| c.low)
            .min()
            .unwrap_or(Decimal::ZERO);
        let max_high = candles
            .iter()
            .map(|c| c.high)
            .max()
            .unwrap_or(Decimal::ZERO);
        let count = Decimal::from(candles.len());

        // A flat history has no range to derive a grid from; the single
        // traded price is the only level, touched by every candle.
        if min_low == max_high {
            return Ok(vec![PriceLevel {
                price: min_low,
                touches: candles.len(),
                strength: dec!(1),
            }]);
        }

        let step = Self::grid_step(max_high - min_low);
        let mut levels = Vec::new();
        let mut price = (min_low / step).ceil() * step;
        while price <= max_high {
            let touches = candles
                .iter()
                .filter(|c| c.low <= price && price <= c.high)
                .count();
            if touches > 0 {
                levels.push(PriceLevel {
                    price,
                    touches,
                    strength: Decimal::from(touches) / count,
                });
            }
            price += step;
        }

        levels.sort_by(|a, b| b.strength.cmp(&a.strength).then(a.price.cmp(&b.price)));
        Ok(levels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicator::testutil::{candles_from_closes, candles_from_hlc};

    #[test]
    fn empty_input_is_an_error() {
        assert!(PsychLevels.detect(&[]).is_err());
    }

    #[test]
    fn grid_step_scales_with_range() {
        assert_eq!(PsychLevels::grid_step(dec!(80)), dec!(10));
        assert_eq!(PsychLevels::grid_step(dec!(8)), dec!(1));
        // Range 3 spans fewer than five unit steps: 1 -> 0.5.
        assert_eq!(PsychLevels::grid_step(dec!(3)), dec!(0.5));
        // 1000 -> 500 -> 250, the first step the range spans five times.
        assert_eq!(PsychLevels::grid_step(dec!(1500)), dec!(250));
    }

    #[test]
    fn flat_history_yields_single_full_strength_level() {
        let levels = PsychLevels
            .detect(&candles_from_closes(&[dec!(42); 4]))
            .unwrap();
        assert_eq!(
            levels,
            vec![PriceLevel {
                price: dec!(42),
                touches: 4,
                strength: dec!(1),
            }]
        );
    }

    #[test]
    fn levels_are_multiples_of_the_step_within_the_range() {
        let candles = candles_from_hlc(&[
            (dec!(107), dec!(93), dec!(100)),
            (dec!(108), dec!(94), dec!(101)),
            (dec!(109), dec!(95), dec!(102)),
        ]);
        let levels = PsychLevels.detect(&candles).unwrap();
        // Range 16 gives step 2.5 (10 halved twice); every level is on
        // that grid.
        for level in &levels {
            assert_eq!(level.price % dec!(2.5), Decimal::ZERO);
            assert!(level.price >= dec!(93) && level.price <= dec!(109));
            assert!(level.touches >= 1);
        }
    }

    #[test]
    fn strength_ranks_by_touch_count() {
        let candles = candles_from_hlc(&[
            (dec!(12), dec!(8), dec!(10)),
            (dec!(12), dec!(8), dec!(10)),
            (dec!(16), dec!(11.5), dec!(12)),
        ]);
        let levels = PsychLevels.detect(&candles).unwrap();
        assert!(!levels.is_empty());
        for pair in levels.windows(2) {
            assert!(pair[0].strength >= pair[1].strength);
        }
        // 12 lies inside every candle's range.
        let top = &levels[0];
        assert_eq!(top.price, dec!(12));
        assert_eq!(top.touches, 3);
        assert_eq!(top.strength, dec!(1));
    }
}
