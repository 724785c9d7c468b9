//! Series plumbing shared by every indicator: field extraction, alignment
//! padding, undefined-propagating combination, displacement, safe division.

use rust_decimal::Decimal;

use crate::model::{Candle, PriceField, Series};

/// Extract one OHLCV field from a candle sequence, in input order.
pub fn extract(candles: &[Candle], field: PriceField) -> Vec<Decimal> {
    candles
        .iter()
        .map(|c| match field {
            PriceField::Open => c.open,
            PriceField::High => c.high,
            PriceField::Low => c.low,
            PriceField::Close => c.close,
            PriceField::Volume => c.volume,
        })
        .collect()
}

/// Re-align a dense windowed result with the original candle count by
/// prepending `None` entries. `values.len()` must not exceed `target_len`.
pub fn left_pad(values: Vec<Decimal>, target_len: usize) -> Series {
    let pad = target_len - values.len();
    let mut out: Series = Vec::with_capacity(target_len);
    out.resize(pad, None);
    out.extend(values.into_iter().map(Some));
    out
}

/// Like [`left_pad`], but for values that may already contain gaps.
pub fn left_pad_sparse(values: Vec<Option<Decimal>>, target_len: usize) -> Series {
    let pad = target_len - values.len();
    let mut out: Series = Vec::with_capacity(target_len);
    out.resize(pad, None);
    out.extend(values);
    out
}

/// Combine two aligned series positionally. A `None` on either side
/// produces `None`, regardless of the other value.
pub fn zip2<F>(a: &Series, b: &Series, f: F) -> Series
where
    F: Fn(Decimal, Decimal) -> Decimal,
{
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| match (x, y) {
            (Some(x), Some(y)) => Some(f(*x, *y)),
            _ => None,
        })
        .collect()
}

/// Three-way variant of [`zip2`] with the same undefined propagation.
pub fn zip3<F>(a: &Series, b: &Series, c: &Series, f: F) -> Series
where
    F: Fn(Decimal, Decimal, Decimal) -> Decimal,
{
    a.iter()
        .zip(b.iter())
        .zip(c.iter())
        .map(|((x, y), z)| match (x, y, z) {
            (Some(x), Some(y), Some(z)) => Some(f(*x, *y, *z)),
            _ => None,
        })
        .collect()
}

/// Shift a series forward in time by `offset` (leading indicator
/// displacement). `out[i] = series[i - offset]`; the vacated front is
/// `None` and trailing values fall off. Length is preserved.
pub fn shift_forward(series: &Series, offset: usize) -> Series {
    let n = series.len();
    let mut out: Series = Vec::with_capacity(n);
    out.resize(offset.min(n), None);
    out.extend(series.iter().take(n.saturating_sub(offset)).copied());
    out
}

/// Shift a series backward in time by `offset` (lagging indicator
/// displacement). `out[i] = series[i + offset]`; the vacated tail is
/// `None`. Length is preserved.
pub fn shift_backward(series: &Series, offset: usize) -> Series {
    let n = series.len();
    let mut out: Series = series.iter().skip(offset).copied().collect();
    out.resize(n, None);
    out
}

/// Division with an explicit domain fallback for a zero denominator.
///
/// Every formula's documented zero-denominator convention goes through
/// here so the substitution is visible at the call site.
pub fn safe_div(numerator: Decimal, denominator: Decimal, fallback: Decimal) -> Decimal {
    if denominator == Decimal::ZERO {
        fallback
    } else {
        numerator / denominator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn series(values: &[Option<Decimal>]) -> Series {
        values.to_vec()
    }

    #[test]
    fn extract_fields() {
        let candles = vec![Candle {
            timestamp: 60,
            open: dec!(1),
            high: dec!(4),
            low: dec!(0.5),
            close: dec!(2),
            volume: dec!(100),
        }];
        assert_eq!(extract(&candles, PriceField::Open), vec![dec!(1)]);
        assert_eq!(extract(&candles, PriceField::High), vec![dec!(4)]);
        assert_eq!(extract(&candles, PriceField::Low), vec![dec!(0.5)]);
        assert_eq!(extract(&candles, PriceField::Close), vec![dec!(2)]);
        assert_eq!(extract(&candles, PriceField::Volume), vec![dec!(100)]);
    }

    #[test]
    fn left_pad_restores_alignment() {
        let out = left_pad(vec![dec!(2), dec!(3)], 4);
        assert_eq!(out, series(&[None, None, Some(dec!(2)), Some(dec!(3))]));
    }

    #[test]
    fn left_pad_noop_when_full_length() {
        let out = left_pad(vec![dec!(1)], 1);
        assert_eq!(out, series(&[Some(dec!(1))]));
    }

    #[test]
    fn zip2_propagates_undefined() {
        let a = series(&[None, Some(dec!(2)), Some(dec!(3))]);
        let b = series(&[Some(dec!(1)), None, Some(dec!(1))]);
        let out = zip2(&a, &b, |x, y| x - y);
        assert_eq!(out, series(&[None, None, Some(dec!(2))]));
    }

    #[test]
    fn zip3_propagates_undefined() {
        let a = series(&[Some(dec!(1)), Some(dec!(1))]);
        let b = series(&[Some(dec!(2)), None]);
        let c = series(&[Some(dec!(3)), Some(dec!(3))]);
        let out = zip3(&a, &b, &c, |x, y, z| x + y + z);
        assert_eq!(out, series(&[Some(dec!(6)), None]));
    }

    #[test]
    fn shift_forward_pads_front() {
        let s = series(&[Some(dec!(1)), Some(dec!(2)), Some(dec!(3))]);
        let out = shift_forward(&s, 2);
        assert_eq!(out, series(&[None, None, Some(dec!(1))]));
    }

    #[test]
    fn shift_backward_pads_tail() {
        let s = series(&[Some(dec!(1)), Some(dec!(2)), Some(dec!(3))]);
        let out = shift_backward(&s, 1);
        assert_eq!(out, series(&[Some(dec!(2)), Some(dec!(3)), None]));
    }

    #[test]
    fn shift_offset_beyond_length() {
        let s = series(&[Some(dec!(1)), Some(dec!(2))]);
        assert_eq!(shift_forward(&s, 5), series(&[None, None]));
        assert_eq!(shift_backward(&s, 5), series(&[None, None]));
    }

    #[test]
    fn safe_div_normal_and_fallback() {
        assert_eq!(safe_div(dec!(6), dec!(3), dec!(0)), dec!(2));
        assert_eq!(safe_div(dec!(6), dec!(0), dec!(50)), dec!(50));
    }
}
