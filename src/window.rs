//! Rolling-window reduction primitives. Every moving-average flavour in the
//! indicator library is built from these.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Which end of the ordering a windowed extremum selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extremum {
    Max,
    Min,
}

/// Arithmetic mean of a non-empty window.
pub fn mean(window: &[Decimal]) -> Decimal {
    window.iter().copied().sum::<Decimal>() / Decimal::from(window.len())
}

/// Weighted mean with ascending integer weights `1..=n` and triangular
/// divisor `n(n+1)/2`, so the most recent value weighs the most.
pub fn weighted_mean(window: &[Decimal]) -> Decimal {
    let n = window.len();
    let weighted: Decimal = window
        .iter()
        .enumerate()
        .map(|(i, &v)| v * Decimal::from(i + 1))
        .sum();
    let triangular = Decimal::from(n * (n + 1) / 2);
    weighted / triangular
}

/// Dense simple moving average: `values.len() - period + 1` outputs.
/// Caller guarantees `period >= 1` and `values.len() >= period`.
pub fn sma(values: &[Decimal], period: usize) -> Vec<Decimal> {
    values.windows(period).map(mean).collect()
}

/// Dense weighted moving average, same shape contract as [`sma`].
pub fn wma(values: &[Decimal], period: usize) -> Vec<Decimal> {
    values.windows(period).map(weighted_mean).collect()
}

/// Dense exponential moving average, same shape contract as [`sma`].
///
/// Seeded with the SMA of the first `period` values (emitted at the first
/// full window, index `period - 1` of the input); subsequent terms use
/// multiplier `k = 2/(period+1)`:
///
/// ```text
/// ema[i] = price[i] * k + ema[i-1] * (1 - k)
/// ```
///
/// The recurrence is canonical — reimplementations must match it
/// term-for-term, including the seed index.
pub fn ema(values: &[Decimal], period: usize) -> Vec<Decimal> {
    let k = dec!(2) / Decimal::from(period + 1);
    let one_minus_k = dec!(1) - k;

    let seed = mean(&values[..period]);
    let mut out = Vec::with_capacity(values.len() - period + 1);
    out.push(seed);

    let mut prev = seed;
    for &value in &values[period..] {
        prev = value * k + prev * one_minus_k;
        out.push(prev);
    }
    out
}

/// Index of the extreme value in a non-empty window. When several elements
/// tie for the extreme, the first occurrence wins.
pub fn extremum_index(window: &[Decimal], kind: Extremum) -> usize {
    let mut best = 0;
    for (i, &v) in window.iter().enumerate().skip(1) {
        let better = match kind {
            Extremum::Max => v > window[best],
            Extremum::Min => v < window[best],
        };
        if better {
            best = i;
        }
    }
    best
}

/// Dense rolling maximum, same shape contract as [`sma`].
pub fn rolling_max(values: &[Decimal], period: usize) -> Vec<Decimal> {
    values
        .windows(period)
        .map(|w| w[extremum_index(w, Extremum::Max)])
        .collect()
}

/// Dense rolling minimum, same shape contract as [`sma`].
pub fn rolling_min(values: &[Decimal], period: usize) -> Vec<Decimal> {
    values
        .windows(period)
        .map(|w| w[extremum_index(w, Extremum::Min)])
        .collect()
}
