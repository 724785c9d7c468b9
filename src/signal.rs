//! Signal rules over aligned indicator series. Every rule emits one
//! [`Signal`] per candle: the first candle and any undefined operand
//! always read `Hold`.

use error_stack::{Report, bail};
use rust_decimal::Decimal;

use crate::error::IndicatorError;
use crate::model::{Series, Signal};

/// Crossover rule: a change in the relative order of the two lines
/// between consecutive candles. Fast crossing above slow is a buy,
/// crossing below a sell.
pub fn crossover(fast: &Series, slow: &Series) -> Result<Vec<Signal>, Report<IndicatorError>> {
    if fast.len() != slow.len() {
        bail!(IndicatorError::LengthMismatch {
            expected: fast.len(),
            actual: slow.len(),
        });
    }
    let out = (0..fast.len())
        .map(|i| {
            if i == 0 {
                return Signal::Hold;
            }
            match (fast[i - 1], slow[i - 1], fast[i], slow[i]) {
                (Some(pf), Some(ps), Some(f), Some(s)) => {
                    if pf <= ps && f > s {
                        Signal::Buy
                    } else if pf >= ps && f < s {
                        Signal::Sell
                    } else {
                        Signal::Hold
                    }
                }
                _ => Signal::Hold,
            }
        })
        .collect();
    Ok(out)
}

/// Zero-line rule: a sign change of an oscillator across zero. Crossing
/// up is a buy, crossing down a sell.
pub fn zero_line(series: &Series) -> Vec<Signal> {
    (0..series.len())
        .map(|i| {
            if i == 0 {
                return Signal::Hold;
            }
            match (series[i - 1], series[i]) {
                (Some(prev), Some(cur)) => {
                    if prev <= Decimal::ZERO && cur > Decimal::ZERO {
                        Signal::Buy
                    } else if prev >= Decimal::ZERO && cur < Decimal::ZERO {
                        Signal::Sell
                    } else {
                        Signal::Hold
                    }
                }
                _ => Signal::Hold,
            }
        })
        .collect()
}

/// Threshold-bounce rule: re-entry from beyond a band edge. Climbing
/// back above the oversold level is a buy, dropping back below the
/// overbought level a sell.
pub fn threshold_bounce(
    series: &Series,
    oversold: Decimal,
    overbought: Decimal,
) -> Result<Vec<Signal>, Report<IndicatorError>> {
    if oversold >= overbought {
        bail!(IndicatorError::InvalidPeriod {
            name: "oversold threshold must be below overbought".into(),
        });
    }
    let out = (0..series.len())
        .map(|i| {
            if i == 0 {
                return Signal::Hold;
            }
            match (series[i - 1], series[i]) {
                (Some(prev), Some(cur)) => {
                    if prev < oversold && cur >= oversold {
                        Signal::Buy
                    } else if prev > overbought && cur <= overbought {
                        Signal::Sell
                    } else {
                        Signal::Hold
                    }
                }
                _ => Signal::Hold,
            }
        })
        .collect();
    Ok(out)
}
