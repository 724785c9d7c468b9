//! Technical-indicator computation engine over OHLCV candle series.
//!
//! All arithmetic is exact base-10 ([`rust_decimal::Decimal`]); every
//! indicator output is aligned 1:1 with its input candles, with warm-up
//! positions marked `None`.

pub mod config;
pub mod divergence;
pub mod error;
pub mod indicator;
pub mod model;
pub mod series;
pub mod signal;
pub mod window;
