//! # Domain Models
//!
//! Canonical types shared by the analytics engine, the data service and the
//! boundary payloads.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`PricePoint`] | One daily OHLCV session |
//! | [`PriceSeries`] | Chronologically ordered sessions |
//! | [`SharpeMetrics`] | Trailing return, volatility and Sharpe for one lookback |
//! | [`MultiPeriodReport`] | Six named lookback slots for one ticker |
//! | [`AnnotatedPricePoint`] | Session plus its point-in-time metrics |
//! | [`Period`] | Named lookback slot and its trading-day constant |
//! | [`Ticker`] | Validated `^[A-Z]{1,5}$` symbol |
//! | [`Lookback`] | Validated window length in `[1, 1000]` |
//! | [`TradingDate`] | Calendar date serialized as `YYYY-MM-DD` |
//!
//! Validating types enforce their invariants at construction:
//!
//! ```rust
//! use sharpetick_core::{Lookback, Ticker, ValidationError};
//!
//! assert!(Ticker::parse("AAPL").is_ok());
//! assert!(matches!(Ticker::parse("aapl"), Err(ValidationError::TickerInvalidChar { .. })));
//! assert!(matches!(Lookback::new(0), Err(ValidationError::InvalidLookback { .. })));
//! ```

mod date;
mod lookback;
mod metrics;
mod models;
mod ticker;

pub use date::TradingDate;
pub use lookback::Lookback;
pub use metrics::{AnnotatedPricePoint, MultiPeriodReport, Period, SharpeMetrics};
pub use models::{PricePoint, PriceSeries, SortOrder};
pub use ticker::Ticker;
