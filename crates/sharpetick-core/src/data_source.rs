//! Price source trait and request types.
//!
//! [`PriceSource`] is the upstream contract the data service depends on:
//! one endpoint returning the daily bars of a ticker over a date range.
//!
//! # Example
//!
//! ```rust,ignore
//! use sharpetick_core::{BarsRequest, PriceSource, SourceError, Ticker, TradingDate, YahooAdapter};
//!
//! async fn fetch(adapter: &YahooAdapter) -> Result<(), SourceError> {
//!     let request = BarsRequest::new(
//!         Ticker::parse("AAPL")?,
//!         TradingDate::parse("2024-01-02")?,
//!         TradingDate::parse("2024-06-28")?,
//!     )?;
//!     let bars = adapter.daily_bars(request).await?;
//!
//!     for bar in &bars {
//!         println!("{}: {:.2}", bar.date, bar.close);
//!     }
//!
//!     Ok(())
//! }
//! ```

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use crate::{PricePoint, Ticker, TradingDate, ValidationError};

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    Unavailable,
    RateLimited,
    InvalidRequest,
    NotFound,
    Internal,
}

/// Structured upstream error.
///
/// The data service turns it into the per-ticker `error` string; it never
/// aborts a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidRequest,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::NotFound,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether a later request may succeed. Nothing retries automatically.
    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::InvalidRequest => "source.invalid_request",
            SourceErrorKind::NotFound => "source.not_found",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

impl From<ValidationError> for SourceError {
    fn from(error: ValidationError) -> Self {
        Self::invalid_request(error.to_string())
    }
}

/// Request payload for daily bars over an inclusive date range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarsRequest {
    pub ticker: Ticker,
    pub start: TradingDate,
    pub end: TradingDate,
}

impl BarsRequest {
    pub fn new(ticker: Ticker, start: TradingDate, end: TradingDate) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::InvalidDateRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { ticker, start, end })
    }

    /// Range of `calendar_days` ending at `end`.
    pub fn ending_at(ticker: Ticker, end: TradingDate, calendar_days: i64) -> Self {
        Self {
            ticker,
            start: end.minus_days(calendar_days.max(0)),
            end,
        }
    }
}

/// Upstream price source contract.
///
/// Implementations return bars as delivered by the provider; filtering
/// invalid bars and ordering is the data service's job.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` as they are shared across
/// concurrent ticker fetches.
pub trait PriceSource: Send + Sync {
    /// Stable identifier used in logs.
    fn id(&self) -> &'static str;

    /// Fetches the daily bars of `req.ticker` between `req.start` and `req.end`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the provider is unavailable, rate limits
    /// the request, or does not know the ticker.
    fn daily_bars<'a>(
        &'a self,
        req: BarsRequest,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<PricePoint>, SourceError>> + Send + 'a>>;
}
