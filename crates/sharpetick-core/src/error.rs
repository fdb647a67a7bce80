use thiserror::Error;

/// Validation and contract errors exposed by `sharpetick-core`.
///
/// These are raised at the boundary, before any fetch or computation runs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("ticker cannot be empty")]
    EmptyTicker,
    #[error("ticker length {len} exceeds max {max}")]
    TickerTooLong { len: usize, max: usize },
    #[error("ticker contains invalid character '{ch}' at index {index}, expected A-Z")]
    TickerInvalidChar { ch: char, index: usize },

    #[error("request must include at least one ticker")]
    NoTickers,
    #[error("request includes {count} tickers, max is {max}")]
    TooManyTickers { count: usize, max: usize },

    #[error("lookback must be an integer, got '{value}'")]
    LookbackNotInteger { value: String },
    #[error("lookback {value} is outside [{min}, {max}]")]
    InvalidLookback { value: i64, min: u32, max: u32 },

    #[error("date must be ISO-8601 (YYYY-MM-DD): '{value}'")]
    InvalidDate { value: String },
    #[error("date range start {start} is after end {end}")]
    InvalidDateRange { start: String, end: String },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
}
