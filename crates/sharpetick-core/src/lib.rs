//! # Sharpetick Core
//!
//! Rolling return, volatility and Sharpe analytics over daily price series,
//! fronted by a single-flight compute-or-fetch cache.
//!
//! ## Overview
//!
//! - **Analytics engine**: pure, synchronous returns, statistics and
//!   Sharpe computations, including a leakage-free rolling annotation
//! - **Response cache**: compute-or-fetch with TTL, tag invalidation and
//!   per-key single-flight
//! - **Data service**: concurrent per-ticker fetch, validation and ordering
//!   with isolated failures
//! - **Price source**: adapter trait with a Yahoo implementation
//! - **Boundary payloads**: request validation and camelCase responses
//! - **Watch-list**: persisted default tickers behind a store port
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Price source adapters (Yahoo, real and mock) |
//! | [`analytics`] | Returns, statistics and the Sharpe calculator |
//! | [`api`] | Request validation and response payloads |
//! | [`cache`] | Compute-or-fetch cache contract and in-memory store |
//! | [`circuit_breaker`] | Circuit breaker for upstream calls |
//! | [`data_source`] | Price source trait and request types |
//! | [`domain`] | Domain models (PricePoint, PriceSeries, SharpeMetrics) |
//! | [`error`] | Validation errors |
//! | [`http_client`] | HTTP client abstraction |
//! | [`service`] | Stock data orchestration |
//! | [`watchlist`] | Watch-list state and persistence |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sharpetick_core::{CacheStore, StockDataService, Ticker, YahooAdapter};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = StockDataService::new(Arc::new(YahooAdapter::mock()));
//!     let cache = CacheStore::with_default_ttl();
//!
//!     let report = service.sharpe_report(&Ticker::parse("AAPL")?, Some(&cache)).await;
//!     if let Some(month) = report.report.last_month {
//!         println!("AAPL 21-session Sharpe: {:.2}", month.sharpe_ratio);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  CLI / API      │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ StockDataService│────▶│ ResponseCache    │
//! └────────┬────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ PriceSource     │────▶│ Circuit Breaker  │
//! │ (Adapter Trait) │     │ + HTTP Client    │
//! └────────┬────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ SharpeCalculator│
//! └─────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! Invalid input is rejected at the boundary with [`ValidationError`].
//! Insufficient history is `None`, never an error. Upstream failures are
//! reported per ticker:
//!
//! ```rust
//! use sharpetick_core::{SourceError, SourceErrorKind};
//!
//! fn describe(error: &SourceError) -> &'static str {
//!     match error.kind() {
//!         SourceErrorKind::RateLimited => "try again later",
//!         SourceErrorKind::NotFound => "unknown ticker",
//!         _ => "upstream unavailable",
//!     }
//! }
//!
//! assert_eq!(describe(&SourceError::not_found("ZZZZ")), "unknown ticker");
//! ```

pub mod adapters;
pub mod analytics;
pub mod api;
pub mod cache;
pub mod circuit_breaker;
pub mod data_source;
pub mod domain;
pub mod error;
pub mod http_client;
pub mod service;
pub mod watchlist;

// Adapter implementations
pub use adapters::YahooAdapter;

// Analytics
pub use analytics::SharpeCalculator;

// Boundary payloads
pub use api::{
    parse_ticker_input, AnalysisRequest, EnhancedSeriesResponse, PeriodMetrics,
    SharpeReportResponse, TickerDataResponse, ValidatedRequest,
};

// Caching
pub use cache::{get_cached, CacheError, CacheMode, CacheOptions, CacheStore, ResponseCache};

// Circuit breaker
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};

// Price source trait and types
pub use data_source::{BarsRequest, PriceSource, SourceError, SourceErrorKind};

// Domain models
pub use domain::{
    AnnotatedPricePoint, Lookback, MultiPeriodReport, Period, PricePoint, PriceSeries,
    SharpeMetrics, SortOrder, Ticker, TradingDate,
};

// Error types
pub use error::ValidationError;

// HTTP client types
pub use http_client::{
    HttpClient, HttpError, HttpRequest, HttpResponse, NoopHttpClient, ReqwestHttpClient,
};

// Data service
pub use service::{
    EnhancedSeries, FetchError, ServiceConfig, SharpeReport, StockDataService, TickerData,
};

// Watch-list
pub use watchlist::{
    InMemoryWatchlistStore, JsonFileWatchlistStore, Watchlist, WatchlistError, WatchlistStore,
};
