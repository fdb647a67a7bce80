//! Stock data orchestration: fetch, validate, order and analyse per ticker.
//!
//! Every upstream fetch and every multi-period report may be routed through
//! a [`ResponseCache`]. Failures never escape a ticker: they land in that
//! ticker's `error` field with an empty result, and batches always return
//! one record per requested ticker in input order.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::cache::{get_cached, CacheError, CacheOptions, ResponseCache};
use crate::data_source::{BarsRequest, PriceSource, SourceError};
use crate::{
    AnnotatedPricePoint, Lookback, MultiPeriodReport, Period, PricePoint, PriceSeries,
    SharpeCalculator, SortOrder, Ticker, TradingDate,
};

/// Tag carried by every cached bar series.
pub const BARS_TAG: &str = "bars";
/// Tag carried by every cached multi-period report.
pub const SHARPE_TAG: &str = "sharpe";

/// Tag shared by every cache entry of one ticker.
pub fn ticker_tag(ticker: &Ticker) -> String {
    format!("ticker:{ticker}")
}

/// Sessions an exchange trades in a year, after weekends and holidays.
const SESSIONS_PER_YEAR: i64 = 240;
const DAYS_PER_YEAR: i64 = 365;

/// Calendar days of history holding `2 * lookback_days` sessions on an
/// exchange calendar, plus two weeks of slack.
pub fn calendar_days_for(lookback_days: usize) -> i64 {
    let sessions = 2 * lookback_days as i64;
    (sessions * DAYS_PER_YEAR + SESSIONS_PER_YEAR - 1) / SESSIONS_PER_YEAR + 14
}

/// History requested by default: enough for the year slot of the report.
pub fn default_history_days() -> i64 {
    calendar_days_for(Period::LastYear.trading_days())
}

/// Why a ticker produced no data.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("{source}")]
    Source {
        #[from]
        source: SourceError,
    },
    #[error("fetch for {ticker} timed out after {timeout_ms} ms")]
    Timeout { ticker: Ticker, timeout_ms: u64 },
    #[error("no valid price data returned for {ticker}")]
    Empty { ticker: Ticker },
}

/// Per-ticker raw data result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickerData {
    pub ticker: Ticker,
    pub series: Vec<PricePoint>,
    pub count: usize,
    pub error: Option<String>,
}

impl TickerData {
    fn loaded(ticker: Ticker, series: &PriceSeries, order: SortOrder) -> Self {
        let series = series.ordered(order);
        Self {
            ticker,
            count: series.len(),
            series,
            error: None,
        }
    }

    fn failed(ticker: Ticker, error: String) -> Self {
        Self {
            ticker,
            series: Vec::new(),
            count: 0,
            error: Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Per-ticker multi-period Sharpe result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SharpeReport {
    pub report: MultiPeriodReport,
    pub error: Option<String>,
}

impl SharpeReport {
    pub fn ticker(&self) -> &Ticker {
        &self.report.ticker
    }
}

/// Per-ticker annotated series result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnhancedSeries {
    pub ticker: Ticker,
    pub lookback: Lookback,
    pub points: Vec<AnnotatedPricePoint>,
    pub error: Option<String>,
}

/// Tunables of [`StockDataService`].
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    /// Revalidation window of cached bars and reports.
    pub revalidate: Duration,
    /// Deadline for one upstream fetch; `None` waits indefinitely.
    pub fetch_timeout: Option<Duration>,
    /// Order of `TickerData::series`. Analytics always run chronologically.
    pub order: SortOrder,
    /// Last date of the requested history; `None` means today (UTC).
    pub as_of: Option<TradingDate>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            revalidate: Duration::from_secs(300),
            fetch_timeout: Some(Duration::from_secs(10)),
            order: SortOrder::Chronological,
            as_of: None,
        }
    }
}

/// Fans out ticker fetches and mediates expensive work through the cache.
#[derive(Clone)]
pub struct StockDataService {
    source: Arc<dyn PriceSource>,
    calculator: SharpeCalculator,
    config: ServiceConfig,
}

impl std::fmt::Debug for StockDataService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StockDataService")
            .field("source", &self.source.id())
            .field("calculator", &self.calculator)
            .field("config", &self.config)
            .finish()
    }
}

impl StockDataService {
    pub fn new(source: Arc<dyn PriceSource>) -> Self {
        Self {
            source,
            calculator: SharpeCalculator::new(),
            config: ServiceConfig::default(),
        }
    }

    pub fn with_calculator(mut self, calculator: SharpeCalculator) -> Self {
        self.calculator = calculator;
        self
    }

    pub fn with_config(mut self, config: ServiceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    fn end_date(&self) -> TradingDate {
        self.config.as_of.unwrap_or_else(TradingDate::today)
    }

    /// Fetches, validates and orders the bars of one ticker.
    ///
    /// Upstream failures, timeouts and empty results are reported in
    /// `TickerData::error` with an empty series.
    pub async fn fetch_one(&self, ticker: &Ticker, cache: Option<&dyn ResponseCache>) -> TickerData {
        match self.series(ticker, default_history_days(), cache).await {
            Ok(series) => TickerData::loaded(ticker.clone(), &series, self.config.order),
            Err(error) => TickerData::failed(ticker.clone(), error),
        }
    }

    /// [`fetch_one`](Self::fetch_one) for every ticker concurrently; output
    /// order matches `tickers`.
    pub async fn fetch_many(
        &self,
        tickers: &[Ticker],
        cache: Option<&dyn ResponseCache>,
    ) -> Vec<TickerData> {
        let results = join_all(tickers.iter().map(|ticker| self.fetch_one(ticker, cache))).await;
        let failed = results.iter().filter(|result| !result.is_ok()).count();
        info!(tickers = tickers.len(), failed, "fetched ticker data");
        results
    }

    /// Multi-period Sharpe report for one ticker, cached under
    /// `sharpe:{TICKER}:{END}:rf{RATE}` with the `sharpe` and
    /// `ticker:{TICKER}` tags. The rate is part of the key so services with
    /// different calculators can share one cache.
    pub async fn sharpe_report(
        &self,
        ticker: &Ticker,
        cache: Option<&dyn ResponseCache>,
    ) -> SharpeReport {
        let result = match cache {
            Some(cache) => {
                let end = self.end_date();
                let rate = self.calculator.risk_free_rate();
                let options = CacheOptions::new(format!("sharpe:{ticker}:{end}:rf{rate}"))
                    .with_tag(SHARPE_TAG)
                    .with_tag(ticker_tag(ticker))
                    .with_revalidate(self.config.revalidate);
                let loader = self.loader(ticker.clone(), default_history_days());
                let calculator = self.calculator;
                let owned = ticker.clone();
                get_cached(cache, options, move || async move {
                    let series = loader.load().await?;
                    Ok::<_, FetchError>(calculator.multi_period_sharpe(&series.closes(), owned))
                })
                .await
                .map_err(|error| cache_failure(ticker, &error))
            }
            None => self
                .loader(ticker.clone(), default_history_days())
                .load()
                .await
                .map(|series| {
                    self.calculator
                        .multi_period_sharpe(&series.closes(), ticker.clone())
                })
                .map_err(|error| fetch_failure(ticker, &error)),
        };

        match result {
            Ok(report) => SharpeReport {
                report,
                error: None,
            },
            Err(error) => SharpeReport {
                report: MultiPeriodReport::empty(ticker.clone()),
                error: Some(error),
            },
        }
    }

    /// [`sharpe_report`](Self::sharpe_report) for every ticker concurrently.
    pub async fn sharpe_reports(
        &self,
        tickers: &[Ticker],
        cache: Option<&dyn ResponseCache>,
    ) -> Vec<SharpeReport> {
        let reports = join_all(tickers.iter().map(|ticker| self.sharpe_report(ticker, cache))).await;
        let failed = reports.iter().filter(|report| report.error.is_some()).count();
        info!(tickers = tickers.len(), failed, "computed sharpe reports");
        reports
    }

    /// Chronological series annotated with the rolling metrics of `lookback`.
    pub async fn enhanced_series(
        &self,
        ticker: &Ticker,
        lookback: Lookback,
        cache: Option<&dyn ResponseCache>,
    ) -> EnhancedSeries {
        let history = calendar_days_for(lookback.days()).max(default_history_days());
        match self.series(ticker, history, cache).await {
            Ok(series) => EnhancedSeries {
                ticker: ticker.clone(),
                lookback,
                points: self.calculator.enhance_with_metrics(&series, lookback.days()),
                error: None,
            },
            Err(error) => EnhancedSeries {
                ticker: ticker.clone(),
                lookback,
                points: Vec::new(),
                error: Some(error),
            },
        }
    }

    async fn series(
        &self,
        ticker: &Ticker,
        calendar_days: i64,
        cache: Option<&dyn ResponseCache>,
    ) -> Result<PriceSeries, String> {
        let loader = self.loader(ticker.clone(), calendar_days);
        match cache {
            Some(cache) => {
                let request = &loader.request;
                let options =
                    CacheOptions::new(format!("bars:{ticker}:{}:{}", request.start, request.end))
                        .with_tag(BARS_TAG)
                        .with_tag(ticker_tag(ticker))
                        .with_revalidate(self.config.revalidate);
                get_cached(cache, options, move || loader.load())
                    .await
                    .map_err(|error| cache_failure(ticker, &error))
            }
            None => loader
                .load()
                .await
                .map_err(|error| fetch_failure(ticker, &error)),
        }
    }

    fn loader(&self, ticker: Ticker, calendar_days: i64) -> SeriesLoader {
        SeriesLoader {
            source: Arc::clone(&self.source),
            request: BarsRequest::ending_at(ticker, self.end_date(), calendar_days),
            timeout: self.config.fetch_timeout,
        }
    }
}

/// Owned fetch of one validated series; runs inside cache computations.
struct SeriesLoader {
    source: Arc<dyn PriceSource>,
    request: BarsRequest,
    timeout: Option<Duration>,
}

impl SeriesLoader {
    async fn load(self) -> Result<PriceSeries, FetchError> {
        let ticker = self.request.ticker.clone();
        let fetch = self.source.daily_bars(self.request);
        let bars = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, fetch).await.map_err(|_| {
                FetchError::Timeout {
                    ticker: ticker.clone(),
                    timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                }
            })??,
            None => fetch.await?,
        };

        let fetched = bars.len();
        let valid = bars
            .into_iter()
            .filter(PricePoint::is_valid)
            .collect::<Vec<_>>();
        if valid.len() < fetched {
            warn!(
                ticker = %ticker,
                dropped = fetched - valid.len(),
                "dropped invalid bars"
            );
        }
        if valid.is_empty() {
            return Err(FetchError::Empty { ticker });
        }
        Ok(PriceSeries::new(valid))
    }
}

fn fetch_failure(ticker: &Ticker, error: &FetchError) -> String {
    warn!(ticker = %ticker, %error, "ticker fetch failed");
    error.to_string()
}

fn cache_failure(ticker: &Ticker, error: &CacheError) -> String {
    warn!(ticker = %ticker, %error, "ticker fetch failed");
    error.message().to_owned()
}
