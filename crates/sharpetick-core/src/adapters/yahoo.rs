use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::circuit_breaker::CircuitBreaker;
use crate::data_source::{BarsRequest, PriceSource, SourceError};
use crate::http_client::{HttpClient, HttpRequest};
use crate::{PricePoint, Ticker, TradingDate};

const CHART_ENDPOINT: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Yahoo Finance daily bars, either from the chart API or from a
/// deterministic synthetic generator.
///
/// Mock mode needs no network and produces the same bars for the same
/// ticker and date on every run, which keeps offline runs and tests stable.
#[derive(Clone)]
pub struct YahooAdapter {
    http_client: Option<Arc<dyn HttpClient>>,
    circuit_breaker: Arc<CircuitBreaker>,
    timeout_ms: u64,
}

impl Default for YahooAdapter {
    fn default() -> Self {
        Self::mock()
    }
}

impl std::fmt::Debug for YahooAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooAdapter")
            .field("mock", &self.is_mock())
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

impl YahooAdapter {
    /// Offline adapter generating synthetic bars.
    pub fn mock() -> Self {
        Self {
            http_client: None,
            circuit_breaker: Arc::new(CircuitBreaker::default().for_source("yahoo")),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    /// Adapter calling the Yahoo chart API through `http_client`.
    pub fn with_http_client(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client: Some(http_client),
            ..Self::mock()
        }
    }

    pub fn with_circuit_breaker(mut self, circuit_breaker: Arc<CircuitBreaker>) -> Self {
        self.circuit_breaker = circuit_breaker;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn is_mock(&self) -> bool {
        self.http_client.is_none()
    }

    async fn fetch_real_bars(
        &self,
        http_client: &dyn HttpClient,
        req: &BarsRequest,
    ) -> Result<Vec<PricePoint>, SourceError> {
        if !self.circuit_breaker.allow_request() {
            let retry_secs = self
                .circuit_breaker
                .retry_after()
                .map_or(0, |left| left.as_secs());
            return Err(SourceError::unavailable(format!(
                "yahoo circuit breaker is open; skipping upstream call (retry in {retry_secs}s)"
            )));
        }

        // period2 is exclusive, so ask for the day after `end`.
        let request = HttpRequest::get(format!(
            "{CHART_ENDPOINT}/{}",
            urlencoding::encode(req.ticker.as_str())
        ))
        .with_query("period1", req.start.unix_timestamp().to_string())
        .with_query("period2", req.end.plus_days(1).unix_timestamp().to_string())
        .with_query("interval", "1d")
        .with_query("includePrePost", "false")
        .with_header("referer", "https://finance.yahoo.com/")
        .with_timeout_ms(self.timeout_ms);

        let response = http_client.execute(request).await.map_err(|error| {
            self.circuit_breaker.record_failure();
            if error.retryable() {
                SourceError::unavailable(format!("yahoo transport error: {}", error.message()))
            } else {
                SourceError::internal(format!("yahoo transport error: {}", error.message()))
            }
        })?;

        match response.status {
            404 => {
                // The upstream answered; an unknown ticker is not an outage.
                self.circuit_breaker.record_success();
                return Err(SourceError::not_found(format!(
                    "yahoo has no chart for '{}'",
                    req.ticker
                )));
            }
            429 => {
                self.circuit_breaker.record_failure();
                return Err(SourceError::rate_limited("yahoo rate limited the chart request"));
            }
            status if !response.is_success() => {
                self.circuit_breaker.record_failure();
                return Err(SourceError::unavailable(format!(
                    "yahoo returned status {status}"
                )));
            }
            _ => self.circuit_breaker.record_success(),
        }

        parse_chart(&req.ticker, &response.body)
    }

    fn fetch_fake_bars(&self, req: &BarsRequest) -> Vec<PricePoint> {
        let seed = ticker_seed(&req.ticker);
        let mut bars = Vec::new();
        let mut date = req.start;
        while date <= req.end {
            if !date.is_weekend() {
                bars.push(synthetic_bar(seed, date));
            }
            date = date.plus_days(1);
        }
        bars
    }
}

impl PriceSource for YahooAdapter {
    fn id(&self) -> &'static str {
        if self.is_mock() {
            "yahoo-mock"
        } else {
            "yahoo"
        }
    }

    fn daily_bars<'a>(
        &'a self,
        req: BarsRequest,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<PricePoint>, SourceError>> + Send + 'a>> {
        Box::pin(async move {
            let bars = match &self.http_client {
                Some(http_client) => self.fetch_real_bars(http_client.as_ref(), &req).await?,
                None => self.fetch_fake_bars(&req),
            };
            debug!(
                ticker = %req.ticker,
                source = self.id(),
                bars = bars.len(),
                "fetched daily bars"
            );
            Ok(bars)
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartResponse {
    chart: YahooChartData,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartData {
    #[serde(default)]
    result: Option<Vec<YahooChartResult>>,
    #[serde(default)]
    error: Option<YahooChartError>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartError {
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartResult {
    #[serde(default)]
    timestamp: Option<Vec<i64>>,
    indicators: YahooChartIndicators,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartIndicators {
    quote: Vec<YahooChartQuote>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

fn parse_chart(ticker: &Ticker, body: &str) -> Result<Vec<PricePoint>, SourceError> {
    let chart: YahooChartResponse = serde_json::from_str(body)
        .map_err(|e| SourceError::internal(format!("failed to parse yahoo chart: {e}")))?;

    if let Some(error) = chart.chart.error {
        return Err(if error.code.eq_ignore_ascii_case("not found") {
            SourceError::not_found(format!("yahoo: {}", error.description))
        } else {
            SourceError::unavailable(format!(
                "yahoo chart API error {}: {}",
                error.code, error.description
            ))
        });
    }

    let Some(result) = chart.chart.result.and_then(|results| results.into_iter().next()) else {
        return Ok(Vec::new());
    };
    // A range without sessions comes back without timestamps.
    let Some(timestamps) = result.timestamp else {
        return Ok(Vec::new());
    };
    let Some(quote) = result.indicators.quote.into_iter().next() else {
        return Ok(Vec::new());
    };

    let mut bars = Vec::with_capacity(timestamps.len());
    let mut skipped = 0_usize;
    for (i, ts) in timestamps.into_iter().enumerate() {
        let field = |values: &[Option<f64>]| values.get(i).copied().flatten();
        let (Some(open), Some(high), Some(low), Some(close)) = (
            field(quote.open.as_slice()),
            field(quote.high.as_slice()),
            field(quote.low.as_slice()),
            field(quote.close.as_slice()),
        ) else {
            skipped += 1;
            continue;
        };
        let Ok(date) = TradingDate::from_unix_timestamp(ts) else {
            skipped += 1;
            continue;
        };
        let volume = field(quote.volume.as_slice()).unwrap_or(0.0);
        bars.push(PricePoint::new(date, open, high, low, close, volume));
    }

    if skipped > 0 {
        warn!(ticker = %ticker, skipped, "yahoo chart contained incomplete sessions");
    }
    Ok(bars)
}

fn ticker_seed(ticker: &Ticker) -> u64 {
    ticker.as_str().bytes().fold(0_u64, |acc, byte| {
        acc.wrapping_mul(33).wrapping_add(byte as u64)
    })
}

// splitmix64 finalizer; maps a seed to a well-mixed 64-bit value.
fn mix(mut value: u64) -> u64 {
    value = value.wrapping_add(0x9E37_79B9_7F4A_7C15);
    value = (value ^ (value >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    value = (value ^ (value >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    value ^ (value >> 31)
}

/// Uniform value in `[-1, 1]`.
fn unit_noise(seed: u64, salt: u64) -> f64 {
    let bits = mix(seed ^ mix(salt)) >> 11;
    (bits as f64 / (1_u64 << 53) as f64) * 2.0 - 1.0
}

/// Bar for `date` that depends only on the ticker and the date, so
/// overlapping ranges agree.
fn synthetic_bar(seed: u64, date: TradingDate) -> PricePoint {
    let day = date.unix_timestamp().div_euclid(86_400);
    let base = 40.0 + (seed % 260) as f64;
    let phase = (seed % 360) as f64;
    let drift = 1.0 + day as f64 * 0.000_02;

    let wave = 1.0 + 0.12 * ((day as f64) / 41.0 + phase).sin();
    let close = base * drift * wave * (1.0 + 0.015 * unit_noise(seed, day as u64));
    let open = close * (1.0 + 0.006 * unit_noise(seed.rotate_left(17), day as u64));
    let high = open.max(close) * (1.0 + 0.004 * unit_noise(seed.rotate_left(29), day as u64).abs());
    let low = open.min(close) * (1.0 - 0.004 * unit_noise(seed.rotate_left(41), day as u64).abs());
    let volume = 500_000.0 + (mix(seed ^ day as u64) % 4_500_000) as f64;

    PricePoint::new(date, open, high, low, close, volume.round())
}
