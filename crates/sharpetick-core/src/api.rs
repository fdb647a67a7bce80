//! Boundary request validation and response payloads.
//!
//! Requests are validated here, before any fetch or computation, so the
//! analytics engine only ever sees typed [`Ticker`]s and [`Lookback`]s.
//! Responses use camelCase JSON field names.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::service::{EnhancedSeries, SharpeReport, TickerData};
use crate::{AnnotatedPricePoint, Lookback, PricePoint, SharpeMetrics, Ticker, ValidationError};

/// Maximum number of tickers accepted by one request.
pub const MAX_TICKERS: usize = 10;

/// Splits free text on commas, trims, upper-cases, drops empty items and
/// de-duplicates while keeping the first occurrence.
///
/// The result is not validated; pass it through [`AnalysisRequest::validate`].
///
/// ```rust
/// use sharpetick_core::api::parse_ticker_input;
///
/// assert_eq!(parse_ticker_input("aapl, aapl, googl"), vec!["AAPL", "GOOGL"]);
/// ```
pub fn parse_ticker_input(input: &str) -> Vec<String> {
    let mut tickers: Vec<String> = Vec::new();
    for item in input.split(',') {
        let normalized = item.trim().to_uppercase();
        if normalized.is_empty() || tickers.contains(&normalized) {
            continue;
        }
        tickers.push(normalized);
    }
    tickers
}

/// Raw analysis request as it arrives at the boundary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub tickers: Vec<String>,
    /// Kept untyped so non-integer input is reported instead of rejected by the decoder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lookback: Option<Value>,
}

impl AnalysisRequest {
    /// Request from free-text tickers and an optional lookback string.
    pub fn from_text(tickers: &str, lookback: Option<&str>) -> Self {
        Self {
            tickers: parse_ticker_input(tickers),
            lookback: lookback.map(|value| Value::String(value.to_owned())),
        }
    }

    pub fn validate(&self) -> Result<ValidatedRequest, ValidationError> {
        if self.tickers.is_empty() {
            return Err(ValidationError::NoTickers);
        }
        if self.tickers.len() > MAX_TICKERS {
            return Err(ValidationError::TooManyTickers {
                count: self.tickers.len(),
                max: MAX_TICKERS,
            });
        }

        let tickers = self
            .tickers
            .iter()
            .map(|ticker| Ticker::parse(ticker))
            .collect::<Result<Vec<_>, _>>()?;

        let lookback = self.lookback.as_ref().map(parse_lookback).transpose()?;

        Ok(ValidatedRequest { tickers, lookback })
    }
}

fn parse_lookback(value: &Value) -> Result<Lookback, ValidationError> {
    match value {
        Value::Number(number) => match number.as_i64() {
            Some(value) => Lookback::new(value),
            None => Err(ValidationError::LookbackNotInteger {
                value: number.to_string(),
            }),
        },
        Value::String(text) => text.parse(),
        other => Err(ValidationError::LookbackNotInteger {
            value: other.to_string(),
        }),
    }
}

/// Request that passed boundary validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    pub tickers: Vec<Ticker>,
    pub lookback: Option<Lookback>,
}

impl ValidatedRequest {
    pub fn lookback_or_default(&self) -> Lookback {
        self.lookback.unwrap_or_default()
    }
}

/// Raw data response for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerDataResponse {
    pub ticker: String,
    pub historical_data: Vec<PricePoint>,
    pub days_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<TickerData> for TickerDataResponse {
    fn from(data: TickerData) -> Self {
        Self {
            ticker: data.ticker.into(),
            historical_data: data.series,
            days_count: data.count,
            error: data.error,
        }
    }
}

/// One period slot of a [`SharpeReportResponse`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodMetrics {
    pub sharpe_ratio: f64,
    pub trailing_return: f64,
    pub std_dev: f64,
}

impl From<SharpeMetrics> for PeriodMetrics {
    fn from(metrics: SharpeMetrics) -> Self {
        Self {
            sharpe_ratio: metrics.sharpe_ratio,
            trailing_return: metrics.trailing_return,
            std_dev: metrics.std_dev,
        }
    }
}

/// Multi-period Sharpe response for one ticker. Missing periods serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharpeReportResponse {
    pub ticker: String,
    pub yesterday: Option<PeriodMetrics>,
    pub last_week: Option<PeriodMetrics>,
    pub last_month: Option<PeriodMetrics>,
    pub last_quarter: Option<PeriodMetrics>,
    pub last_semester: Option<PeriodMetrics>,
    pub last_year: Option<PeriodMetrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<SharpeReport> for SharpeReportResponse {
    fn from(value: SharpeReport) -> Self {
        let report = value.report;
        Self {
            ticker: report.ticker.into(),
            yesterday: report.yesterday.map(PeriodMetrics::from),
            last_week: report.last_week.map(PeriodMetrics::from),
            last_month: report.last_month.map(PeriodMetrics::from),
            last_quarter: report.last_quarter.map(PeriodMetrics::from),
            last_semester: report.last_semester.map(PeriodMetrics::from),
            last_year: report.last_year.map(PeriodMetrics::from),
            error: value.error,
        }
    }
}

/// Annotated series response for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancedSeriesResponse {
    pub ticker: String,
    pub lookback: u32,
    pub historical_data: Vec<AnnotatedPricePoint>,
    pub days_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<EnhancedSeries> for EnhancedSeriesResponse {
    fn from(series: EnhancedSeries) -> Self {
        Self {
            ticker: series.ticker.into(),
            lookback: series.lookback.get(),
            days_count: series.points.len(),
            historical_data: series.points,
            error: series.error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MultiPeriodReport;
    use serde_json::json;

    fn request(tickers: &[&str], lookback: Option<Value>) -> AnalysisRequest {
        AnalysisRequest {
            tickers: tickers.iter().map(|t| t.to_string()).collect(),
            lookback,
        }
    }

    #[test]
    fn parse_ticker_input_normalises_and_dedupes() {
        assert_eq!(parse_ticker_input("aapl, aapl, googl"), vec!["AAPL", "GOOGL"]);
        assert_eq!(parse_ticker_input(" msft ,, ,ibm,MSFT"), vec!["MSFT", "IBM"]);
        assert!(parse_ticker_input(" , ").is_empty());
    }

    #[test]
    fn validate_accepts_lookback_number_and_text() {
        let numeric = request(&["AAPL"], Some(json!(63))).validate().expect("valid");
        assert_eq!(numeric.lookback.map(Lookback::get), Some(63));

        let text = AnalysisRequest::from_text("aapl", Some("125"))
            .validate()
            .expect("valid");
        assert_eq!(text.lookback.map(Lookback::get), Some(125));
        assert_eq!(text.tickers[0].as_str(), "AAPL");
    }

    #[test]
    fn validate_rejects_non_integer_lookback() {
        for lookback in [json!(2.5), json!("two"), json!(true)] {
            let err = request(&["AAPL"], Some(lookback))
                .validate()
                .expect_err("not an integer");
            assert!(matches!(err, ValidationError::LookbackNotInteger { .. }));
        }
    }

    #[test]
    fn validate_rejects_ticker_syntax() {
        let err = request(&["AAPL", "BRK.B"], None).validate().expect_err("invalid");
        assert!(matches!(err, ValidationError::TickerInvalidChar { ch: '.', .. }));

        let err = request(&["TOOLONG"], None).validate().expect_err("invalid");
        assert!(matches!(err, ValidationError::TickerTooLong { len: 7, .. }));
    }

    #[test]
    fn missing_lookback_defaults_to_a_month() {
        let validated = request(&["AAPL"], None).validate().expect("valid");
        assert_eq!(validated.lookback, None);
        assert_eq!(validated.lookback_or_default().get(), 21);
    }

    #[test]
    fn sharpe_response_uses_camel_case_and_nulls() {
        let mut report = MultiPeriodReport::empty(Ticker::parse("AAPL").expect("valid"));
        report.last_week = Some(SharpeMetrics {
            sharpe_ratio: 1.5,
            trailing_return: 3.0,
            std_dev: 2.0,
            period_days: 5,
        });
        let response = SharpeReportResponse::from(SharpeReport {
            report,
            error: None,
        });

        let value = serde_json::to_value(&response).expect("serializable");

        assert_eq!(value["ticker"], "AAPL");
        assert_eq!(value["lastWeek"]["sharpeRatio"], 1.5);
        assert_eq!(value["lastWeek"]["stdDev"], 2.0);
        assert!(value["lastWeek"].get("periodDays").is_none());
        assert!(value["lastYear"].is_null());
        assert!(value.get("error").is_none());
    }

    #[test]
    fn ticker_data_response_reports_error_and_empty_series() {
        let response = TickerDataResponse {
            ticker: String::from("BAD"),
            historical_data: Vec::new(),
            days_count: 0,
            error: Some(String::from("upstream unavailable")),
        };

        let value = serde_json::to_value(&response).expect("serializable");

        assert_eq!(value["historicalData"], json!([]));
        assert_eq!(value["daysCount"], 0);
        assert_eq!(value["error"], "upstream unavailable");
    }
}
