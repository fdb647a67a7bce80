use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::{PricePoint, Ticker};

/// Return/volatility/Sharpe figures for one (series, lookback) pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharpeMetrics {
    pub sharpe_ratio: f64,
    pub trailing_return: f64,
    pub std_dev: f64,
    pub period_days: usize,
}

/// The six named lookback slots of a multi-period report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Period {
    Yesterday,
    LastWeek,
    LastMonth,
    LastQuarter,
    LastSemester,
    LastYear,
}

impl Period {
    pub const ALL: [Self; 6] = [
        Self::Yesterday,
        Self::LastWeek,
        Self::LastMonth,
        Self::LastQuarter,
        Self::LastSemester,
        Self::LastYear,
    ];

    /// Trading sessions covered by the slot.
    pub const fn trading_days(self) -> usize {
        match self {
            Self::Yesterday => 1,
            Self::LastWeek => 5,
            Self::LastMonth => 21,
            Self::LastQuarter => 63,
            Self::LastSemester => 125,
            Self::LastYear => 250,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Yesterday => "yesterday",
            Self::LastWeek => "lastWeek",
            Self::LastMonth => "lastMonth",
            Self::LastQuarter => "lastQuarter",
            Self::LastSemester => "lastSemester",
            Self::LastYear => "lastYear",
        }
    }
}

impl Display for Period {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-ticker report with one independently nullable slot per [`Period`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiPeriodReport {
    pub ticker: Ticker,
    pub yesterday: Option<SharpeMetrics>,
    pub last_week: Option<SharpeMetrics>,
    pub last_month: Option<SharpeMetrics>,
    pub last_quarter: Option<SharpeMetrics>,
    pub last_semester: Option<SharpeMetrics>,
    pub last_year: Option<SharpeMetrics>,
}

impl MultiPeriodReport {
    /// Report with every slot empty.
    pub fn empty(ticker: Ticker) -> Self {
        Self {
            ticker,
            yesterday: None,
            last_week: None,
            last_month: None,
            last_quarter: None,
            last_semester: None,
            last_year: None,
        }
    }

    pub fn get(&self, period: Period) -> Option<&SharpeMetrics> {
        match period {
            Period::Yesterday => self.yesterday.as_ref(),
            Period::LastWeek => self.last_week.as_ref(),
            Period::LastMonth => self.last_month.as_ref(),
            Period::LastQuarter => self.last_quarter.as_ref(),
            Period::LastSemester => self.last_semester.as_ref(),
            Period::LastYear => self.last_year.as_ref(),
        }
    }

    pub fn set(&mut self, period: Period, metrics: Option<SharpeMetrics>) {
        let slot = match period {
            Period::Yesterday => &mut self.yesterday,
            Period::LastWeek => &mut self.last_week,
            Period::LastMonth => &mut self.last_month,
            Period::LastQuarter => &mut self.last_quarter,
            Period::LastSemester => &mut self.last_semester,
            Period::LastYear => &mut self.last_year,
        };
        *slot = metrics;
    }
}

/// A [`PricePoint`] carrying the point-in-time metrics of the window ending at it.
///
/// The metric fields stay `None` until enough history precedes the point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotatedPricePoint {
    #[serde(flatten)]
    pub point: PricePoint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trailing_return: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub std_dev: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sharpe_ratio: Option<f64>,
}

impl AnnotatedPricePoint {
    pub const fn bare(point: PricePoint) -> Self {
        Self {
            point,
            trailing_return: None,
            std_dev: None,
            sharpe_ratio: None,
        }
    }

    pub const fn with_metrics(point: PricePoint, metrics: &SharpeMetrics) -> Self {
        Self {
            point,
            trailing_return: Some(metrics.trailing_return),
            std_dev: Some(metrics.std_dev),
            sharpe_ratio: Some(metrics.sharpe_ratio),
        }
    }

    pub const fn is_annotated(&self) -> bool {
        self.sharpe_ratio.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TradingDate;

    #[test]
    fn period_constants_follow_trading_day_convention() {
        let days = Period::ALL.map(Period::trading_days);
        assert_eq!(days, [1, 5, 21, 63, 125, 250]);
    }

    #[test]
    fn report_serializes_named_slots_in_camel_case() {
        let mut report = MultiPeriodReport::empty(Ticker::parse("AAPL").expect("valid"));
        report.set(
            Period::LastWeek,
            Some(SharpeMetrics {
                sharpe_ratio: 1.5,
                trailing_return: 3.0,
                std_dev: 2.0,
                period_days: 5,
            }),
        );

        let value = serde_json::to_value(&report).expect("serializable");
        assert_eq!(value["ticker"], "AAPL");
        assert!(value["yesterday"].is_null());
        assert_eq!(value["lastWeek"]["sharpeRatio"], 1.5);
        assert_eq!(value["lastWeek"]["trailingReturn"], 3.0);
        assert!(value["lastYear"].is_null());
        assert_eq!(report.get(Period::LastWeek).map(|m| m.period_days), Some(5));
    }

    #[test]
    fn bare_annotated_point_omits_metric_fields() {
        let date = TradingDate::parse("2024-01-02").expect("valid");
        let annotated = AnnotatedPricePoint::bare(PricePoint::new(date, 1.0, 1.0, 1.0, 1.0, 0.0));

        let value = serde_json::to_value(annotated).expect("serializable");
        assert_eq!(value["date"], "2024-01-02");
        assert!(value.get("sharpeRatio").is_none());
        assert!(!annotated.is_annotated());
    }
}
