use serde::{Deserialize, Serialize};

use crate::TradingDate;

/// One daily OHLCV session as delivered by a price source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: TradingDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PricePoint {
    pub const fn new(
        date: TradingDate,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Bar filter applied before analysis: positive open/close, non-negative
    /// volume and every field finite.
    pub fn is_valid(&self) -> bool {
        let finite = [self.open, self.high, self.low, self.close, self.volume]
            .iter()
            .all(|value| value.is_finite());
        finite && self.close > 0.0 && self.open > 0.0 && self.volume >= 0.0
    }
}

/// Requested ordering of a fetched series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Oldest first. The analytics engine requires this order.
    #[default]
    Chronological,
    /// Newest first, for display.
    ReverseChronological,
}

/// Price series guaranteed to be in chronological order (non-decreasing by date).
///
/// Out-of-order input is re-sorted on construction with a stable sort, so
/// sessions sharing a date keep their delivery order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<PricePoint>", into = "Vec<PricePoint>")]
pub struct PriceSeries(Vec<PricePoint>);

impl PriceSeries {
    pub fn new(mut points: Vec<PricePoint>) -> Self {
        if !is_chronological(&points) {
            points.sort_by_key(|point| point.date);
        }
        Self(points)
    }

    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Close prices, oldest first.
    pub fn closes(&self) -> Vec<f64> {
        self.0.iter().map(|point| point.close).collect()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.0.last()
    }

    /// Copy of the points in the requested order.
    pub fn ordered(&self, order: SortOrder) -> Vec<PricePoint> {
        match order {
            SortOrder::Chronological => self.0.clone(),
            SortOrder::ReverseChronological => self.0.iter().rev().copied().collect(),
        }
    }

    pub fn into_inner(self) -> Vec<PricePoint> {
        self.0
    }
}

impl From<Vec<PricePoint>> for PriceSeries {
    fn from(value: Vec<PricePoint>) -> Self {
        Self::new(value)
    }
}

impl From<PriceSeries> for Vec<PricePoint> {
    fn from(value: PriceSeries) -> Self {
        value.0
    }
}

fn is_chronological(points: &[PricePoint]) -> bool {
    points.windows(2).all(|pair| pair[0].date <= pair[1].date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(date: &str, close: f64) -> PricePoint {
        let date = TradingDate::parse(date).expect("valid date");
        PricePoint::new(date, close, close, close, close, 1_000.0)
    }

    #[test]
    fn validity_policy_rejects_non_positive_and_nan() {
        assert!(point("2024-01-02", 10.0).is_valid());

        let mut zero_close = point("2024-01-02", 10.0);
        zero_close.close = 0.0;
        assert!(!zero_close.is_valid());

        let mut negative_open = point("2024-01-02", 10.0);
        negative_open.open = -1.0;
        assert!(!negative_open.is_valid());

        let mut nan_close = point("2024-01-02", 10.0);
        nan_close.close = f64::NAN;
        assert!(!nan_close.is_valid());

        let mut negative_volume = point("2024-01-02", 10.0);
        negative_volume.volume = -1.0;
        assert!(!negative_volume.is_valid());

        let mut zero_volume = point("2024-01-02", 10.0);
        zero_volume.volume = 0.0;
        assert!(zero_volume.is_valid());
    }

    #[test]
    fn resorts_out_of_order_input() {
        let series = PriceSeries::new(vec![
            point("2024-01-04", 3.0),
            point("2024-01-02", 1.0),
            point("2024-01-03", 2.0),
        ]);

        assert_eq!(series.closes(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn reverse_order_is_newest_first() {
        let series = PriceSeries::new(vec![point("2024-01-02", 1.0), point("2024-01-03", 2.0)]);
        let reversed = series.ordered(SortOrder::ReverseChronological);

        assert_eq!(reversed[0].close, 2.0);
        assert_eq!(reversed[1].close, 1.0);
        assert_eq!(series.closes(), vec![1.0, 2.0], "input series is untouched");
    }

    #[test]
    fn deserialized_series_is_chronological() {
        let json = r#"[
            {"date":"2024-01-03","open":2.0,"high":2.0,"low":2.0,"close":2.0,"volume":5.0},
            {"date":"2024-01-02","open":1.0,"high":1.0,"low":1.0,"close":1.0,"volume":5.0}
        ]"#;
        let series: PriceSeries = serde_json::from_str(json).expect("valid series json");

        assert_eq!(series.closes(), vec![1.0, 2.0]);
    }
}
