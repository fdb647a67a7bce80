//! Simplified Sharpe ratio over trailing lookback windows.
//!
//! A window of `L` sessions needs `2 * L` prices: `L + 1` to establish the
//! trailing return and a second window's worth of history so the volatility
//! is estimated from a sample of returns rather than a single value. Shorter
//! series produce `None`, never a partial metric.

use crate::analytics::{returns, statistics};
use crate::{
    AnnotatedPricePoint, MultiPeriodReport, Period, PriceSeries, SharpeMetrics, Ticker,
    ValidationError,
};

/// Computes [`SharpeMetrics`] for a fixed risk-free rate.
///
/// The rate is in percent, the same unit as the trailing return it is
/// subtracted from. No annualization is applied.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SharpeCalculator {
    risk_free_rate: f64,
}

impl SharpeCalculator {
    pub const fn new() -> Self {
        Self {
            risk_free_rate: 0.0,
        }
    }

    pub fn with_risk_free_rate(risk_free_rate: f64) -> Result<Self, ValidationError> {
        if !risk_free_rate.is_finite() {
            return Err(ValidationError::NonFiniteValue {
                field: "risk_free_rate",
            });
        }
        Ok(Self { risk_free_rate })
    }

    pub const fn risk_free_rate(&self) -> f64 {
        self.risk_free_rate
    }

    /// Minimum number of prices a lookback window needs.
    pub const fn required_len(lookback_days: usize) -> usize {
        2 * lookback_days
    }

    /// Metrics for the window of `lookback_days` sessions ending at the last price.
    ///
    /// `prices` must be chronological. Returns `None` when fewer than
    /// `2 * lookback_days` prices are available or `lookback_days` is zero.
    pub fn sharpe_for_period(&self, prices: &[f64], lookback_days: usize) -> Option<SharpeMetrics> {
        if lookback_days == 0 || prices.len() < Self::required_len(lookback_days) {
            return None;
        }

        let trailing_return = returns::lookback_return(prices, lookback_days);

        // One-step volatility over the last lookback_days + 1 prices.
        let window = &prices[prices.len() - (lookback_days + 1)..];
        let std_dev = statistics::standard_deviation(&returns::returns_series(window));

        let sharpe_ratio = if std_dev == 0.0 {
            0.0
        } else {
            let ratio = (trailing_return - self.risk_free_rate) / std_dev;
            if ratio.is_finite() {
                ratio
            } else {
                0.0
            }
        };

        Some(SharpeMetrics {
            sharpe_ratio,
            trailing_return,
            std_dev,
            period_days: lookback_days,
        })
    }

    /// Evaluates every [`Period`] independently against the same series.
    pub fn multi_period_sharpe(&self, prices: &[f64], ticker: Ticker) -> MultiPeriodReport {
        let mut report = MultiPeriodReport::empty(ticker);
        for period in Period::ALL {
            let metrics = match period {
                // Gated on two prices; for one session that is also the 2x rule.
                Period::Yesterday if prices.len() < 2 => None,
                _ => self.sharpe_for_period(prices, period.trading_days()),
            };
            report.set(period, metrics);
        }
        report
    }

    /// Annotates every point with the metrics of the window ending at it.
    ///
    /// Point `i` only sees prices `0..=i`, so the output is a leakage-free
    /// rolling signal. The first `2 * lookback_days - 1` points stay bare.
    pub fn enhance_with_metrics(
        &self,
        series: &PriceSeries,
        lookback_days: usize,
    ) -> Vec<AnnotatedPricePoint> {
        let closes = series.closes();
        let first_annotated = Self::required_len(lookback_days).saturating_sub(1);

        series
            .points()
            .iter()
            .enumerate()
            .map(|(index, point)| {
                if lookback_days == 0 || index < first_annotated {
                    return AnnotatedPricePoint::bare(*point);
                }
                match self.sharpe_for_period(&closes[..=index], lookback_days) {
                    Some(metrics) => AnnotatedPricePoint::with_metrics(*point, &metrics),
                    None => AnnotatedPricePoint::bare(*point),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PricePoint, TradingDate};

    fn compounding(len: usize, daily: f64) -> Vec<f64> {
        (0..len).map(|i| 100.0 * (1.0 + daily).powi(i as i32)).collect()
    }

    fn series_of(closes: &[f64]) -> PriceSeries {
        let start = TradingDate::parse("2020-01-01").expect("valid date");
        PriceSeries::new(
            closes
                .iter()
                .enumerate()
                .map(|(i, close)| {
                    PricePoint::new(start.plus_days(i as i64), *close, *close, *close, *close, 1.0)
                })
                .collect(),
        )
    }

    #[test]
    fn shorter_than_twice_the_lookback_is_none() {
        let calculator = SharpeCalculator::new();
        let prices = compounding(41, 0.01);

        assert!(calculator.sharpe_for_period(&prices, 21).is_none());
        assert!(calculator.sharpe_for_period(&prices[..1], 1).is_none());
        assert!(calculator.sharpe_for_period(&compounding(42, 0.01), 21).is_some());
    }

    #[test]
    fn zero_lookback_is_never_enough_data() {
        let calculator = SharpeCalculator::new();
        assert!(calculator.sharpe_for_period(&compounding(10, 0.01), 0).is_none());
    }

    #[test]
    fn compounding_growth_has_positive_sharpe() {
        let calculator = SharpeCalculator::new();
        let prices = compounding(500, 0.01);

        let metrics = calculator.sharpe_for_period(&prices, 21).expect("enough data");

        let expected = (1.01_f64.powi(21) - 1.0) * 100.0;
        assert!((metrics.trailing_return - expected).abs() < 1e-9);
        // Rounding leaves a tiny but non-zero spread in the one-step returns.
        assert!(metrics.std_dev > 0.0);
        assert!(metrics.std_dev < 1e-6);
        assert!(metrics.sharpe_ratio > 1.0);
        assert_eq!(metrics.period_days, 21);
    }

    #[test]
    fn flat_prices_have_zero_sharpe() {
        let calculator = SharpeCalculator::new();
        let metrics = calculator
            .sharpe_for_period(&[100.0; 10], 5)
            .expect("ten prices cover a five session window");

        assert_eq!(metrics.std_dev, 0.0);
        assert_eq!(metrics.sharpe_ratio, 0.0);
        assert_eq!(metrics.trailing_return, 0.0);
    }

    #[test]
    fn risk_free_rate_is_subtracted_from_trailing_return() {
        let prices = [100.0, 101.0, 99.0, 102.0, 100.0, 104.0];
        let plain = SharpeCalculator::new()
            .sharpe_for_period(&prices, 3)
            .expect("enough data");
        let with_rate = SharpeCalculator::with_risk_free_rate(1.0)
            .expect("finite rate")
            .sharpe_for_period(&prices, 3)
            .expect("enough data");

        assert_eq!(plain.std_dev, with_rate.std_dev);
        let expected = (plain.trailing_return - 1.0) / plain.std_dev;
        assert!((with_rate.sharpe_ratio - expected).abs() < 1e-12);
    }

    #[test]
    fn volatility_uses_last_lookback_plus_one_prices() {
        // Wild early history must not leak into the 2-session window.
        let prices = [10.0, 500.0, 3.0, 100.0, 110.0, 99.0];
        let metrics = SharpeCalculator::new()
            .sharpe_for_period(&prices, 2)
            .expect("enough data");

        let expected = statistics::standard_deviation(&[10.0, -10.0]);
        assert!((metrics.std_dev - expected).abs() < 1e-12);
        assert!((metrics.trailing_return + 1.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_non_finite_risk_free_rate() {
        let err = SharpeCalculator::with_risk_free_rate(f64::NAN).expect_err("must fail");
        assert!(matches!(err, ValidationError::NonFiniteValue { .. }));
    }

    #[test]
    fn multi_period_slots_are_independent() {
        let calculator = SharpeCalculator::new();
        let prices = compounding(130, 0.002);
        let report = calculator.multi_period_sharpe(&prices, Ticker::parse("AAPL").expect("valid"));

        assert!(report.yesterday.is_some());
        assert!(report.last_week.is_some());
        assert!(report.last_month.is_some());
        assert!(report.last_quarter.is_some());
        assert!(report.last_semester.is_none(), "needs 250 prices");
        assert!(report.last_year.is_none(), "needs 500 prices");
    }

    #[test]
    fn yesterday_needs_two_prices() {
        let calculator = SharpeCalculator::new();
        let ticker = Ticker::parse("MSFT").expect("valid");

        assert!(calculator.multi_period_sharpe(&[100.0], ticker.clone()).yesterday.is_none());
        let report = calculator.multi_period_sharpe(&[100.0, 105.0], ticker);
        let yesterday = report.yesterday.expect("two prices are enough");
        assert!((yesterday.trailing_return - 5.0).abs() < 1e-12);
        assert_eq!(yesterday.period_days, 1);
    }

    #[test]
    fn enhance_matches_prefix_evaluation() {
        let calculator = SharpeCalculator::new();
        let closes = [100.0, 102.0, 101.0, 104.0, 103.0, 107.0, 106.0, 110.0];
        let series = series_of(&closes);

        let annotated = calculator.enhance_with_metrics(&series, 3);

        assert_eq!(annotated.len(), closes.len());
        for (index, point) in annotated.iter().enumerate() {
            assert_eq!(point.point, series.points()[index]);
            if index < 5 {
                assert!(!point.is_annotated(), "index {index} lacks history");
            } else {
                let expected = calculator
                    .sharpe_for_period(&closes[..=index], 3)
                    .expect("prefix has enough data");
                assert_eq!(point.sharpe_ratio, Some(expected.sharpe_ratio));
                assert_eq!(point.trailing_return, Some(expected.trailing_return));
                assert_eq!(point.std_dev, Some(expected.std_dev));
            }
        }
    }

    #[test]
    fn enhance_is_idempotent_and_leaves_input_untouched() {
        let calculator = SharpeCalculator::new();
        let series = series_of(&compounding(30, 0.003));
        let before = series.clone();

        let first = calculator.enhance_with_metrics(&series, 5);
        let second = calculator.enhance_with_metrics(&series, 5);

        assert_eq!(series, before);
        assert_eq!(first, second);
    }
}
