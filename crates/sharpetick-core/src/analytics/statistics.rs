//! Sample statistics used by the Sharpe calculator.

/// Arithmetic mean; `0.0` for an empty sample.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance (divides by `N`); `0.0` for fewer than two samples.
pub fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let avg = mean(values);
    values.iter().map(|value| (value - avg).powi(2)).sum::<f64>() / values.len() as f64
}

/// Square root of [`variance`].
///
/// Returns `0.0` for fewer than two samples and whenever the computation
/// is not finite (NaN or infinite input, overflow).
pub fn standard_deviation(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let std_dev = variance(values).sqrt();
    if std_dev.is_finite() {
        std_dev
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_of_empty_sample_is_zero() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean(&[2.0, 4.0]), 3.0);
    }

    #[test]
    fn variance_divides_by_n() {
        // population variance of [2, 4, 4, 4, 5, 5, 7, 9] is exactly 4
        let sample = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((variance(&sample) - 4.0).abs() < 1e-12);
        assert!((standard_deviation(&sample) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn single_sample_has_no_dispersion() {
        assert_eq!(variance(&[42.0]), 0.0);
        assert_eq!(standard_deviation(&[42.0]), 0.0);
    }

    #[test]
    fn non_finite_input_degrades_to_zero() {
        assert_eq!(standard_deviation(&[1.0, f64::NAN, 3.0]), 0.0);
        assert_eq!(standard_deviation(&[1.0, f64::INFINITY]), 0.0);
        assert_eq!(standard_deviation(&[f64::MAX, -f64::MAX]), 0.0);
    }
}
