//! Percentage returns over price sequences.
//!
//! All functions are total: degenerate input (empty series, non-positive
//! reference price, too little history) yields `0.0` or an empty vector
//! instead of an error.

/// Percentage change from `past` to `current`; `0.0` when `past <= 0`.
pub fn trailing_return(current: f64, past: f64) -> f64 {
    if past <= 0.0 {
        return 0.0;
    }
    ((current - past) / past) * 100.0
}

/// One-step returns: `prices[i]` against `prices[i - 1]`, `N - 1` values for `N` prices.
pub fn returns_series(prices: &[f64]) -> Vec<f64> {
    prices
        .windows(2)
        .map(|pair| trailing_return(pair[1], pair[0]))
        .collect()
}

/// Return of the latest price against the price `lookback_days` sessions earlier.
///
/// Needs at least `lookback_days + 1` prices, otherwise `0.0`.
pub fn lookback_return(prices: &[f64], lookback_days: usize) -> f64 {
    if lookback_days == 0 || prices.len() < lookback_days + 1 {
        return 0.0;
    }
    let latest = prices.len() - 1;
    trailing_return(prices[latest], prices[latest - lookback_days])
}
