//! Pure, synchronous analytics: returns, sample statistics and Sharpe metrics.
//!
//! Nothing here suspends, allocates shared state or returns an error for
//! numeric edge cases. Insufficient history is reported as `None`.

pub mod returns;
pub mod sharpe;
pub mod statistics;

pub use sharpe::SharpeCalculator;
