//! Upstream price source adapters.

mod yahoo;

pub use yahoo::YahooAdapter;
