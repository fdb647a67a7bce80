//! Runtime settings resolved from flags, environment and defaults, in that order.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use sharpetick_core::JsonFileWatchlistStore;

use crate::cli::Cli;
use crate::error::CliError;

pub const ENV_CACHE_TTL_SECS: &str = "SHARPETICK_CACHE_TTL_SECS";
pub const ENV_RISK_FREE_RATE: &str = "SHARPETICK_RISK_FREE_RATE";
pub const ENV_FETCH_TIMEOUT_MS: &str = "SHARPETICK_FETCH_TIMEOUT_MS";
pub const ENV_WATCHLIST_PATH: &str = "SHARPETICK_WATCHLIST_PATH";
pub const ENV_MOCK: &str = "SHARPETICK_MOCK";

const DEFAULT_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_FETCH_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub cache_ttl: Duration,
    pub risk_free_rate: f64,
    pub fetch_timeout: Duration,
    pub watchlist_path: PathBuf,
    pub mock: bool,
}

impl Settings {
    pub fn resolve(cli: &Cli) -> Result<Self, CliError> {
        Self::from_sources(cli, |name| std::env::var(name).ok())
    }

    fn from_sources(cli: &Cli, env: impl Fn(&str) -> Option<String>) -> Result<Self, CliError> {
        let cache_ttl_secs = match cli.cache_ttl_secs {
            Some(value) => value,
            None => env_value(&env, ENV_CACHE_TTL_SECS)?.unwrap_or(DEFAULT_CACHE_TTL_SECS),
        };
        let fetch_timeout_ms = match cli.timeout_ms {
            Some(value) => value,
            None => env_value(&env, ENV_FETCH_TIMEOUT_MS)?.unwrap_or(DEFAULT_FETCH_TIMEOUT_MS),
        };
        if fetch_timeout_ms == 0 {
            return Err(CliError::Config(format!(
                "fetch timeout must be at least 1 ms (--timeout-ms or {ENV_FETCH_TIMEOUT_MS})"
            )));
        }
        let risk_free_rate = match cli.risk_free_rate {
            Some(value) => value,
            None => env_value(&env, ENV_RISK_FREE_RATE)?.unwrap_or(0.0),
        };
        let watchlist_path = match (&cli.watchlist, env(ENV_WATCHLIST_PATH)) {
            (Some(path), _) => path.clone(),
            (None, Some(path)) if !path.trim().is_empty() => PathBuf::from(path),
            _ => JsonFileWatchlistStore::default_path()?,
        };
        let mock = cli.mock || env(ENV_MOCK).is_some_and(|value| is_truthy(&value));

        Ok(Self {
            cache_ttl: Duration::from_secs(cache_ttl_secs),
            risk_free_rate,
            fetch_timeout: Duration::from_millis(fetch_timeout_ms),
            watchlist_path,
            mock,
        })
    }
}

fn env_value<T: FromStr>(
    env: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<Option<T>, CliError> {
    match env(name) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| CliError::Config(format!("{name} has an invalid value '{raw}'"))),
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
