//! Persisted watch-list: the tickers and lookback a user analyses by default.
//!
//! [`Watchlist`] is a plain state object; persistence goes through the
//! [`WatchlistStore`] port. Nothing in the analytics engine reads it.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::api::MAX_TICKERS;
use crate::{Lookback, Ticker, ValidationError};

/// Failure loading or saving a watch-list.
#[derive(Debug, Error)]
pub enum WatchlistError {
    #[error("failed to {action} watch-list file {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("watch-list file {path} is not valid: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize watch-list: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("could not determine the home directory for the default watch-list path")]
    NoHomeDirectory,
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Tickers and preferred lookback, bounded to [`MAX_TICKERS`] entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawWatchlist")]
pub struct Watchlist {
    tickers: Vec<Ticker>,
    lookback: Lookback,
}

#[derive(Deserialize)]
struct RawWatchlist {
    #[serde(default)]
    tickers: Vec<Ticker>,
    #[serde(default)]
    lookback: Lookback,
}

impl TryFrom<RawWatchlist> for Watchlist {
    type Error = ValidationError;

    fn try_from(raw: RawWatchlist) -> Result<Self, Self::Error> {
        let mut watchlist = Self {
            tickers: Vec::new(),
            lookback: raw.lookback,
        };
        for ticker in raw.tickers {
            watchlist.add(ticker)?;
        }
        Ok(watchlist)
    }
}

impl Watchlist {
    pub fn tickers(&self) -> &[Ticker] {
        &self.tickers
    }

    pub fn lookback(&self) -> Lookback {
        self.lookback
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }

    pub fn contains(&self, ticker: &Ticker) -> bool {
        self.tickers.contains(ticker)
    }

    /// Appends `ticker`. Returns `false` when it was already listed.
    pub fn add(&mut self, ticker: Ticker) -> Result<bool, ValidationError> {
        if self.contains(&ticker) {
            return Ok(false);
        }
        if self.tickers.len() >= MAX_TICKERS {
            return Err(ValidationError::TooManyTickers {
                count: self.tickers.len() + 1,
                max: MAX_TICKERS,
            });
        }
        self.tickers.push(ticker);
        Ok(true)
    }

    /// Removes `ticker`. Returns `false` when it was not listed.
    pub fn remove(&mut self, ticker: &Ticker) -> bool {
        let before = self.tickers.len();
        self.tickers.retain(|listed| listed != ticker);
        self.tickers.len() != before
    }

    pub fn set_lookback(&mut self, lookback: Lookback) {
        self.lookback = lookback;
    }

    /// Drops every ticker and restores the default lookback.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Persistence port for [`Watchlist`].
pub trait WatchlistStore: Send + Sync {
    /// Returns `None` when nothing has been saved yet.
    fn load(&self) -> Result<Option<Watchlist>, WatchlistError>;

    fn save(&self, watchlist: &Watchlist) -> Result<(), WatchlistError>;

    fn load_or_default(&self) -> Result<Watchlist, WatchlistError> {
        Ok(self.load()?.unwrap_or_default())
    }
}

/// JSON file store with atomic replace-on-write.
#[derive(Debug, Clone)]
pub struct JsonFileWatchlistStore {
    path: PathBuf,
}

impl JsonFileWatchlistStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$HOME/.sharpetick/watchlist.json`.
    pub fn default_path() -> Result<PathBuf, WatchlistError> {
        let home = std::env::var_os("HOME").ok_or(WatchlistError::NoHomeDirectory)?;
        Ok(PathBuf::from(home).join(".sharpetick").join("watchlist.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, action: &'static str, path: &Path, source: std::io::Error) -> WatchlistError {
        WatchlistError::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }
}

impl WatchlistStore for JsonFileWatchlistStore {
    fn load(&self) -> Result<Option<Watchlist>, WatchlistError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|source| self.io_error("read", &self.path, source))?;
        let watchlist: Watchlist =
            serde_json::from_str(&content).map_err(|source| WatchlistError::Parse {
                path: self.path.clone(),
                source,
            })?;

        info!(path = %self.path.display(), tickers = watchlist.tickers.len(), "loaded watch-list");
        Ok(Some(watchlist))
    }

    fn save(&self, watchlist: &Watchlist) -> Result<(), WatchlistError> {
        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| self.io_error("create", parent, source))?;
        }

        let content = serde_json::to_string_pretty(watchlist).map_err(WatchlistError::Serialize)?;

        // Write to a sibling temp file, then rename over the target.
        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, content).map_err(|source| self.io_error("write", &temp_path, source))?;
        fs::rename(&temp_path, &self.path)
            .map_err(|source| self.io_error("replace", &self.path, source))?;

        info!(path = %self.path.display(), tickers = watchlist.tickers.len(), "saved watch-list");
        Ok(())
    }
}

/// Process-local store, mainly for tests.
#[derive(Debug, Default)]
pub struct InMemoryWatchlistStore {
    saved: Mutex<Option<Watchlist>>,
}

impl InMemoryWatchlistStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WatchlistStore for InMemoryWatchlistStore {
    fn load(&self) -> Result<Option<Watchlist>, WatchlistError> {
        Ok(self
            .saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, watchlist: &Watchlist) -> Result<(), WatchlistError> {
        *self.saved.lock().unwrap_or_else(PoisonError::into_inner) = Some(watchlist.clone());
        Ok(())
    }
}
