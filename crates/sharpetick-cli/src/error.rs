use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] sharpetick_core::ValidationError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Watchlist(#[from] sharpetick_core::WatchlistError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::Config(_) => 2,
            Self::Serialization(_) => 4,
            Self::Watchlist(_) => 10,
            Self::Io(_) => 10,
        }
    }
}
