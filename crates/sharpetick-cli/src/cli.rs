//! CLI argument definitions for Sharpetick.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `bars` | Fetch validated daily bars |
//! | `sharpe` | Multi-period Sharpe report |
//! | `enhance` | Annotate a series with rolling metrics |
//! | `watch` | Manage the persisted watch-list |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `json` | Output format (json, table) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--mock` | `false` | Use the offline synthetic price source |
//! | `--timeout-ms` | `10000` | Per-ticker fetch timeout in ms |
//! | `--risk-free-rate` | `0` | Percent subtracted from trailing returns |
//! | `--cache-ttl-secs` | `300` | Cache revalidation window, `0` disables |
//!
//! # Examples
//!
//! ```bash
//! # Sharpe report for two tickers
//! sharpetick sharpe "aapl, msft" --pretty
//!
//! # Rolling 63-session signal as a table
//! sharpetick enhance AAPL --lookback 63 --format table
//!
//! # Analyse the watch-list offline
//! sharpetick watch add "aapl, googl"
//! sharpetick sharpe --mock
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Risk-adjusted performance for daily price series.
#[derive(Debug, Parser)]
#[command(
    name = "sharpetick",
    author,
    version,
    about = "Rolling return, volatility and Sharpe analytics",
    long_about = "Sharpetick fetches daily OHLCV bars and derives trailing return, \
volatility and a simplified Sharpe ratio over standard lookback windows.\n\
\n\
Tickers are free text (\"aapl, msft\"); when omitted, the watch-list is used.\n\
\n\
Use 'sharpetick <command> --help' for command-specific help."
)]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Use the deterministic offline price source instead of Yahoo.
    #[arg(long, global = true, default_value_t = false)]
    pub mock: bool,

    /// Per-ticker fetch timeout in milliseconds [env: SHARPETICK_FETCH_TIMEOUT_MS].
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Risk-free rate in percent [env: SHARPETICK_RISK_FREE_RATE].
    #[arg(long, global = true, allow_negative_numbers = true)]
    pub risk_free_rate: Option<f64>,

    /// Cache revalidation window in seconds, 0 disables [env: SHARPETICK_CACHE_TTL_SECS].
    #[arg(long, global = true)]
    pub cache_ttl_secs: Option<u64>,

    /// Watch-list file [env: SHARPETICK_WATCHLIST_PATH].
    #[arg(long, global = true)]
    pub watchlist: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format for terminal display.
    Table,
    /// Single JSON document.
    Json,
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch validated daily bars for one or more tickers.
    ///
    /// # Examples
    ///
    ///   sharpetick bars AAPL
    ///   sharpetick bars "aapl, msft" --newest-first
    Bars(BarsArgs),

    /// Sharpe report over yesterday, week, month, quarter, semester and year.
    ///
    /// # Examples
    ///
    ///   sharpetick sharpe "aapl, googl"
    ///   sharpetick sharpe --risk-free-rate 0.5 --format table
    Sharpe(TickersArgs),

    /// Annotate the full history of one ticker with rolling metrics.
    ///
    /// # Examples
    ///
    ///   sharpetick enhance AAPL --lookback 21
    Enhance(EnhanceArgs),

    /// Manage the persisted watch-list.
    Watch(WatchArgs),
}

/// Free-text ticker selection shared by the data commands.
#[derive(Debug, Args)]
pub struct TickersArgs {
    /// Comma-separated tickers (e.g. "aapl, msft"); defaults to the watch-list.
    pub tickers: Option<String>,
}

/// Arguments for the `bars` command.
#[derive(Debug, Args)]
pub struct BarsArgs {
    #[command(flatten)]
    pub selection: TickersArgs,

    /// List the newest session first.
    #[arg(long, default_value_t = false)]
    pub newest_first: bool,
}

/// Arguments for the `enhance` command.
#[derive(Debug, Args)]
pub struct EnhanceArgs {
    /// Ticker to annotate.
    pub ticker: String,

    /// Lookback in sessions, 1 to 1000; defaults to the watch-list lookback.
    #[arg(long)]
    pub lookback: Option<String>,
}

/// Arguments for the `watch` command group.
#[derive(Debug, Args)]
pub struct WatchArgs {
    #[command(subcommand)]
    pub command: WatchCommand,
}

/// Watch-list subcommands.
#[derive(Debug, Subcommand)]
pub enum WatchCommand {
    /// Show tickers and lookback.
    List,
    /// Add comma-separated tickers.
    Add {
        tickers: String,
    },
    /// Remove comma-separated tickers.
    Remove {
        tickers: String,
    },
    /// Set the default lookback.
    Lookback {
        value: String,
    },
    /// Remove every ticker and reset the lookback.
    Clear,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "sharpetick",
            "sharpe",
            "aapl, msft",
            "--format",
            "table",
            "--risk-free-rate",
            "-0.5",
            "--mock",
        ])
        .expect("valid arguments");

        assert_eq!(cli.format, OutputFormat::Table);
        assert_eq!(cli.risk_free_rate, Some(-0.5));
        assert!(cli.mock);
        match cli.command {
            Command::Sharpe(args) => assert_eq!(args.tickers.as_deref(), Some("aapl, msft")),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn lookback_is_kept_as_text_for_validation() {
        let cli = Cli::try_parse_from(["sharpetick", "enhance", "AAPL", "--lookback", "abc"])
            .expect("clap accepts any text");

        match cli.command {
            Command::Enhance(args) => assert_eq!(args.lookback.as_deref(), Some("abc")),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn watch_add_takes_free_text() {
        let cli = Cli::try_parse_from(["sharpetick", "watch", "add", "aapl,ibm"])
            .expect("valid arguments");

        assert!(matches!(
            cli.command,
            Command::Watch(WatchArgs {
                command: WatchCommand::Add { .. }
            })
        ));
    }
}
