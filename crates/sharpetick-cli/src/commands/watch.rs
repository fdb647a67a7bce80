use std::str::FromStr;

use sharpetick_core::{parse_ticker_input, Lookback, Ticker, Watchlist};
use tracing::info;

use crate::cli::{WatchArgs, WatchCommand};
use crate::error::CliError;
use crate::output::{CommandOutput, Table};

use super::Context;

pub fn run(args: &WatchArgs, context: &Context) -> Result<CommandOutput, CliError> {
    let mut watchlist = context.watchlist()?;

    match &args.command {
        WatchCommand::List => return render(&watchlist),
        WatchCommand::Add { tickers } => {
            for ticker in parse_tickers(tickers)? {
                if watchlist.add(ticker.clone())? {
                    info!(ticker = %ticker, "added to watch-list");
                }
            }
        }
        WatchCommand::Remove { tickers } => {
            for ticker in parse_tickers(tickers)? {
                if watchlist.remove(&ticker) {
                    info!(ticker = %ticker, "removed from watch-list");
                }
            }
        }
        WatchCommand::Lookback { value } => watchlist.set_lookback(Lookback::from_str(value)?),
        WatchCommand::Clear => watchlist.clear(),
    }

    context.store.save(&watchlist)?;
    render(&watchlist)
}

fn parse_tickers(text: &str) -> Result<Vec<Ticker>, CliError> {
    Ok(parse_ticker_input(text)
        .iter()
        .map(|ticker| Ticker::parse(ticker))
        .collect::<Result<Vec<_>, _>>()?)
}

fn render(watchlist: &Watchlist) -> Result<CommandOutput, CliError> {
    let mut table = Table::new(vec!["ticker", "lookback"]);
    for ticker in watchlist.tickers() {
        table.push(vec![ticker.to_string(), watchlist.lookback().to_string()]);
    }

    Ok(CommandOutput {
        data: serde_json::to_value(watchlist)?,
        table,
        has_errors: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support;
    use serde_json::json;

    fn watch(command: WatchCommand, context: &Context) -> Result<CommandOutput, CliError> {
        run(&WatchArgs { command }, context)
    }

    #[test]
    fn add_remove_and_lookback_persist() {
        let context = test_support::context();

        watch(
            WatchCommand::Add {
                tickers: String::from("aapl, msft, aapl"),
            },
            &context,
        )
        .expect("add");
        watch(
            WatchCommand::Remove {
                tickers: String::from("msft"),
            },
            &context,
        )
        .expect("remove");
        let output = watch(
            WatchCommand::Lookback {
                value: String::from("63"),
            },
            &context,
        )
        .expect("lookback");

        assert_eq!(output.data, json!({"tickers": ["AAPL"], "lookback": 63}));
        let listed = watch(WatchCommand::List, &context).expect("list");
        assert_eq!(listed.data, output.data);
    }

    #[test]
    fn invalid_ticker_leaves_watch_list_untouched() {
        let context = test_support::context();

        let err = watch(
            WatchCommand::Add {
                tickers: String::from("aapl, toolong"),
            },
            &context,
        )
        .expect_err("invalid ticker");

        assert_eq!(err.exit_code(), 2);
        let listed = watch(WatchCommand::List, &context).expect("list");
        assert_eq!(listed.data["tickers"], json!([]));
    }

    #[test]
    fn clear_resets_lookback() {
        let context = test_support::context();
        watch(
            WatchCommand::Lookback {
                value: String::from("250"),
            },
            &context,
        )
        .expect("lookback");

        let output = watch(WatchCommand::Clear, &context).expect("clear");

        assert_eq!(output.data, json!({"tickers": [], "lookback": 21}));
    }
}
