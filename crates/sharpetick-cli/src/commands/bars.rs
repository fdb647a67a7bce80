use sharpetick_core::{ServiceConfig, SortOrder, TickerDataResponse};

use crate::cli::BarsArgs;
use crate::error::CliError;
use crate::output::{decimal, CommandOutput, Table};

use super::Context;

pub async fn run(args: &BarsArgs, context: &Context) -> Result<CommandOutput, CliError> {
    let tickers = context.tickers(&args.selection)?;

    let order = if args.newest_first {
        SortOrder::ReverseChronological
    } else {
        SortOrder::Chronological
    };
    let service = context.service.clone().with_config(ServiceConfig {
        order,
        ..context.service.config().clone()
    });

    let responses = service
        .fetch_many(&tickers, context.cache())
        .await
        .into_iter()
        .map(TickerDataResponse::from)
        .collect::<Vec<_>>();

    let mut table = Table::new(vec![
        "ticker", "date", "open", "high", "low", "close", "volume", "error",
    ]);
    for response in &responses {
        if let Some(error) = &response.error {
            table.push(vec![
                response.ticker.clone(),
                String::from("-"),
                String::from("-"),
                String::from("-"),
                String::from("-"),
                String::from("-"),
                String::from("-"),
                error.clone(),
            ]);
            continue;
        }
        for bar in &response.historical_data {
            table.push(vec![
                response.ticker.clone(),
                bar.date.to_string(),
                decimal(Some(bar.open)),
                decimal(Some(bar.high)),
                decimal(Some(bar.low)),
                decimal(Some(bar.close)),
                format!("{:.0}", bar.volume),
                String::new(),
            ]);
        }
    }

    Ok(CommandOutput {
        has_errors: responses.iter().any(|response| response.error.is_some()),
        data: serde_json::to_value(&responses)?,
        table,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::TickersArgs;
    use crate::commands::test_support;

    fn args(tickers: &str, newest_first: bool) -> BarsArgs {
        BarsArgs {
            selection: TickersArgs {
                tickers: Some(tickers.to_owned()),
            },
            newest_first,
        }
    }

    #[tokio::test]
    async fn returns_one_response_per_ticker_in_order() {
        let context = test_support::context();

        let output = run(&args("msft, aapl", false), &context).await.expect("runs");

        assert!(!output.has_errors);
        let data = output.data.as_array().expect("array of responses");
        assert_eq!(data.len(), 2);
        assert_eq!(data[0]["ticker"], "MSFT");
        assert_eq!(data[1]["ticker"], "AAPL");
        let count = data[0]["daysCount"].as_u64().expect("count");
        assert_eq!(
            data[0]["historicalData"].as_array().map(Vec::len),
            Some(count as usize)
        );
    }

    #[tokio::test]
    async fn newest_first_reverses_the_series() {
        let context = test_support::context();

        let output = run(&args("ibm", true), &context).await.expect("runs");

        let bars = output.data[0]["historicalData"].as_array().expect("bars");
        assert_eq!(bars[0]["date"], "2024-06-28");
        let first = bars[0]["date"].as_str().expect("date");
        let second = bars[1]["date"].as_str().expect("date");
        assert!(first > second);
    }
}
