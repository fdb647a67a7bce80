use sharpetick_core::{PeriodMetrics, SharpeReportResponse};

use crate::cli::TickersArgs;
use crate::error::CliError;
use crate::output::{decimal, CommandOutput, Table};

use super::Context;

pub async fn run(args: &TickersArgs, context: &Context) -> Result<CommandOutput, CliError> {
    let tickers = context.tickers(args)?;

    let responses = context
        .service
        .sharpe_reports(&tickers, context.cache())
        .await
        .into_iter()
        .map(SharpeReportResponse::from)
        .collect::<Vec<_>>();

    let ratio = |metrics: &Option<PeriodMetrics>| decimal(metrics.map(|m| m.sharpe_ratio));
    let mut table = Table::new(vec!["ticker", "1d", "1w", "1m", "3m", "6m", "1y", "error"]);
    for response in &responses {
        table.push(vec![
            response.ticker.clone(),
            ratio(&response.yesterday),
            ratio(&response.last_week),
            ratio(&response.last_month),
            ratio(&response.last_quarter),
            ratio(&response.last_semester),
            ratio(&response.last_year),
            response.error.clone().unwrap_or_default(),
        ]);
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
    use crate::commands::test_support;

    #[tokio::test]
    async fn reports_every_period_with_enough_mock_history() {
        let context = test_support::context();

        let output = run(
            &TickersArgs {
                tickers: Some(String::from("aapl")),
            },
            &context,
        )
        .await
        .expect("runs");

        assert!(!output.has_errors);
        let report = &output.data[0];
        assert_eq!(report["ticker"], "AAPL");
        for period in ["yesterday", "lastWeek", "lastMonth", "lastQuarter", "lastSemester", "lastYear"] {
            assert!(report[period].is_object(), "{period} should be populated");
        }
        assert_eq!(report["yesterday"]["sharpeRatio"], 0.0);
        assert_eq!(output.table.rows.len(), 1);
    }
}
