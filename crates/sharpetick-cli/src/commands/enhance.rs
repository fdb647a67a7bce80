use sharpetick_core::{AnalysisRequest, EnhancedSeriesResponse, ValidationError};

use crate::cli::EnhanceArgs;
use crate::error::CliError;
use crate::output::{decimal, CommandOutput, Table};

use super::Context;

pub async fn run(args: &EnhanceArgs, context: &Context) -> Result<CommandOutput, CliError> {
    let request = AnalysisRequest::from_text(&args.ticker, args.lookback.as_deref()).validate()?;
    let [ticker] = request.tickers.as_slice() else {
        return Err(ValidationError::TooManyTickers {
            count: request.tickers.len(),
            max: 1,
        }
        .into());
    };
    let lookback = match request.lookback {
        Some(lookback) => lookback,
        None => context.watchlist()?.lookback(),
    };

    let response = EnhancedSeriesResponse::from(
        context
            .service
            .enhanced_series(ticker, lookback, context.cache())
            .await,
    );

    let mut table = Table::new(vec!["date", "close", "return %", "std dev", "sharpe"]);
    for point in &response.historical_data {
        table.push(vec![
            point.point.date.to_string(),
            decimal(Some(point.point.close)),
            decimal(point.trailing_return),
            decimal(point.std_dev),
            decimal(point.sharpe_ratio),
        ]);
    }
    if let Some(error) = &response.error {
        table.push(vec![
            String::from("error"),
            error.clone(),
            String::new(),
            String::new(),
            String::new(),
        ]);
    }

    Ok(CommandOutput {
        has_errors: response.error.is_some(),
        data: serde_json::to_value(&response)?,
        table,
    })
}
