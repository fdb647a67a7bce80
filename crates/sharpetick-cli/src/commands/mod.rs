mod bars;
mod enhance;
mod sharpe;
mod watch;

use std::sync::Arc;

use sharpetick_core::{
    AnalysisRequest, CacheStore, JsonFileWatchlistStore, PriceSource, ReqwestHttpClient,
    ResponseCache, ServiceConfig, SharpeCalculator, StockDataService, Ticker, ValidationError,
    Watchlist, WatchlistStore, YahooAdapter,
};
use tracing::debug;

use crate::cli::{Cli, Command, TickersArgs};
use crate::config::Settings;
use crate::error::CliError;
use crate::output::CommandOutput;

/// Everything a command needs, built once per invocation.
pub struct Context {
    service: StockDataService,
    cache: CacheStore,
    store: Box<dyn WatchlistStore>,
}

impl Context {
    pub fn from_settings(settings: &Settings) -> Result<Self, CliError> {
        let timeout_ms = u64::try_from(settings.fetch_timeout.as_millis()).unwrap_or(u64::MAX);
        let source: Arc<dyn PriceSource> = if settings.mock {
            Arc::new(YahooAdapter::mock())
        } else {
            Arc::new(
                YahooAdapter::with_http_client(Arc::new(ReqwestHttpClient::new()))
                    .with_timeout_ms(timeout_ms),
            )
        };
        debug!(source = source.id(), "price source selected");

        Self::new(
            source,
            settings,
            Box::new(JsonFileWatchlistStore::new(&settings.watchlist_path)),
        )
    }

    pub fn new(
        source: Arc<dyn PriceSource>,
        settings: &Settings,
        store: Box<dyn WatchlistStore>,
    ) -> Result<Self, CliError> {
        let calculator = SharpeCalculator::with_risk_free_rate(settings.risk_free_rate)?;
        let service = StockDataService::new(source)
            .with_calculator(calculator)
            .with_config(ServiceConfig {
                revalidate: settings.cache_ttl,
                fetch_timeout: Some(settings.fetch_timeout),
                ..ServiceConfig::default()
            });

        Ok(Self {
            service,
            cache: CacheStore::new(settings.cache_ttl),
            store,
        })
    }

    fn cache(&self) -> Option<&dyn ResponseCache> {
        Some(&self.cache)
    }

    fn watchlist(&self) -> Result<Watchlist, CliError> {
        Ok(self.store.load_or_default()?)
    }

    /// Tickers given on the command line, or the watch-list when none are.
    fn tickers(&self, selection: &TickersArgs) -> Result<Vec<Ticker>, CliError> {
        match &selection.tickers {
            Some(text) => Ok(AnalysisRequest::from_text(text, None).validate()?.tickers),
            None => {
                let watchlist = self.watchlist()?;
                if watchlist.is_empty() {
                    return Err(ValidationError::NoTickers.into());
                }
                Ok(watchlist.tickers().to_vec())
            }
        }
    }
}

pub async fn run(cli: &Cli, context: &Context) -> Result<CommandOutput, CliError> {
    match &cli.command {
        Command::Bars(args) => bars::run(args, context).await,
        Command::Sharpe(args) => sharpe::run(args, context).await,
        Command::Enhance(args) => enhance::run(args, context).await,
        Command::Watch(args) => watch::run(args, context),
    }
}
