//! Typed market-data fetches routed through `RetryingCache`.
//!
//! Each operation owns a distinct key namespace so entries never collide
//! across operation types:
//! - catalog: `all_stocks`
//! - latest price: `stock_price_{symbol}`
//! - history: `stock_history_{symbol}_{minutes}`

use super::cache::{DataFetchFailure, RetryingCache};
use super::provider::{MarketDataProvider, TransportError};
use crate::domain::{Instrument, PricePoint};
use crate::stats::summary::{mean_and_std_dev, SeriesSummary};
use std::sync::Arc;
use tracing::warn;

pub const CATALOG_KEY: &str = "all_stocks";

pub fn price_key(symbol: &str) -> String {
    format!("stock_price_{symbol}")
}

pub fn history_key(symbol: &str, window_minutes: u32) -> String {
    format!("stock_history_{symbol}_{window_minutes}")
}

/// Market-data access for the correlation engine and its callers.
pub struct MarketDataGateway {
    provider: Arc<dyn MarketDataProvider>,
    cache: RetryingCache,
}

impl MarketDataGateway {
    pub fn new(provider: Arc<dyn MarketDataProvider>, cache: RetryingCache) -> Self {
        Self { provider, cache }
    }

    pub fn cache(&self) -> &RetryingCache {
        &self.cache
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// The instrument catalog, ordered by display name.
    pub async fn list_instruments(&self) -> Result<Vec<Instrument>, DataFetchFailure> {
        let provider = &self.provider;
        self.cache
            .resolve(CATALOG_KEY, || async move {
                let catalog = provider.list_stocks().await?;
                let mut instruments: Vec<Instrument> = catalog
                    .stocks
                    .into_iter()
                    .map(|(display_name, symbol)| Instrument::new(symbol, display_name))
                    .collect();
                instruments.sort_by(|a, b| {
                    a.display_name
                        .cmp(&b.display_name)
                        .then_with(|| a.symbol.cmp(&b.symbol))
                });
                Ok::<_, TransportError>(instruments)
            })
            .await
    }

    pub async fn get_latest_price(&self, symbol: &str) -> Result<PricePoint, DataFetchFailure> {
        let provider = &self.provider;
        self.cache
            .resolve(&price_key(symbol), || provider.latest_price(symbol))
            .await
    }

    /// Price points over the trailing window. A response that is not a
    /// well-formed sequence of price points resolves to an empty history.
    pub async fn get_history(
        &self,
        symbol: &str,
        window_minutes: u32,
    ) -> Result<Vec<PricePoint>, DataFetchFailure> {
        let provider = &self.provider;
        self.cache
            .resolve(&history_key(symbol, window_minutes), || async move {
                let raw = provider.history(symbol, window_minutes).await?;
                Ok::<_, TransportError>(parse_history(symbol, raw))
            })
            .await
    }

    /// Average and sample standard deviation over the trailing window.
    pub async fn get_summary(
        &self,
        symbol: &str,
        window_minutes: u32,
    ) -> Result<SeriesSummary, DataFetchFailure> {
        let history = self.get_history(symbol, window_minutes).await?;
        Ok(mean_and_std_dev(&history))
    }
}

fn parse_history(symbol: &str, raw: serde_json::Value) -> Vec<PricePoint> {
    if !raw.is_array() {
        warn!(symbol, "history response is not a sequence, treating as empty");
        return Vec::new();
    }
    match serde_json::from_value(raw) {
        Ok(points) => points,
        Err(e) => {
            warn!(symbol, "history response is malformed, treating as empty: {e}");
            Vec::new()
        }
    }
}
