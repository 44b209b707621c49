//! CorrLab Core: resilient market-data access and the correlation engine.
//!
//! This crate contains:
//! - Domain types (price points, instruments)
//! - Provider trait with a REST implementation
//! - TTL cache with bounded exponential-backoff retry
//! - Typed gateway over the cache (catalog, latest price, history)
//! - Pairwise time alignment
//! - Series statistics, Pearson correlation and correlation matrices

pub mod config;
pub mod data;
pub mod domain;
pub mod stats;

pub use config::{CacheConfig, ConfigError, CorrLabConfig, MatrixConfig, ProviderConfig};
pub use data::{
    align, AlignedPoint, DataFetchFailure, HttpProvider, MarketDataGateway, MarketDataProvider,
    RetryingCache, StockCatalog, TransportError,
};
pub use domain::{Instrument, PricePoint, Symbol, Timestamp};
pub use stats::{
    correlation, mean_and_std_dev, CorrelationMatrix, CorrelationMatrixBuilder,
    MatrixBuildFailure, SeriesSummary, DEFAULT_LIMIT,
};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: shared types are Send + Sync, so a gateway can sit
    /// behind an `Arc` and be driven from any runtime worker.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<PricePoint>();
        require_sync::<PricePoint>();
        require_send::<Instrument>();
        require_sync::<Instrument>();
        require_send::<RetryingCache>();
        require_sync::<RetryingCache>();
        require_send::<MarketDataGateway>();
        require_sync::<MarketDataGateway>();
        require_send::<HttpProvider>();
        require_sync::<HttpProvider>();
        require_send::<CorrelationMatrix>();
        require_sync::<CorrelationMatrix>();
        require_send::<DataFetchFailure>();
        require_sync::<DataFetchFailure>();
        require_send::<MatrixBuildFailure>();
        require_sync::<MatrixBuildFailure>();
    }

    /// Gateway futures must be Send so callers can `tokio::spawn` them.
    #[allow(dead_code)]
    fn gateway_futures_are_send(gateway: &MarketDataGateway) {
        fn require_send<T: Send>(_: T) {}
        require_send(gateway.list_instruments());
        require_send(gateway.get_history("SYM", 5));
        require_send(CorrelationMatrixBuilder::new(gateway).build(&[], 5, 1));
    }
}
