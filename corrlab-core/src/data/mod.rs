//! Market-data access: provider, retrying cache, gateway, alignment

pub mod align;
pub mod cache;
pub mod gateway;
pub mod http;
pub mod provider;

pub use align::{align, AlignedPoint};
pub use cache::{CacheEntry, DataFetchFailure, RetryingCache};
pub use gateway::MarketDataGateway;
pub use http::HttpProvider;
pub use provider::{MarketDataProvider, StockCatalog, TransportError};
