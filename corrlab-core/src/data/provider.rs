//! Market-data provider trait and transport error taxonomy.
//!
//! The MarketDataProvider trait abstracts over the upstream source (the REST
//! API in production, scripted fakes in tests). The cache layer sits above
//! this trait; providers don't know about caching or retries.

use crate::domain::PricePoint;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Catalog response from `GET /stocks`: display name → symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StockCatalog {
    pub stocks: HashMap<String, String>,
}

/// Transport-level failures, classified at the provider boundary.
///
/// Each variant renders as a distinct human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("access forbidden")]
    Forbidden,

    #[error("resource not found")]
    NotFound,

    #[error("malformed request")]
    BadRequest,

    #[error("certificate validation failed")]
    Certificate,

    #[error("unexpected failure: {0}")]
    Unexpected(String),
}

impl TransportError {
    /// Map a non-success HTTP status to a transport error.
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => TransportError::BadRequest,
            403 => TransportError::Forbidden,
            404 => TransportError::NotFound,
            408 | 504 => TransportError::Timeout,
            other => TransportError::Unexpected(format!("HTTP {other}")),
        }
    }
}

/// Upstream market-data source.
///
/// `history` hands back the raw JSON body: deciding what counts as a
/// well-formed series is the gateway's job, not the transport's.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch the instrument catalog.
    async fn list_stocks(&self) -> Result<StockCatalog, TransportError>;

    /// Fetch the most recent price point for a symbol.
    async fn latest_price(&self, symbol: &str) -> Result<PricePoint, TransportError>;

    /// Fetch price points over the trailing `minutes` window.
    async fn history(
        &self,
        symbol: &str,
        minutes: u32,
    ) -> Result<serde_json::Value, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_is_distinct() {
        assert_eq!(TransportError::from_status(400), TransportError::BadRequest);
        assert_eq!(TransportError::from_status(403), TransportError::Forbidden);
        assert_eq!(TransportError::from_status(404), TransportError::NotFound);
        assert_eq!(TransportError::from_status(504), TransportError::Timeout);
        assert_eq!(
            TransportError::from_status(500),
            TransportError::Unexpected("HTTP 500".into())
        );
    }

    #[test]
    fn messages_are_human_readable() {
        let messages: Vec<String> = [
            TransportError::Timeout,
            TransportError::Forbidden,
            TransportError::NotFound,
            TransportError::BadRequest,
            TransportError::Certificate,
            TransportError::Unexpected("boom".into()),
        ]
        .iter()
        .map(|e| e.to_string())
        .collect();

        let mut unique = messages.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), messages.len());
        assert_eq!(messages[5], "unexpected failure: boom");
    }
}
