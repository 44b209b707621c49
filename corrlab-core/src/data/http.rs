//! REST market-data provider.
//!
//! Talks to the upstream stocks API over HTTP/JSON:
//! - `GET {base}/stocks`: catalog
//! - `GET {base}/stocks/{symbol}`: latest price point
//! - `GET {base}/stocks/{symbol}?minutes={n}`: trailing history
//!
//! This layer performs exactly one request per call and classifies failures.
//! Retries and caching belong to `RetryingCache`.

use super::provider::{MarketDataProvider, StockCatalog, TransportError};
use crate::config::ProviderConfig;
use crate::domain::PricePoint;
use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// HTTP provider backed by a shared reqwest client.
pub struct HttpProvider {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .user_agent(concat!("corrlab/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::Unexpected(format!("failed to build HTTP client: {e}")))?;

        let base = config.base_url.trim_end_matches('/');
        let base_url = Url::parse(base)
            .map_err(|e| TransportError::Unexpected(format!("invalid base URL '{base}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(TransportError::Unexpected(format!(
                "base URL '{base}' cannot carry a path"
            )));
        }

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Base URL extended by `segments`, each percent-encoded as one path segment.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Always Ok: `new` rejects cannot-be-a-base URLs.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn stocks_url(&self) -> Url {
        self.endpoint(&["stocks"])
    }

    fn stock_url(&self, symbol: &str) -> Url {
        self.endpoint(&["stocks", symbol])
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, TransportError> {
        let resp = request.send().await.map_err(classify)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(TransportError::from_status(status.as_u16()));
        }
        Ok(resp)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, TransportError> {
        let resp = self.send(self.client.get(url.clone())).await?;
        resp.json::<T>()
            .await
            .map_err(|e| TransportError::Unexpected(format!("malformed response from {url}: {e}")))
    }
}

/// Classify a raw reqwest failure into the transport taxonomy.
fn classify(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        return TransportError::Timeout;
    }
    if let Some(status) = err.status() {
        return TransportError::from_status(status.as_u16());
    }
    if is_certificate_error(&err) {
        return TransportError::Certificate;
    }
    if err.is_builder() {
        return TransportError::BadRequest;
    }
    TransportError::Unexpected(err.to_string())
}

/// TLS failures surface only as text somewhere in the source chain.
fn is_certificate_error(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if e.to_string().to_lowercase().contains("certificate") {
            return true;
        }
        current = e.source();
    }
    false
}

#[async_trait]
impl MarketDataProvider for HttpProvider {
    fn name(&self) -> &str {
        "http"
    }

    async fn list_stocks(&self) -> Result<StockCatalog, TransportError> {
        self.get_json(self.stocks_url()).await
    }

    async fn latest_price(&self, symbol: &str) -> Result<PricePoint, TransportError> {
        self.get_json(self.stock_url(symbol)).await
    }

    async fn history(
        &self,
        symbol: &str,
        minutes: u32,
    ) -> Result<serde_json::Value, TransportError> {
        let request = self
            .client
            .get(self.stock_url(symbol))
            .query(&[("minutes", minutes)]);
        let resp = self.send(request).await?;

        // A body that isn't JSON is just another non-sequence.
        match resp.json::<serde_json::Value>().await {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::warn!(symbol, "history body is not JSON: {e}");
                Ok(serde_json::Value::Null)
            }
        }
    }
}
