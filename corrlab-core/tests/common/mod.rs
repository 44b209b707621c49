//! Scripted in-memory provider shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use corrlab_core::data::{MarketDataProvider, StockCatalog, TransportError};
use corrlab_core::domain::PricePoint;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

/// Canned per-endpoint outcomes plus call counters.
#[derive(Default)]
pub struct ScriptedProvider {
    catalog: Mutex<Option<Result<StockCatalog, TransportError>>>,
    prices: Mutex<HashMap<String, Result<PricePoint, TransportError>>>,
    histories: Mutex<HashMap<String, Result<Value, TransportError>>>,
    latency: std::time::Duration,
    calls: Mutex<HashMap<String, u32>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call sleeps this long (tokio time) before answering.
    pub fn with_latency(mut self, latency: std::time::Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_catalog(self, entries: &[(&str, &str)]) -> Self {
        let stocks = entries
            .iter()
            .map(|(name, symbol)| (name.to_string(), symbol.to_string()))
            .collect();
        *self.catalog.lock().unwrap() = Some(Ok(StockCatalog { stocks }));
        self
    }

    pub fn with_catalog_error(self, err: TransportError) -> Self {
        *self.catalog.lock().unwrap() = Some(Err(err));
        self
    }

    pub fn with_price(self, symbol: &str, point: PricePoint) -> Self {
        self.prices.lock().unwrap().insert(symbol.to_string(), Ok(point));
        self
    }

    pub fn with_history(self, symbol: &str, points: &[PricePoint]) -> Self {
        let value = serde_json::to_value(points).unwrap();
        self.with_raw_history(symbol, value)
    }

    pub fn with_raw_history(self, symbol: &str, value: Value) -> Self {
        self.histories.lock().unwrap().insert(symbol.to_string(), Ok(value));
        self
    }

    pub fn with_history_error(self, symbol: &str, err: TransportError) -> Self {
        self.histories.lock().unwrap().insert(symbol.to_string(), Err(err));
        self
    }

    /// Number of provider calls recorded under `endpoint` (e.g. `history:AAPL`).
    pub fn calls(&self, endpoint: &str) -> u32 {
        self.calls.lock().unwrap().get(endpoint).copied().unwrap_or(0)
    }

    fn count(&self, endpoint: String) {
        *self.calls.lock().unwrap().entry(endpoint).or_insert(0) += 1;
    }

    async fn delay(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl MarketDataProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn list_stocks(&self) -> Result<StockCatalog, TransportError> {
        self.count("catalog".into());
        self.delay().await;
        self.catalog
            .lock()
            .unwrap()
            .clone()
            .unwrap_or(Err(TransportError::NotFound))
    }

    async fn latest_price(&self, symbol: &str) -> Result<PricePoint, TransportError> {
        self.count(format!("price:{symbol}"));
        self.delay().await;
        self.prices
            .lock()
            .unwrap()
            .get(symbol)
            .cloned()
            .unwrap_or(Err(TransportError::NotFound))
    }

    async fn history(&self, symbol: &str, minutes: u32) -> Result<Value, TransportError> {
        self.count(format!("history:{symbol}"));
        self.count(format!("history:{symbol}:{minutes}"));
        self.delay().await;
        self.histories
            .lock()
            .unwrap()
            .get(symbol)
            .cloned()
            .unwrap_or(Err(TransportError::NotFound))
    }
}

/// Minute-spaced series starting at a fixed instant.
pub fn series(prices: &[f64]) -> Vec<PricePoint> {
    let t0 = Utc.with_ymd_and_hms(2024, 1, 2, 9, 30, 0).unwrap();
    prices
        .iter()
        .enumerate()
        .map(|(i, &p)| PricePoint::new(t0 + Duration::minutes(i as i64), p))
        .collect()
}
