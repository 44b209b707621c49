//! Time-bounded cache with bounded exponential-backoff retry.
//!
//! `RetryingCache::resolve` serves a fresh entry without touching the
//! operation; otherwise it runs the operation up to `max_retries + 1` times,
//! sleeping `initial_delay * 2^attempt` between failures, and stores the first
//! success. Failure never evicts: an expired entry stays in place until a
//! later success overwrites it.
//!
//! Payloads are stored as `serde_json::Value`, so one cache serves every
//! operation type. Keys must be distinct per operation (the gateway's job).

use super::provider::TransportError;
use crate::config::CacheConfig;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, warn};

/// Raised after every attempt for a key has failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataFetchFailure {
    #[error("failed to fetch '{key}' after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        key: String,
        attempts: u32,
        #[source]
        last_error: TransportError,
    },
}

impl DataFetchFailure {
    pub fn attempts(&self) -> u32 {
        match self {
            DataFetchFailure::RetriesExhausted { attempts, .. } => *attempts,
        }
    }

    pub fn last_error(&self) -> &TransportError {
        match self {
            DataFetchFailure::RetriesExhausted { last_error, .. } => last_error,
        }
    }
}

/// One stored payload. Replaced whole on refresh, never patched.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: String,
    pub payload: serde_json::Value,
    pub stored_at: Instant,
}

type Gate = Arc<tokio::sync::Mutex<()>>;

/// TTL cache + retry wrapper around fallible fetch operations.
pub struct RetryingCache {
    policy: CacheConfig,
    entries: Mutex<HashMap<String, CacheEntry>>,
    in_flight: Mutex<HashMap<String, Gate>>,
}

impl Default for RetryingCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl RetryingCache {
    pub fn new(policy: CacheConfig) -> Self {
        Self {
            policy,
            entries: Mutex::new(HashMap::new()),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> &CacheConfig {
        &self.policy
    }

    /// Return the fresh cached value for `key`, or fetch it with retry.
    pub async fn resolve<T, F, Fut>(&self, key: &str, operation: F) -> Result<T, DataFetchFailure>
    where
        T: Serialize + DeserializeOwned,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, TransportError>>,
    {
        if let Some(hit) = self.lookup(key) {
            return Ok(hit);
        }

        if !self.policy.coalesce_in_flight {
            return self.fetch_with_retry(key, operation).await;
        }

        // Callers for the same key queue here; whoever gets in second sees
        // the first caller's stored result.
        let gate = self.gate(key);
        let result = {
            let _guard = gate.lock().await;
            match self.lookup(key) {
                Some(hit) => {
                    debug!(key, "served by coalesced in-flight fetch");
                    Ok(hit)
                }
                None => self.fetch_with_retry(key, operation).await,
            }
        };
        self.release_gate(key, &gate);
        result
    }

    /// Snapshot of the stored entry for `key`, fresh or not.
    pub fn entry(&self, key: &str) -> Option<CacheEntry> {
        self.entries().get(key).cloned()
    }

    /// Drop the entry for `key`. Returns whether one was present.
    pub fn invalidate(&self, key: &str) -> bool {
        self.entries().remove(key).is_some()
    }

    pub fn clear(&self) {
        self.entries().clear();
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lookup<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let payload = {
            let entries = self.entries();
            let entry = entries.get(key)?;
            if entry.stored_at.elapsed() >= self.policy.ttl() {
                debug!(key, "cache entry expired");
                return None;
            }
            entry.payload.clone()
        };

        match serde_json::from_value(payload) {
            Ok(value) => {
                debug!(key, "cache hit");
                Some(value)
            }
            Err(e) => {
                warn!(key, "cached payload has unexpected shape, refetching: {e}");
                None
            }
        }
    }

    fn store<T: Serialize>(&self, key: &str, value: &T) {
        match serde_json::to_value(value) {
            Ok(payload) => {
                let entry = CacheEntry {
                    key: key.to_string(),
                    payload,
                    stored_at: Instant::now(),
                };
                self.entries().insert(key.to_string(), entry);
            }
            Err(e) => warn!(key, "payload not cacheable: {e}"),
        }
    }

    async fn fetch_with_retry<T, F, Fut>(
        &self,
        key: &str,
        mut operation: F,
    ) -> Result<T, DataFetchFailure>
    where
        T: Serialize,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, TransportError>>,
    {
        let attempts = self.policy.max_retries.saturating_add(1);
        let mut last_error = None;

        for attempt in 0..attempts {
            match operation().await {
                Ok(value) => {
                    self.store(key, &value);
                    return Ok(value);
                }
                Err(e) => {
                    if attempt + 1 < attempts {
                        let delay = self.policy.backoff(attempt);
                        warn!(key, attempt = attempt + 1, ?delay, "fetch failed, retrying: {e}");
                        last_error = Some(e);
                        sleep(delay).await;
                    } else {
                        last_error = Some(e);
                    }
                }
            }
        }

        let last_error = last_error
            .unwrap_or_else(|| TransportError::Unexpected("no attempt was made".into()));
        error!(key, attempts, "giving up: {last_error}");
        Err(DataFetchFailure::RetriesExhausted {
            key: key.to_string(),
            attempts,
            last_error,
        })
    }

    fn gate(&self, key: &str) -> Gate {
        let mut gates = self.in_flight.lock().unwrap_or_else(|p| p.into_inner());
        gates.entry(key.to_string()).or_default().clone()
    }

    /// Drop the gate once no other caller holds a handle to it.
    fn release_gate(&self, key: &str, gate: &Gate) {
        let mut gates = self.in_flight.lock().unwrap_or_else(|p| p.into_inner());
        if Arc::strong_count(gate) <= 2 {
            gates.remove(key);
        }
    }
}
