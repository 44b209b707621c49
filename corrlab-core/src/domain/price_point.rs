use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Join key for price series. Equality is exact; no tolerance window.
pub type Timestamp = DateTime<Utc>;

/// A timestamped observed price for an instrument.
///
/// Field names follow the upstream wire format (`price`, `lastUpdatedAt`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    #[serde(rename = "lastUpdatedAt")]
    pub timestamp: Timestamp,
    pub price: f64,
}

impl PricePoint {
    pub fn new(timestamp: Timestamp, price: f64) -> Self {
        Self { timestamp, price }
    }
}
