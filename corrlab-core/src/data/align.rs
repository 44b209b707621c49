//! Pairwise time alignment.
//!
//! Inner join of two price series on exact timestamp equality. No
//! interpolation, no tolerance window, no forward-fill.

use crate::domain::{PricePoint, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One timestamp present in both series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlignedPoint {
    pub timestamp: Timestamp,
    pub value_a: f64,
    pub value_b: f64,
}

/// Timestamp → price map that remembers first-insertion order.
///
/// Repeated timestamps overwrite the price (last write wins) but keep the
/// position of their first occurrence.
struct PriceIndex {
    order: Vec<Timestamp>,
    prices: HashMap<Timestamp, f64>,
}

impl PriceIndex {
    fn build(series: &[PricePoint]) -> Self {
        let mut order = Vec::with_capacity(series.len());
        let mut prices = HashMap::with_capacity(series.len());
        for point in series {
            if prices.insert(point.timestamp, point.price).is_none() {
                order.push(point.timestamp);
            }
        }
        Self { order, prices }
    }
}

/// Align two series on shared timestamps.
///
/// Output follows series A's timestamp order. That is chronological only if
/// A was; callers must not assume sorted output.
pub fn align(series_a: &[PricePoint], series_b: &[PricePoint]) -> Vec<AlignedPoint> {
    let a = PriceIndex::build(series_a);
    let b = PriceIndex::build(series_b);

    a.order
        .iter()
        .filter_map(|ts| {
            let value_b = *b.prices.get(ts)?;
            Some(AlignedPoint {
                timestamp: *ts,
                value_a: a.prices[ts],
                value_b,
            })
        })
        .collect()
}
