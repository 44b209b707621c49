//! Pairwise correlation matrix over a batch of instruments.
//!
//! Histories are fetched concurrently through the gateway (fan-out /
//! fan-in). A failed fetch degrades to an empty history for that
//! instrument instead of failing the batch, so its off-diagonal cells are 0.
//!
//! Every off-diagonal cell is computed on its own, `[j][i]` included, and
//! the finished matrix is checked for symmetry.

use super::summary::correlation;
use crate::data::cache::DataFetchFailure;
use crate::data::gateway::MarketDataGateway;
use crate::domain::{Instrument, PricePoint};
use futures_util::future::join_all;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;
use tracing::{debug, warn};

/// Instruments considered per build unless the caller says otherwise.
pub const DEFAULT_LIMIT: usize = 10;

const SYMMETRY_TOLERANCE: f64 = 1e-9;

/// Failures outside the per-instrument fetch guard.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatrixBuildFailure {
    #[error("malformed matrix: {0}")]
    Malformed(String),

    #[error("failed to load instrument catalog: {0}")]
    Catalog(#[from] DataFetchFailure),

    #[error("matrix is not symmetric at [{row}][{col}] (delta {delta:e})")]
    Asymmetric { row: usize, col: usize, delta: f64 },

    #[error("matrix cell [{row}][{col}] is not finite")]
    NonFinite { row: usize, col: usize },
}

/// Square correlation matrix indexed like its symbol list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    symbols: Vec<String>,
    values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn values(&self) -> &[Vec<f64>] {
        &self.values
    }

    pub fn size(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.values.get(row)?.get(col).copied()
    }

    /// Correlation between two symbols, by name.
    pub fn between(&self, a: &str, b: &str) -> Option<f64> {
        let row = self.symbols.iter().position(|s| s == a)?;
        let col = self.symbols.iter().position(|s| s == b)?;
        self.get(row, col)
    }

    /// Check squareness, finiteness and symmetry.
    pub fn verify(&self) -> Result<(), MatrixBuildFailure> {
        let n = self.values.len();
        if self.symbols.len() != n || self.values.iter().any(|row| row.len() != n) {
            return Err(MatrixBuildFailure::Malformed(format!(
                "matrix for {} symbols is not {n}x{n}",
                self.symbols.len()
            )));
        }
        for row in 0..n {
            for col in 0..n {
                let v = self.values[row][col];
                if !v.is_finite() {
                    return Err(MatrixBuildFailure::NonFinite { row, col });
                }
                if col > row {
                    let delta = (v - self.values[col][row]).abs();
                    if delta > SYMMETRY_TOLERANCE {
                        return Err(MatrixBuildFailure::Asymmetric { row, col, delta });
                    }
                }
            }
        }
        Ok(())
    }

    /// Write as CSV: a header of symbols, then one labelled row per symbol.
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut wtr = csv::Writer::from_writer(writer);

        let mut header = Vec::with_capacity(self.symbols.len() + 1);
        header.push(String::new());
        header.extend(self.symbols.iter().cloned());
        wtr.write_record(&header)?;

        for (symbol, row) in self.symbols.iter().zip(&self.values) {
            let mut record = Vec::with_capacity(row.len() + 1);
            record.push(symbol.clone());
            record.extend(row.iter().map(|v| format!("{v:.6}")));
            wtr.write_record(&record)?;
        }

        wtr.flush()?;
        Ok(())
    }
}

/// Compute the matrix for already-fetched histories.
///
/// Diagonal cells are exactly 1; the rest are computed cell by cell.
pub fn compute_matrix(symbols: Vec<String>, histories: &[Vec<PricePoint>]) -> CorrelationMatrix {
    let n = histories.len();
    let values: Vec<Vec<f64>> = (0..n)
        .into_par_iter()
        .map(|i| {
            (0..n)
                .map(|j| {
                    if i == j {
                        1.0
                    } else {
                        correlation(&histories[i], &histories[j])
                    }
                })
                .collect::<Vec<f64>>()
        })
        .collect();

    CorrelationMatrix { symbols, values }
}

/// Builds correlation matrices from gateway histories.
pub struct CorrelationMatrixBuilder<'a> {
    gateway: &'a MarketDataGateway,
}

impl<'a> CorrelationMatrixBuilder<'a> {
    pub fn new(gateway: &'a MarketDataGateway) -> Self {
        Self { gateway }
    }

    /// Matrix for the first `limit` instruments over the trailing window.
    pub async fn build(
        &self,
        instruments: &[Instrument],
        window_minutes: u32,
        limit: usize,
    ) -> Result<CorrelationMatrix, MatrixBuildFailure> {
        let selected = &instruments[..instruments.len().min(limit)];
        debug!(
            requested = instruments.len(),
            selected = selected.len(),
            window_minutes,
            "building correlation matrix"
        );

        let histories = self.fetch_histories(selected, window_minutes).await;
        let symbols = selected.iter().map(|i| i.symbol.clone()).collect();
        let matrix = compute_matrix(symbols, &histories);
        matrix.verify()?;
        Ok(matrix)
    }

    /// Matrix for the first `limit` entries of the gateway's catalog.
    pub async fn build_for_catalog(
        &self,
        window_minutes: u32,
        limit: usize,
    ) -> Result<CorrelationMatrix, MatrixBuildFailure> {
        let instruments = self.gateway.list_instruments().await?;
        self.build(&instruments, window_minutes, limit).await
    }

    async fn fetch_histories(
        &self,
        instruments: &[Instrument],
        window_minutes: u32,
    ) -> Vec<Vec<PricePoint>> {
        let fetches = instruments.iter().map(|instrument| async move {
            match self.gateway.get_history(&instrument.symbol, window_minutes).await {
                Ok(history) => history,
                Err(e) => {
                    warn!(
                        symbol = %instrument.symbol,
                        "history unavailable, substituting empty series: {e}"
                    );
                    Vec::new()
                }
            }
        });
        join_all(fetches).await
    }
}
