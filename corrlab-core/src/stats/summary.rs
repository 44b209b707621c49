//! Single-series statistics and pairwise Pearson correlation.
//!
//! Two variance divisors are in play and both are kept as-is:
//! - the Average/StdDev summary uses the sample divisor (`n - 1`)
//! - `variance` exposes both so callers can pick explicitly
//!
//! Correlation accumulates with `n - 1`; the divisor cancels in the ratio.

use crate::data::align::align;
use crate::domain::PricePoint;
use serde::{Deserialize, Serialize};

/// Variance divisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Normalization {
    /// Divide by `n - 1`.
    Sample,
    /// Divide by `n`.
    Population,
}

/// Average and standard deviation of one price series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesSummary {
    pub average: f64,
    pub standard_deviation: f64,
    pub count: usize,
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Variance with the given divisor. Sample variance of fewer than two values
/// is NaN; population variance of an empty slice is NaN.
pub fn variance(values: &[f64], normalization: Normalization) -> f64 {
    let n = values.len();
    let divisor = match normalization {
        Normalization::Sample => n.wrapping_sub(1),
        Normalization::Population => n,
    };
    if n == 0 || divisor == 0 {
        return f64::NAN;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / divisor as f64
}

/// Average and sample standard deviation of the series' prices.
///
/// An empty series summarizes to zeros; a single point has an undefined
/// (NaN) standard deviation.
pub fn mean_and_std_dev(series: &[PricePoint]) -> SeriesSummary {
    if series.is_empty() {
        return SeriesSummary {
            average: 0.0,
            standard_deviation: 0.0,
            count: 0,
        };
    }
    let prices: Vec<f64> = series.iter().map(|p| p.price).collect();
    SeriesSummary {
        average: mean(&prices),
        standard_deviation: variance(&prices, Normalization::Sample).sqrt(),
        count: prices.len(),
    }
}

/// Pearson correlation of two series over their shared timestamps.
///
/// Returns 0 when either series has fewer than two points, when fewer than
/// two timestamps align, when either aligned side is constant, or when the
/// result is not finite. Passing the same slice twice is exactly 1. The
/// result is clamped to `[-1, 1]`.
pub fn correlation(series_a: &[PricePoint], series_b: &[PricePoint]) -> f64 {
    if series_a.len() < 2 || series_b.len() < 2 {
        return 0.0;
    }
    if std::ptr::eq(series_a, series_b) {
        return 1.0;
    }

    let aligned = align(series_a, series_b);
    let n = aligned.len();
    if n < 2 {
        return 0.0;
    }

    let xs: Vec<f64> = aligned.iter().map(|p| p.value_a).collect();
    let ys: Vec<f64> = aligned.iter().map(|p| p.value_b).collect();
    // Equality on the raw values; a rounded mean leaves residue in the deviations.
    if is_constant(&xs) || is_constant(&ys) {
        return 0.0;
    }

    // r is scale-invariant, so normalize by max-abs to keep products finite.
    let xs = scaled(&xs);
    let ys = scaled(&ys);
    let mean_a = mean(&xs);
    let mean_b = mean(&ys);

    let (mut cov, mut var_a, mut var_b) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(&ys) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }
    let divisor = (n - 1) as f64;
    cov /= divisor;
    let sd_a = (var_a / divisor).sqrt();
    let sd_b = (var_b / divisor).sqrt();

    if sd_a == 0.0 || sd_b == 0.0 {
        return 0.0;
    }

    let r = cov / (sd_a * sd_b);
    if !r.is_finite() {
        return 0.0;
    }
    r.clamp(-1.0, 1.0)
}

fn is_constant(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] == w[1])
}

fn scaled(values: &[f64]) -> Vec<f64> {
    let magnitude = values.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
    if magnitude == 0.0 || !magnitude.is_finite() {
        return values.to_vec();
    }
    values.iter().map(|v| v / magnitude).collect()
}
