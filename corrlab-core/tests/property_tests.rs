//! Property tests for alignment and correlation invariants.
//!
//! Uses proptest to verify:
//! 1. Aligning a series with itself keeps every distinct timestamp
//! 2. Correlation stays within [-1, 1] and ignores argument order
//! 3. Matrices are square, unit-diagonal and symmetric

use chrono::{Duration, TimeZone, Utc};
use corrlab_core::data::align;
use corrlab_core::domain::PricePoint;
use corrlab_core::stats::{compute_matrix, correlation};
use proptest::prelude::*;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_prices(max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec((1.0..1000.0_f64).prop_map(|p| (p * 100.0).round() / 100.0), 0..max_len)
}

fn to_series(prices: &[f64], offset_minutes: i64) -> Vec<PricePoint> {
    let t0 = Utc.with_ymd_and_hms(2024, 1, 2, 9, 30, 0).unwrap();
    prices
        .iter()
        .enumerate()
        .map(|(i, &p)| PricePoint::new(t0 + Duration::minutes(i as i64 + offset_minutes), p))
        .collect()
}

// ── 1. Alignment ─────────────────────────────────────────────────────

proptest! {
    #[test]
    fn self_alignment_keeps_every_point(prices in arb_prices(64)) {
        let a = to_series(&prices, 0);
        let b = a.clone();
        prop_assert_eq!(align(&a, &b).len(), a.len());
    }

    #[test]
    fn aligned_length_is_bounded_by_overlap(
        a in arb_prices(40),
        b in arb_prices(40),
        shift in 0i64..50,
    ) {
        let sa = to_series(&a, 0);
        let sb = to_series(&b, shift);
        let overlap = (a.len() as i64).min(b.len() as i64 + shift) - shift;
        prop_assert_eq!(align(&sa, &sb).len() as i64, overlap.max(0));
    }
}

// ── 2. Correlation ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn correlation_is_bounded(a in arb_prices(50), b in arb_prices(50)) {
        let r = correlation(&to_series(&a, 0), &to_series(&b, 0));
        prop_assert!((-1.0..=1.0).contains(&r), "r = {}", r);
    }

    #[test]
    fn correlation_ignores_argument_order(a in arb_prices(50), b in arb_prices(50)) {
        let sa = to_series(&a, 0);
        let sb = to_series(&b, 0);
        prop_assert!((correlation(&sa, &sb) - correlation(&sb, &sa)).abs() < 1e-12);
    }

    #[test]
    fn positive_affine_copy_correlates_to_one(
        a in arb_prices(50),
        scale in 0.5..4.0_f64,
        shift in -50.0..50.0_f64,
    ) {
        let sa = to_series(&a, 0);
        let scaled: Vec<f64> = a.iter().map(|p| p * scale + shift).collect();
        let sb = to_series(&scaled, 0);
        let r = correlation(&sa, &sb);

        let distinct = a.windows(2).any(|w| w[0] != w[1]);
        if a.len() >= 2 && distinct {
            prop_assert!((r - 1.0).abs() < 1e-9, "r = {}", r);
        } else {
            prop_assert_eq!(r, 0.0);
        }
    }
}

// ── 3. Matrix ─────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn matrix_is_square_symmetric_unit_diagonal(
        histories in prop::collection::vec(arb_prices(30), 0..6),
    ) {
        let series: Vec<Vec<PricePoint>> = histories.iter().map(|h| to_series(h, 0)).collect();
        let symbols = (0..series.len()).map(|i| format!("S{i}")).collect();
        let matrix = compute_matrix(symbols, &series);

        prop_assert_eq!(matrix.size(), series.len());
        for i in 0..matrix.size() {
            prop_assert_eq!(matrix.get(i, i), Some(1.0));
            for j in 0..matrix.size() {
                let (a, b) = (matrix.get(i, j).unwrap(), matrix.get(j, i).unwrap());
                prop_assert!((a - b).abs() < 1e-12);
            }
        }
        prop_assert!(matrix.verify().is_ok());
    }
}
