//! # Cost Simulator
//!
//! Derives a synthetic execution time from a statement's structural
//! features. The stages run in a fixed order and mix additive and
//! multiplicative terms, so reordering them changes the label distribution.
//! Every uniform draw comes from the caller's stream; stages whose guard is
//! false draw nothing.

use std::sync::LazyLock;

use rand::Rng;
use rand_distr::{Distribution, Normal};
use tracing::trace;

use crate::features::FeatureVector;
use crate::generate::query::Pattern;

/// Default boundary between fast and slow statements.
pub const DEFAULT_SLOW_THRESHOLD_MS: f64 = 500.0;

/// Multiplicative noise, mean 1 with 15% spread.
static NOISE: LazyLock<Normal<f64>> =
    LazyLock::new(|| Normal::new(1.0, 0.15).expect("noise parameters are finite"));

#[inline]
fn uniform<R: Rng + ?Sized>(rng: &mut R, lo: f64, hi: f64) -> f64 {
    rng.random_range(lo..=hi)
}

/// Simulated execution time in milliseconds: at least 1.0, rounded to two
/// decimals.
pub fn simulate_execution_time<R: Rng + ?Sized>(
    features: &FeatureVector,
    pattern: Pattern,
    rng: &mut R,
) -> f64 {
    let f = features;

    // Per-table scan.
    let mut base = f64::from(f.num_tables) * uniform(rng, 15.0, 50.0);

    if f.num_joins > 0 {
        let joins = f64::from(f.num_joins);
        base += joins * uniform(rng, 60.0, 180.0);
        if f.num_joins >= 2 {
            base *= 1.0 + (joins - 1.0) * uniform(rng, 0.2, 0.5);
        }
    }

    if f.num_subqueries > 0 {
        base += f64::from(f.num_subqueries) * uniform(rng, 150.0, 400.0);
    }

    // Filters discount, never below 40% of the running cost.
    if f.num_conditions > 0 {
        let discount = 1.0 - f64::from(f.num_conditions) * uniform(rng, 0.05, 0.15);
        base *= discount.max(0.4);
    }

    if f.has_wildcard != 0 {
        base *= uniform(rng, 1.1, 1.5);
    }

    // Full sort only when nothing caps the output.
    if f.has_order_by != 0 && f.has_limit == 0 {
        base += uniform(rng, 80.0, 250.0);
    }

    if f.has_group_by != 0 {
        base += f64::from(f.num_group_columns.max(1)) * uniform(rng, 40.0, 120.0);
    }

    if f.has_having != 0 {
        base += uniform(rng, 20.0, 60.0);
    }

    if f.has_distinct != 0 {
        base += uniform(rng, 30.0, 100.0);
    }

    if f.has_limit != 0 {
        base *= uniform(rng, 0.3, 0.7);
    }

    base += f64::from(f.query_length).ln_1p() * uniform(rng, 0.5, 2.0);

    let noise: f64 = NOISE.sample(rng);
    base *= noise.max(0.5);

    let ms = round2(base.max(1.0));
    trace!(%pattern, ms, "simulated execution time");
    ms
}

/// 1 when `execution_time_ms` is strictly above `threshold_ms`.
pub fn label_slow(execution_time_ms: f64, threshold_ms: f64) -> u8 {
    u8::from(execution_time_ms > threshold_ms)
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Simulator settings carried through a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostModel {
    pub slow_threshold_ms: f64,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            slow_threshold_ms: DEFAULT_SLOW_THRESHOLD_MS,
        }
    }
}

impl CostModel {
    pub fn new(slow_threshold_ms: f64) -> Self {
        Self { slow_threshold_ms }
    }

    /// Simulate and label in one step: `(execution_time_ms, is_slow)`.
    pub fn evaluate<R: Rng + ?Sized>(
        &self,
        features: &FeatureVector,
        pattern: Pattern,
        rng: &mut R,
    ) -> (f64, u8) {
        let ms = simulate_execution_time(features, pattern, rng);
        (ms, label_slow(ms, self.slow_threshold_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn features() -> FeatureVector {
        FeatureVector {
            num_tables: 3,
            num_joins: 2,
            num_conditions: 1,
            has_wildcard: 1,
            num_where_columns: 1,
            query_length: 140,
            ..FeatureVector::default()
        }
    }

    fn has_two_decimals(x: f64) -> bool {
        ((x * 100.0).round() - x * 100.0).abs() < 1e-6
    }

    #[test]
    fn test_floor_and_rounding() {
        let mut rng = StdRng::seed_from_u64(1);
        let empty = FeatureVector::default();
        for _ in 0..1000 {
            let ms = simulate_execution_time(&empty, Pattern::SimpleSelect, &mut rng);
            assert!(ms >= 1.0);
            assert!(has_two_decimals(ms), "{}", ms);
        }
    }

    #[test]
    fn test_reproducible_under_seed() {
        let fv = features();
        let a: Vec<f64> = {
            let mut rng = StdRng::seed_from_u64(77);
            (0..50)
                .map(|_| simulate_execution_time(&fv, Pattern::SelectMultiJoin, &mut rng))
                .collect()
        };
        let b: Vec<f64> = {
            let mut rng = StdRng::seed_from_u64(77);
            (0..50)
                .map(|_| simulate_execution_time(&fv, Pattern::SelectMultiJoin, &mut rng))
                .collect()
        };
        assert_eq!(a, b);
    }

    #[test]
    fn test_joins_cost_more_on_average() {
        let mut rng = StdRng::seed_from_u64(5);
        let single = FeatureVector {
            num_tables: 1,
            query_length: 30,
            ..FeatureVector::default()
        };
        let joined = FeatureVector {
            num_tables: 3,
            num_joins: 2,
            query_length: 120,
            ..FeatureVector::default()
        };
        let n = 2000;
        let mean = |fv: &FeatureVector, rng: &mut StdRng| {
            (0..n)
                .map(|_| simulate_execution_time(fv, Pattern::SelectJoin, rng))
                .sum::<f64>()
                / n as f64
        };
        assert!(mean(&joined, &mut rng) > mean(&single, &mut rng) * 3.0);
    }

    #[test]
    fn test_limit_discounts() {
        let mut rng = StdRng::seed_from_u64(6);
        let unlimited = FeatureVector {
            num_tables: 1,
            has_order_by: 1,
            num_order_columns: 1,
            query_length: 60,
            ..FeatureVector::default()
        };
        let limited = FeatureVector {
            has_limit: 1,
            ..unlimited
        };
        let n = 2000;
        let total = |fv: &FeatureVector, rng: &mut StdRng| {
            (0..n)
                .map(|_| simulate_execution_time(fv, Pattern::SelectLimit, rng))
                .sum::<f64>()
        };
        assert!(total(&limited, &mut rng) < total(&unlimited, &mut rng));
    }

    #[test]
    fn test_label_slow_is_strict() {
        assert_eq!(label_slow(500.0, DEFAULT_SLOW_THRESHOLD_MS), 0);
        assert_eq!(label_slow(500.01, DEFAULT_SLOW_THRESHOLD_MS), 1);
        assert_eq!(label_slow(12.0, 10.0), 1);
    }

    #[test]
    fn test_cost_model_threshold() {
        let model = CostModel::new(1.0);
        let mut rng = StdRng::seed_from_u64(9);
        let (ms, slow) = model.evaluate(&features(), Pattern::SelectMultiJoin, &mut rng);
        assert_eq!(slow, u8::from(ms > 1.0));
    }
}
