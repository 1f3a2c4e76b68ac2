//! Metrics over any outcome distribution whose value type exposes
//! success/latency via [`crate::result::Observable`].
//!
//! Uses a sorted-sample percentile walk, generalized here to weighted
//! buckets rather than equal-weight samples.

use crate::outcome::Outcomes;
use crate::result::{Observable, Seconds};

/// Fraction of total weight that is successful. `0.0` if the distribution
/// carries no weight at all.
pub fn availability<V: Observable + Clone>(o: &Outcomes<V>) -> f64 {
    let total = o.total_weight();
    if total <= 0.0 {
        return 0.0;
    }
    let success_weight: f64 = o
        .buckets()
        .iter()
        .filter(|b| b.value.is_success())
        .map(|b| b.weight)
        .sum();
    (success_weight / total).clamp(0.0, 1.0)
}

/// Weighted mean latency over successful buckets only. `0.0` when there is
/// no success mass — a deliberate "undefined means zero" choice rather
/// than a `NaN`/`Option`, keeping metrics total.
pub fn mean_latency<V: Observable + Clone>(o: &Outcomes<V>) -> f64 {
    let mut weight_sum = 0.0;
    let mut weighted_latency = 0.0;
    for b in o.buckets() {
        if b.value.is_success() {
            weight_sum += b.weight;
            weighted_latency += b.weight * b.value.get_latency().as_f64();
        }
    }
    if weight_sum <= 0.0 {
        0.0
    } else {
        weighted_latency / weight_sum
    }
}

/// Latency of the successful bucket (sorted ascending by latency) whose
/// cumulative success-weight fraction first reaches `p`. Returns `0.0`
/// when there is no success mass. When the cumulative weight lands
/// exactly on the `p` boundary, the tie breaks toward the *next* (higher
/// latency) bucket rather than the one that just cleared it — the
/// conservative reading of "at this percentile" latency.
pub fn percentile_latency<V: Observable + Clone>(o: &Outcomes<V>, p: f64) -> f64 {
    let p = p.clamp(0.0, 1.0);
    let mut successes: Vec<(f64, f64)> = o
        .buckets()
        .iter()
        .filter(|b| b.value.is_success())
        .map(|b| (b.value.get_latency().as_f64(), b.weight))
        .collect();
    if successes.is_empty() {
        return 0.0;
    }
    successes.sort_by(|a, b| {
        a.0.partial_cmp(&b.0)
            .unwrap()
            .then(a.1.partial_cmp(&b.1).unwrap())
    });
    let total_success_weight: f64 = successes.iter().map(|(_, w)| w).sum();
    if total_success_weight <= 0.0 {
        return 0.0;
    }
    let target = p * total_success_weight;
    let tie_epsilon = 1e-9 * total_success_weight.max(1.0);
    let mut cumulative = 0.0;
    for (i, (latency, weight)) in successes.iter().enumerate() {
        cumulative += weight;
        if cumulative + 1e-12 < target {
            continue;
        }
        // Cumulative weight has reached the target. If it landed exactly
        // on the boundary (a tie) and a later bucket exists, the
        // conservative choice is the higher latency of the two.
        if (cumulative - target).abs() <= tie_epsilon {
            if let Some((next_latency, _)) = successes.get(i + 1) {
                return *next_latency;
            }
        }
        return *latency;
    }
    successes.last().unwrap().0
}
