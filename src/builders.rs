//! Distribution builders: construct an outcome from empirical percentile
//! points, and convert between `AccessResult` and `RangedResult` views.
//!
//! The construction/validation shape here (defaulted/optional fields,
//! explicit validation before the object is usable) is adapted from a
//! fluent multi-field builder to a single-call constructor since
//! `distribution_from_percentiles` has no optional-field ordering problem
//! to solve.

use std::collections::BTreeMap;

use crate::error::warn_once;
use crate::outcome::Outcomes;
use crate::result::{AccessResult, Seconds};

/// Input to [`distribution_from_percentiles`]: percentile (in `[0, 1]`)
/// mapped to an observed latency in seconds.
pub type PercentilePoints = BTreeMap<u32, f64>;

/// `p` is stored as a fixed-point `u32` (`p * 1_000_000`) so the map has a
/// total order and can live in a `BTreeMap`; this module's public API
/// accepts/returns plain `f64` percentiles.
fn to_fixed(p: f64) -> u32 {
    (p.clamp(0.0, 1.0) * 1_000_000.0).round() as u32
}

fn from_fixed(p: u32) -> f64 {
    p as f64 / 1_000_000.0
}

/// Builds a validated percentile-point map from `(p, latency)` pairs,
/// dropping invalid percentiles, clamping negative latencies to zero, and
/// enforcing monotone non-decreasing latency by propagation (warns once if
/// the input was non-monotonic).
fn validate_points(points: &[(f64, f64)]) -> PercentilePoints {
    let mut cleaned: BTreeMap<u32, f64> = BTreeMap::new();
    for &(p, latency) in points {
        if !(0.0..=1.0).contains(&p) {
            continue;
        }
        let latency = latency.max(0.0);
        cleaned.insert(to_fixed(p), latency);
    }

    let mut last = 0.0_f64;
    let mut was_monotonic = true;
    let mut enforced: PercentilePoints = BTreeMap::new();
    for (p, latency) in cleaned {
        let value = if latency < last {
            was_monotonic = false;
            last
        } else {
            latency
        };
        last = value;
        enforced.insert(p, value);
    }
    if !was_monotonic {
        warn_once("distribution_from_percentiles.non_monotonic", || {
            tracing::warn!("non-monotonic percentile points supplied; enforced via propagation");
        });
    }
    enforced
}

/// Linear interpolation between the two provided percentile points
/// surrounding `target` (extrapolating flat at the ends).
fn interpolate(points: &PercentilePoints, target: f64) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    let target_fixed = to_fixed(target);
    if let Some(exact) = points.get(&target_fixed) {
        return *exact;
    }

    let lower = points.range(..=target_fixed).next_back();
    let upper = points.range(target_fixed..).next();

    match (lower, upper) {
        (Some((&lp, &lv)), Some((&up, &uv))) => {
            if lp == up {
                return lv;
            }
            let lp_f = from_fixed(lp);
            let up_f = from_fixed(up);
            let t = (target - lp_f) / (up_f - lp_f);
            lv + t * (uv - lv)
        }
        (Some((_, &lv)), None) => lv,
        (None, Some((_, &uv))) => uv,
        (None, None) => 0.0,
    }
}

/// Builds an `Outcomes<AccessResult>` from observed percentile points plus
/// a failure rate and (optional) failure-latency shape.
///
/// - `failure_rate` is clamped into `[0, 1]`.
/// - If `points` is empty but `failure_rate < 1`, `failure_rate` is forced
///   to `1.0` — there isn't enough data to synthesize a success
///   distribution.
/// - `P0`/`P100` are synthesized from the observed min/max latency if not
///   already present.
/// - `num_success_buckets` success buckets are generated, each with weight
///   `(1 - failure_rate) / num_success_buckets`, at the latency
///   interpolated at target percentile `(i + 0.5) / num_success_buckets`.
/// - Failure mass is distributed proportionally over `failure_latency` (or
///   a single zero-latency bucket if `None`).
pub fn distribution_from_percentiles(
    points: &[(f64, f64)],
    failure_rate: f64,
    failure_latency: Option<&Outcomes<Seconds>>,
    num_success_buckets: usize,
) -> Outcomes<AccessResult> {
    let num_success_buckets = num_success_buckets.max(1);
    let mut failure_rate = failure_rate.clamp(0.0, 1.0);

    let mut cleaned = validate_points(points);
    if cleaned.is_empty() && failure_rate < 1.0 {
        failure_rate = 1.0;
    }

    if !cleaned.is_empty() {
        let min_latency = *cleaned.values().next().unwrap();
        let max_latency = *cleaned.values().next_back().unwrap();
        cleaned.entry(to_fixed(0.0)).or_insert(min_latency);
        cleaned.entry(to_fixed(1.0)).or_insert(max_latency);
    }

    let mut outcome: Outcomes<AccessResult> = Outcomes::new();

    if failure_rate < 1.0 && !cleaned.is_empty() {
        let success_weight = (1.0 - failure_rate) / num_success_buckets as f64;
        for i in 0..num_success_buckets {
            let target_p = (i as f64 + 0.5) / num_success_buckets as f64;
            let latency = interpolate(&cleaned, target_p);
            outcome = outcome.add(success_weight, AccessResult::success(Seconds::new(latency)));
        }
    }

    if failure_rate > 0.0 {
        match failure_latency {
            Some(shape) if shape.total_weight() > 0.0 => {
                let total = shape.total_weight();
                for b in shape.buckets() {
                    let weight = failure_rate * (b.weight / total);
                    outcome = outcome.add(weight, AccessResult::failure(b.value));
                }
            }
            _ => {
                outcome = outcome.add(failure_rate, AccessResult::failure(Seconds::ZERO));
            }
        }
    }

    if outcome.is_empty() {
        // EmptyDistribution guard: never return zero buckets.
        outcome = outcome.add(1.0, AccessResult::failure(Seconds::ZERO));
    }

    outcome
}

/// Converts an `AccessResult` to a `RangedResult` with a zero-width range
/// (the "simple direction": a point estimate has no spread).
pub fn access_to_ranged(access: &AccessResult) -> crate::result::RangedResult {
    crate::result::RangedResult::from_access(access)
}

/// Converts a `RangedResult` back to an `AccessResult` by sampling a
/// latency inside the range (the "reverse direction", used by
/// visualisation paths that need a point sample).
pub fn ranged_to_access(
    ranged: &crate::result::RangedResult,
    rng: &mut impl rand::Rng,
) -> AccessResult {
    ranged.to_access(rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics;

    #[test]
    fn forces_full_failure_without_data() {
        let o = distribution_from_percentiles(&[], 0.1, None, 5);
        assert_eq!(metrics::availability(&o), 0.0);
    }

    #[test]
    fn generates_requested_success_bucket_count() {
        let points = vec![(0.5, 0.01), (0.99, 0.02)];
        let o = distribution_from_percentiles(&points, 0.1, None, 10);
        let success_buckets = o.buckets().iter().filter(|b| b.value.success).count();
        assert_eq!(success_buckets, 10);
    }

    #[test]
    fn failure_rate_is_clamped() {
        let points = vec![(0.5, 0.01)];
        let o = distribution_from_percentiles(&points, 5.0, None, 4);
        assert!((metrics::availability(&o)).abs() < 1e-9);
    }

    #[test]
    fn interpolates_between_points() {
        let points = vec![(0.0, 0.0), (1.0, 1.0)];
        let cleaned = validate_points(&points);
        let mid = interpolate(&cleaned, 0.5);
        assert!((mid - 0.5).abs() < 1e-9);
    }

    #[test]
    fn never_returns_empty_distribution() {
        let o = distribution_from_percentiles(&[], 0.0, None, 1);
        assert!(!o.is_empty());
    }

    #[test]
    fn ranged_roundtrip_stays_within_bounds() {
        let access = AccessResult::success(Seconds::new(0.05));
        let ranged = access_to_ranged(&access);
        let mut rng = rand::thread_rng();
        let back = ranged_to_access(&ranged, &mut rng);
        assert_eq!(back.success, access.success);
        assert!((back.latency.as_f64() - access.latency.as_f64()).abs() < 1e-9);
    }
}
