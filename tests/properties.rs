//! Quantified algebra/metrics invariants, checked against randomly
//! generated outcome distributions.

use proptest::prelude::*;

use sdl_core::{metrics, AccessResult, Outcomes, Seconds};

fn bucket_strategy() -> impl Strategy<Value = (f64, bool, f64)> {
    (0.001f64..100.0, any::<bool>(), 0.0f64..10.0)
}

fn outcomes_strategy() -> impl Strategy<Value = Outcomes<AccessResult>> {
    prop::collection::vec(bucket_strategy(), 1..12).prop_map(|raw| {
        let mut o = Outcomes::new();
        for (weight, success, latency) in raw {
            let value = if success {
                AccessResult::success(Seconds::new(latency))
            } else {
                AccessResult::failure(Seconds::new(latency))
            };
            o = o.add(weight, value);
        }
        o
    })
}

proptest! {
    #[test]
    fn buckets_are_well_formed(o in outcomes_strategy()) {
        prop_assert!(o.len() >= 1);
        for bucket in o.buckets() {
            prop_assert!(bucket.weight > 0.0);
            prop_assert!(bucket.value.latency.as_f64() >= 0.0);
        }
    }

    #[test]
    fn availability_is_bounded(o in outcomes_strategy()) {
        let avail = metrics::availability(&o);
        prop_assert!((0.0..=1.0).contains(&avail));
        let has_success = o.buckets().iter().any(|b| b.value.success && b.weight > 0.0);
        prop_assert_eq!(avail == 0.0, !has_success);
    }

    #[test]
    fn mean_is_between_extreme_percentiles(o in outcomes_strategy()) {
        if metrics::availability(&o) > 0.0 {
            let mean = metrics::mean_latency(&o);
            let low = metrics::percentile_latency(&o, 0.0);
            let high = metrics::percentile_latency(&o, 1.0);
            prop_assert!(mean >= low - 1e-9);
            prop_assert!(mean <= high + 1e-9);
        }
    }

    #[test]
    fn percentile_latency_is_monotonic(o in outcomes_strategy(), a in 0.0f64..1.0, b in 0.0f64..1.0) {
        if metrics::availability(&o) > 0.0 {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let p_lo = metrics::percentile_latency(&o, lo);
            let p_hi = metrics::percentile_latency(&o, hi);
            prop_assert!(p_lo <= p_hi + 1e-9);
        }
    }

    #[test]
    fn and_with_zero_identity_preserves_metrics(o in outcomes_strategy()) {
        let identity = Outcomes::deterministic(AccessResult::success(Seconds::ZERO));
        let composed = o.and(&identity, |a, b| AccessResult::and_access(a, b));
        prop_assert!((metrics::availability(&o) - metrics::availability(&composed)).abs() < 1e-9);
        if metrics::availability(&o) > 0.0 {
            prop_assert!(
                (metrics::mean_latency(&o) - metrics::mean_latency(&composed)).abs() < 1e-6
            );
        }
    }

    #[test]
    fn scale_weights_roundtrip(o in outcomes_strategy(), k in 0.01f64..100.0) {
        let total_before = o.total_weight();
        let roundtripped = o.copy().scale_weights(k).scale_weights(1.0 / k);
        let total_after = roundtripped.total_weight();
        prop_assert!((total_before - total_after).abs() / total_before.max(1e-9) < 1e-6);
    }

    #[test]
    fn split_conserves_total_weight(o in outcomes_strategy()) {
        let total_before = o.total_weight();
        let (matched, unmatched) = o.split(|v| v.success);
        let total_after = matched.total_weight() + unmatched.total_weight();
        prop_assert!((total_before - total_after).abs() / total_before.max(1e-9) < 1e-6);
    }

    #[test]
    fn trim_to_size_bounds_length_and_preserves_availability(o in outcomes_strategy()) {
        let max_len = 4usize;
        let trimmed = sdl_core::reduction::trim_to_size(&o, max_len * 2, max_len);
        prop_assert!(trimmed.len() <= max_len);
        prop_assert!(
            (metrics::availability(&o) - metrics::availability(&trimmed)).abs() < 1e-6
        );
    }
}
