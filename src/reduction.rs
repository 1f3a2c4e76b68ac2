//! Bucket-explosion control: strategies that bound the number of buckets
//! in an outcome distribution while preserving its statistical shape.
//!
//! Uses a sorted-sample walk over a target percentile set, generalized
//! from equal-weight samples to weighted buckets and from one value type
//! to any `Observable`.

use crate::outcome::{Bucket, Outcomes};
use crate::result::{Observable, RangedResult, Seconds};

/// Target percentiles the percentile-anchor strategy always preserves.
pub const ANCHOR_PERCENTILES: &[f64] = &[0.01, 0.05, 0.25, 0.50, 0.75, 0.95, 0.99, 0.999];

/// Relative-latency threshold used by [`merge_adjacent`]: two neighbouring
/// buckets merge when their latencies differ by no more than 5% of the
/// earlier one.
pub const MERGE_RELATIVE_THRESHOLD: f64 = 0.05;

/// Walks a sequence sorted by `(success desc, latency asc)` and merges
/// adjacent buckets that share `success` and whose latencies are within
/// [`MERGE_RELATIVE_THRESHOLD`] of each other (relative to the earlier
/// bucket's latency). Merged buckets take the summed weight and the
/// weight-averaged latency.
pub fn merge_adjacent<V>(buckets: &[Bucket<V>]) -> Vec<Bucket<V>>
where
    V: Observable + Clone + MergeableValue,
{
    if buckets.is_empty() {
        return Vec::new();
    }
    let mut out: Vec<Bucket<V>> = Vec::with_capacity(buckets.len());
    out.push(buckets[0].clone());

    for next in &buckets[1..] {
        let prev = out.last().cloned().unwrap();
        let same_success = prev.value.is_success() == next.value.is_success();
        let prev_latency = prev.value.get_latency().as_f64();
        let next_latency = next.value.get_latency().as_f64();
        let delta = (next_latency - prev_latency).abs();
        let within_threshold = if prev_latency.abs() > 1e-12 {
            delta / prev_latency.abs() <= MERGE_RELATIVE_THRESHOLD
        } else {
            delta <= MERGE_RELATIVE_THRESHOLD
        };

        if same_success && within_threshold {
            let total_weight = prev.weight + next.weight;
            let merged_latency = if total_weight > 0.0 {
                (prev_latency * prev.weight + next_latency * next.weight) / total_weight
            } else {
                prev_latency
            };
            let merged_value = V::with_latency(&prev.value, merged_latency);
            out.pop();
            out.push(Bucket::new(total_weight, merged_value));
        } else {
            out.push(next.clone());
        }
    }
    out
}

/// Capability needed by [`merge_adjacent`]/[`adaptive_reduce`] to rebuild a
/// value at a new, merged latency while keeping its success flag.
pub trait MergeableValue: Observable {
    fn with_latency(original: &Self, latency: f64) -> Self;
}

impl MergeableValue for crate::result::AccessResult {
    fn with_latency(original: &Self, latency: f64) -> Self {
        crate::result::AccessResult {
            success: original.success,
            latency: crate::result::Seconds::new(latency),
        }
    }
}

/// Merges adjacent same-success [`RangedResult`] buckets whose `[min, max]`
/// latency intervals overlap. Unlike [`merge_adjacent`]'s relative-latency
/// threshold, the merge criterion here is literal interval overlap: the
/// merged bucket's range is the union of the two source ranges and its
/// `mode` is the weight-interpolated mode of the two, matching the ranged
/// value type's own reduction shape rather than being forced through
/// [`MergeableValue`]'s single-latency-value contract.
pub fn merge_adjacent_ranged(buckets: &[Bucket<RangedResult>]) -> Vec<Bucket<RangedResult>> {
    if buckets.is_empty() {
        return Vec::new();
    }
    let mut sorted = buckets.to_vec();
    sorted.sort_by(|a, b| {
        b.value.success.cmp(&a.value.success).then(
            a.value
                .min_latency
                .as_f64()
                .partial_cmp(&b.value.min_latency.as_f64())
                .unwrap(),
        )
    });

    let mut out: Vec<Bucket<RangedResult>> = Vec::with_capacity(sorted.len());
    out.push(sorted[0].clone());

    for next in &sorted[1..] {
        let prev = out.last().cloned().unwrap();
        let same_success = prev.value.success == next.value.success;
        let overlaps = next.value.min_latency.as_f64() <= prev.value.max_latency.as_f64() + 1e-12;

        if same_success && overlaps {
            let total_weight = prev.weight + next.weight;
            let (min, mode, max) = if total_weight > 0.0 {
                let w_prev = prev.weight / total_weight;
                let w_next = next.weight / total_weight;
                (
                    prev.value
                        .min_latency
                        .as_f64()
                        .min(next.value.min_latency.as_f64()),
                    prev.value.mode_latency.as_f64() * w_prev
                        + next.value.mode_latency.as_f64() * w_next,
                    prev.value
                        .max_latency
                        .as_f64()
                        .max(next.value.max_latency.as_f64()),
                )
            } else {
                (
                    prev.value.min_latency.as_f64(),
                    prev.value.mode_latency.as_f64(),
                    prev.value.max_latency.as_f64(),
                )
            };
            let merged_value = RangedResult::new(
                prev.value.success,
                Seconds::new(min),
                Seconds::new(mode),
                Seconds::new(max),
            );
            out.pop();
            out.push(Bucket::new(total_weight, merged_value));
        } else {
            out.push(next.clone());
        }
    }
    out
}

/// Selects a bounded subset of a sorted-by-latency sequence (for one
/// success class) that always keeps the first and last bucket, keeps the
/// bucket containing each target percentile in [`ANCHOR_PERCENTILES`], and
/// fills any remaining slots (up to `max_len`) with the highest-weight
/// remaining buckets, re-sorted by latency at the end.
fn percentile_anchor_single_class<V: Clone + Observable>(
    sorted: &[Bucket<V>],
    max_len: usize,
) -> Vec<Bucket<V>> {
    if sorted.len() <= max_len || sorted.is_empty() {
        return sorted.to_vec();
    }

    let mut kept_indices: std::collections::BTreeSet<usize> = std::collections::BTreeSet::new();
    kept_indices.insert(0);
    kept_indices.insert(sorted.len() - 1);

    let total_weight: f64 = sorted.iter().map(|b| b.weight).sum();
    if total_weight > 0.0 {
        for &p in ANCHOR_PERCENTILES {
            let target = p * total_weight;
            let mut cumulative = 0.0;
            for (i, b) in sorted.iter().enumerate() {
                cumulative += b.weight;
                if cumulative + 1e-12 >= target {
                    kept_indices.insert(i);
                    break;
                }
            }
        }
    }

    if kept_indices.len() < max_len {
        let mut remaining: Vec<usize> = (0..sorted.len())
            .filter(|i| !kept_indices.contains(i))
            .collect();
        remaining.sort_by(|&a, &b| sorted[b].weight.partial_cmp(&sorted[a].weight).unwrap());
        for idx in remaining {
            if kept_indices.len() >= max_len {
                break;
            }
            kept_indices.insert(idx);
        }
    }

    let kept_sorted: Vec<usize> = kept_indices.iter().copied().collect();
    let mut result: Vec<Bucket<V>> = kept_sorted.iter().map(|&i| sorted[i].clone()).collect();

    // Redistribute each dropped bucket's weight into its nearest kept
    // neighbour by latency, so the class's total weight — and thus
    // availability — is preserved rather than silently dropped.
    for (i, b) in sorted.iter().enumerate() {
        if kept_indices.contains(&i) {
            continue;
        }
        let latency = b.value.get_latency().as_f64();
        let nearest = kept_sorted
            .iter()
            .min_by(|&&a, &&b2| {
                let da = (sorted[a].value.get_latency().as_f64() - latency).abs();
                let db = (sorted[b2].value.get_latency().as_f64() - latency).abs();
                da.partial_cmp(&db).unwrap()
            })
            .copied();
        if let Some(target) = nearest {
            if let Some(pos) = kept_sorted.iter().position(|&k| k == target) {
                result[pos].weight += b.weight;
            }
        }
    }

    result
}

/// Percentile-anchored selection across both success classes combined,
/// splitting `max_len` proportionally to each class's share of the input.
pub fn percentile_anchor<V: Clone + Observable>(buckets: &[Bucket<V>], max_len: usize) -> Vec<Bucket<V>> {
    if buckets.len() <= max_len {
        return buckets.to_vec();
    }
    let mut successes: Vec<Bucket<V>> = buckets
        .iter()
        .filter(|b| b.value.is_success())
        .cloned()
        .collect();
    let mut failures: Vec<Bucket<V>> = buckets
        .iter()
        .filter(|b| !b.value.is_success())
        .cloned()
        .collect();
    successes.sort_by(|a, b| {
        a.value
            .get_latency()
            .as_f64()
            .partial_cmp(&b.value.get_latency().as_f64())
            .unwrap()
    });
    failures.sort_by(|a, b| {
        a.value
            .get_latency()
            .as_f64()
            .partial_cmp(&b.value.get_latency().as_f64())
            .unwrap()
    });

    // Split max_len between the two classes proportionally, but clamp so
    // the budgets always sum to at most max_len: each nonempty class gets
    // at least one slot to absorb its own redistributed weight into, and
    // neither budget is allowed to crowd the other one out entirely.
    let total = (successes.len() + failures.len()).max(1) as f64;
    let success_budget = if successes.is_empty() {
        0
    } else if failures.is_empty() {
        max_len
    } else {
        let raw = ((successes.len() as f64 / total) * max_len as f64).round() as usize;
        raw.clamp(1, max_len.saturating_sub(1).max(1))
    };
    let failure_budget = if failures.is_empty() {
        0
    } else {
        max_len.saturating_sub(success_budget).max(1)
    };

    let mut kept_success = percentile_anchor_single_class(&successes, success_budget.max(1));
    let mut kept_failure = percentile_anchor_single_class(&failures, failure_budget.max(1));

    // Re-sort by latency, successes first (matches the "success desc" half
    // of the overall ordering convention used elsewhere in this module).
    kept_success.sort_by(|a, b| {
        a.value
            .get_latency()
            .as_f64()
            .partial_cmp(&b.value.get_latency().as_f64())
            .unwrap()
    });
    kept_failure.sort_by(|a, b| {
        a.value
            .get_latency()
            .as_f64()
            .partial_cmp(&b.value.get_latency().as_f64())
            .unwrap()
    });

    let mut out = Vec::with_capacity(kept_success.len() + kept_failure.len());
    out.append(&mut kept_success);
    out.append(&mut kept_failure);
    out
}

/// Generic fallback reduction: keeps the `keep` most "significant" buckets
/// (per `significance`) and redistributes the dropped buckets' weight into
/// their nearest surviving neighbour (by latency).
pub fn adaptive_reduce<V: Clone + Observable + MergeableValue>(
    buckets: &[Bucket<V>],
    keep: usize,
    significance: impl Fn(&[Bucket<V>], usize) -> f64,
) -> Vec<Bucket<V>> {
    if buckets.len() <= keep || buckets.is_empty() {
        return buckets.to_vec();
    }
    let mut sorted = buckets.to_vec();
    sorted.sort_by(|a, b| {
        a.value
            .get_latency()
            .as_f64()
            .partial_cmp(&b.value.get_latency().as_f64())
            .unwrap()
    });

    let mut scored: Vec<(usize, f64)> = (0..sorted.len())
        .map(|i| (i, significance(&sorted, i)))
        .collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());
    let kept_indices: std::collections::BTreeSet<usize> =
        scored.into_iter().take(keep.max(1)).map(|(i, _)| i).collect();

    let kept_sorted: Vec<usize> = kept_indices.iter().copied().collect();
    let mut result: Vec<Bucket<V>> = kept_sorted.iter().map(|&i| sorted[i].clone()).collect();

    for (i, b) in sorted.iter().enumerate() {
        if kept_indices.contains(&i) {
            continue;
        }
        // Redistribute into the nearest kept neighbour by latency.
        let latency = b.value.get_latency().as_f64();
        let nearest = kept_sorted
            .iter()
            .min_by(|&&a, &&b2| {
                let da = (sorted[a].value.get_latency().as_f64() - latency).abs();
                let db = (sorted[b2].value.get_latency().as_f64() - latency).abs();
                da.partial_cmp(&db).unwrap()
            })
            .copied();
        if let Some(target) = nearest {
            if let Some(pos) = kept_sorted.iter().position(|&k| k == target) {
                result[pos].weight += b.weight;
            }
        }
    }
    result
}

/// Default significance function for `AccessResult`-shaped distributions:
/// `weight * max(delta_prev, delta_next)`, using the single available
/// delta for first/last buckets and plain weight for a lone bucket.
pub fn default_significance<V: Observable>(sorted: &[Bucket<V>], i: usize) -> f64 {
    if sorted.len() == 1 {
        return sorted[0].weight;
    }
    let latency = sorted[i].value.get_latency().as_f64();
    let delta_prev = if i > 0 {
        Some((latency - sorted[i - 1].value.get_latency().as_f64()).abs())
    } else {
        None
    };
    let delta_next = if i + 1 < sorted.len() {
        Some((sorted[i + 1].value.get_latency().as_f64() - latency).abs())
    } else {
        None
    };
    let delta = match (delta_prev, delta_next) {
        (Some(p), Some(n)) => p.max(n),
        (Some(p), None) => p,
        (None, Some(n)) => n,
        (None, None) => 0.0,
    };
    sorted[i].weight * delta
}

/// Number of buckets beyond which [`trim_to_size`] engages
/// [`merge_adjacent`], and the hard ceiling enforced afterwards by
/// [`percentile_anchor`].
#[derive(Debug, Clone, Copy)]
pub struct TrimConfig {
    pub trigger: usize,
    pub max_len: usize,
}

/// Orchestrates the full trimming contract: unchanged if already within
/// `max_len`; otherwise sort by `(success desc, latency asc)`, merge
/// adjacent near-duplicates once `len > trigger`, then percentile-anchor
/// select if still over `max_len`. The result always has `len <= max_len`.
pub fn trim_to_size<V: Clone + Observable + MergeableValue>(
    outcomes: &Outcomes<V>,
    trigger: usize,
    max_len: usize,
) -> Outcomes<V> {
    if outcomes.len() <= max_len {
        return outcomes.clone();
    }

    let mut sorted: Vec<Bucket<V>> = outcomes.buckets().to_vec();
    sorted.sort_by(|a, b| {
        // success descending, then latency ascending
        b.value
            .is_success()
            .cmp(&a.value.is_success())
            .then(
                a.value
                    .get_latency()
                    .as_f64()
                    .partial_cmp(&b.value.get_latency().as_f64())
                    .unwrap(),
            )
    });

    let merged = if sorted.len() > trigger {
        merge_adjacent(&sorted)
    } else {
        sorted
    };

    let final_buckets = if merged.len() > max_len {
        percentile_anchor(&merged, max_len)
    } else {
        merged
    };

    Outcomes::from_buckets(final_buckets)
}

/// Convenience factory with a `trim_to_size(trigger, max_len)
/// -> fn(Outcomes) -> Outcomes` signature, for callers (e.g. an external
/// DSL) that want a reusable reduction closure rather than calling the
/// orchestrator directly.
pub fn trim_to_size_fn<V: Clone + Observable + MergeableValue + 'static>(
    trigger: usize,
    max_len: usize,
) -> impl Fn(Outcomes<V>) -> Outcomes<V> {
    move |o| trim_to_size(&o, trigger, max_len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::{AccessResult, Seconds};

    fn mk(success: bool, latency: f64, weight: f64) -> Bucket<AccessResult> {
        Bucket::new(
            weight,
            AccessResult {
                success,
                latency: Seconds::new(latency),
            },
        )
    }

    #[test]
    fn trim_to_size_noop_when_within_bound() {
        let o: Outcomes<AccessResult> = Outcomes::from_buckets(vec![mk(true, 0.1, 1.0)]);
        let trimmed = trim_to_size(&o, 10, 10);
        assert_eq!(trimmed.len(), o.len());
    }

    #[test]
    fn trim_to_size_respects_max_len() {
        let buckets: Vec<Bucket<AccessResult>> = (0..200)
            .map(|i| mk(i % 5 != 0, 0.001 * (i as f64 + 1.0), 1.0))
            .collect();
        let o: Outcomes<AccessResult> = Outcomes::from_buckets(buckets);
        let trimmed = trim_to_size(&o, 50, 20);
        assert!(trimmed.len() <= 20);
    }

    #[test]
    fn trim_to_size_preserves_availability_closely() {
        let buckets: Vec<Bucket<AccessResult>> = (0..300)
            .map(|i| mk(i % 4 != 0, 0.0005 * (i as f64 + 1.0), 1.0))
            .collect();
        let o: Outcomes<AccessResult> = Outcomes::from_buckets(buckets);
        let before = crate::metrics::availability(&o);
        let trimmed = trim_to_size(&o, 40, 16);
        let after = crate::metrics::availability(&trimmed);
        assert!((before - after).abs() < 1e-6);
    }

    #[test]
    fn merge_adjacent_merges_close_neighbours() {
        let buckets = vec![mk(true, 1.0, 0.5), mk(true, 1.02, 0.5)];
        let merged = merge_adjacent(&buckets);
        assert_eq!(merged.len(), 1);
        assert!((merged[0].weight - 1.0).abs() < 1e-9);
    }

    #[test]
    fn merge_adjacent_keeps_different_success_separate() {
        let buckets = vec![mk(true, 1.0, 0.5), mk(false, 1.0, 0.5)];
        let merged = merge_adjacent(&buckets);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn percentile_anchor_always_keeps_first_and_last() {
        let buckets: Vec<Bucket<AccessResult>> =
            (0..100).map(|i| mk(true, i as f64, 1.0)).collect();
        let kept = percentile_anchor(&buckets, 10);
        assert!(kept.len() <= 10);
        let latencies: Vec<f64> = kept.iter().map(|b| b.value.latency.as_f64()).collect();
        assert!(latencies.contains(&0.0));
        assert!(latencies.contains(&99.0));
    }

    #[test]
    fn percentile_anchor_preserves_weight_of_dropped_middle_bucket() {
        let buckets = vec![
            mk(true, 0.001, 0.001),
            mk(true, 100.0, 100.0),
            mk(true, 200.0, 0.001),
            mk(false, 0.001, 100.0),
            mk(false, 100.0, 0.001),
            mk(false, 200.0, 100.0),
        ];
        let total_before: f64 = buckets.iter().map(|b| b.weight).sum();
        let kept = percentile_anchor(&buckets, 4);
        let total_after: f64 = kept.iter().map(|b| b.weight).sum();
        assert!((total_before - total_after).abs() < 1e-9);
    }

    #[test]
    fn trim_to_size_preserves_availability_on_few_extreme_buckets() {
        let buckets = vec![
            mk(true, 0.001, 0.001),
            mk(true, 100.0, 100.0),
            mk(true, 200.0, 0.001),
            mk(false, 0.001, 100.0),
            mk(false, 100.0, 0.001),
            mk(false, 200.0, 100.0),
        ];
        let o: Outcomes<AccessResult> = Outcomes::from_buckets(buckets);
        let before = crate::metrics::availability(&o);
        let trimmed = trim_to_size(&o, 8, 4);
        let after = crate::metrics::availability(&trimmed);
        assert!((before - after).abs() < 1e-6);
    }

    #[test]
    fn merge_adjacent_ranged_merges_overlapping_intervals() {
        let a = Bucket::new(
            1.0,
            RangedResult::new(true, Seconds::new(0.1), Seconds::new(0.2), Seconds::new(0.3)),
        );
        let b = Bucket::new(
            1.0,
            RangedResult::new(true, Seconds::new(0.25), Seconds::new(0.3), Seconds::new(0.4)),
        );
        let merged = merge_adjacent_ranged(&[a, b]);
        assert_eq!(merged.len(), 1);
        assert!((merged[0].weight - 2.0).abs() < 1e-9);
        assert!((merged[0].value.min_latency.as_f64() - 0.1).abs() < 1e-9);
        assert!((merged[0].value.max_latency.as_f64() - 0.4).abs() < 1e-9);
        assert!((merged[0].value.mode_latency.as_f64() - 0.25).abs() < 1e-9);
    }

    #[test]
    fn merge_adjacent_ranged_keeps_non_overlapping_separate() {
        let a = Bucket::new(
            1.0,
            RangedResult::new(true, Seconds::new(0.1), Seconds::new(0.15), Seconds::new(0.2)),
        );
        let b = Bucket::new(
            1.0,
            RangedResult::new(true, Seconds::new(1.0), Seconds::new(1.1), Seconds::new(1.2)),
        );
        let merged = merge_adjacent_ranged(&[a, b]);
        assert_eq!(merged.len(), 2);
    }
}
