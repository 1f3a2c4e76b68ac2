//! The outcome algebra: a weighted-bucket distribution container and the
//! small set of primitives (`add`, `map`, `split`, `and`, `if`, `append`,
//! `scale_weights`) that every component composes its result from.

use rand::Rng;

use crate::error::{SdlError, SdlResult};

/// Smallest weight the algebra treats as non-zero; anything below this is
/// silently omitted rather than rejected.
pub const MIN_WEIGHT: f64 = 1e-12;

/// A single weighted outcome value.
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket<V> {
    pub weight: f64,
    pub value: V,
}

impl<V> Bucket<V> {
    pub fn new(weight: f64, value: V) -> Self {
        Self { weight, value }
    }
}

/// An ordered sequence of weighted buckets over values of type `V`.
///
/// Bucket ordering carries no semantic weight for `append`/`scale_weights`/
/// `map`/`split`; reduction strategies rely on it (they sort first).
/// An `Outcomes<V>` is treated as immutable once handed to a caller: every
/// primitive that "modifies" a distribution returns a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcomes<V> {
    buckets: Vec<Bucket<V>>,
}

impl<V> Default for Outcomes<V> {
    fn default() -> Self {
        Self { buckets: Vec::new() }
    }
}

impl<V: Clone> Outcomes<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_buckets(buckets: Vec<Bucket<V>>) -> Self {
        let mut out = Self::new();
        for b in buckets {
            out = out.add(b.weight, b.value);
        }
        out
    }

    /// A single deterministic bucket at weight 1.0.
    pub fn deterministic(value: V) -> Self {
        Self::new().add(1.0, value)
    }

    /// Appends a bucket, silently omitting it if the weight is below
    /// [`MIN_WEIGHT`] (callers may assume negligible weights are pruned).
    pub fn add(mut self, weight: f64, value: V) -> Self {
        if weight >= MIN_WEIGHT {
            self.buckets.push(Bucket::new(weight, value));
        }
        self
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn buckets(&self) -> &[Bucket<V>] {
        &self.buckets
    }

    pub fn into_buckets(self) -> Vec<Bucket<V>> {
        self.buckets
    }

    pub fn total_weight(&self) -> f64 {
        self.buckets.iter().map(|b| b.weight).sum()
    }

    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// Multiplies every bucket's weight by `factor`. `factor` must be
    /// `>= 0`; negative factors are clamped to zero (an empty-weight
    /// distribution, not a panic — this is a configuration anomaly, not a
    /// programming error).
    pub fn scale_weights(mut self, factor: f64) -> Self {
        let factor = factor.max(0.0);
        for b in &mut self.buckets {
            b.weight *= factor;
        }
        self.buckets.retain(|b| b.weight >= MIN_WEIGHT);
        self
    }

    /// Partitions into (matching, non_matching), preserving each bucket's
    /// original weight in whichever side it lands on.
    pub fn split(&self, predicate: impl Fn(&V) -> bool) -> (Self, Self) {
        let mut matching = Self::new();
        let mut non_matching = Self::new();
        for b in &self.buckets {
            if predicate(&b.value) {
                matching = matching.add(b.weight, b.value.clone());
            } else {
                non_matching = non_matching.add(b.weight, b.value.clone());
            }
        }
        (matching, non_matching)
    }

    /// Groups buckets by a derived key, summing weights per group's bucket
    /// list (the buckets themselves are not merged, only grouped).
    pub fn partition<K: std::hash::Hash + Eq>(
        &self,
        key: impl Fn(&V) -> K,
    ) -> std::collections::HashMap<K, Vec<Bucket<V>>> {
        let mut groups: std::collections::HashMap<K, Vec<Bucket<V>>> =
            std::collections::HashMap::new();
        for b in &self.buckets {
            groups.entry(key(&b.value)).or_default().push(b.clone());
        }
        groups
    }

    /// Concatenates bucket sequences; weights are preserved as-is (callers
    /// are responsible for having already scaled either side if a relative
    /// weighting between `self` and `other` is intended).
    pub fn append(mut self, other: Self) -> Self {
        self.buckets.extend(other.buckets);
        self
    }

    /// Transforms every value, leaving weights untouched.
    pub fn map<W: Clone>(&self, f: impl Fn(&V) -> W) -> Outcomes<W> {
        let mut out = Outcomes::new();
        for b in &self.buckets {
            out = out.add(b.weight, f(&b.value));
        }
        out
    }

    /// Cartesian product of two distributions: every pair of buckets
    /// produces one output bucket whose weight is the product of the two
    /// input weights and whose value is `reducer(a, b)`. Result size is
    /// `|self| * |other|` — callers are expected to reduce downstream.
    pub fn and<W: Clone, U: Clone>(
        &self,
        other: &Outcomes<W>,
        reducer: impl Fn(&V, &W) -> U,
    ) -> Outcomes<U> {
        let mut out = Outcomes::new();
        for a in &self.buckets {
            for b in other.buckets() {
                out = out.add(a.weight * b.weight, reducer(&a.value, &b.value));
            }
        }
        out
    }

    /// Same as [`Outcomes::and`], but returns [`SdlError::ReducerMissing`]
    /// if either side is empty and no reducer can sensibly run — `and`
    /// fails loudly when no combinator is available, rather than silently
    /// returning an empty distribution.
    pub fn and_checked<W: Clone, U: Clone>(
        &self,
        other: &Outcomes<W>,
        reducer: Option<&dyn Fn(&V, &W) -> U>,
    ) -> SdlResult<Outcomes<U>> {
        let reducer = reducer.ok_or(SdlError::ReducerMissing)?;
        Ok(self.and(other, reducer))
    }

    /// `if predicate then then_branch else else_branch`, combined via
    /// `reducer`. A `None` branch means "keep the matching/non-matching
    /// bucket unchanged" (modelled by using `self`'s own predicate split
    /// without composing against the other distribution).
    pub fn if_then_else<U: Clone>(
        &self,
        predicate: impl Fn(&V) -> bool,
        then_branch: Option<&Outcomes<V>>,
        else_branch: Option<&Outcomes<V>>,
        reducer: impl Fn(&V, &V) -> U,
        keep_unchanged: impl Fn(&V) -> U,
    ) -> Outcomes<U> {
        let (matching, non_matching) = self.split(&predicate);
        let then_part = match then_branch {
            Some(branch) => matching.and(branch, &reducer),
            None => matching.map(|v| keep_unchanged(v)),
        };
        let else_part = match else_branch {
            Some(branch) => non_matching.and(branch, &reducer),
            None => non_matching.map(|v| keep_unchanged(v)),
        };
        then_part.append(else_part)
    }

    /// Picks a bucket with probability proportional to its weight.
    /// Panics only if the distribution is empty, an engine invariant
    /// violation (every operation returns `len >= 1`).
    pub fn sample(&self, rng: &mut impl Rng) -> V {
        assert!(!self.buckets.is_empty(), "sample() on empty Outcomes");
        let total = self.total_weight();
        if total <= 0.0 {
            return self.buckets[0].value.clone();
        }
        let mut target = rng.gen::<f64>() * total;
        for b in &self.buckets {
            target -= b.weight;
            if target <= 0.0 {
                return b.value.clone();
            }
        }
        self.buckets.last().unwrap().value.clone()
    }

    /// Succeeds only when exactly one bucket remains.
    pub fn get_value(&self) -> SdlResult<V> {
        if self.buckets.len() == 1 {
            Ok(self.buckets[0].value.clone())
        } else {
            Err(SdlError::NotDeterministic {
                bucket_count: self.buckets.len(),
            })
        }
    }
}
