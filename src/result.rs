//! Outcome value types: the concrete `V` that `Outcomes<V>` carries in
//! practice, plus the `Observable` capability that metrics and reduction
//! are generic over.

use serde::{Deserialize, Serialize};

/// A non-negative duration in seconds, clamped to a "huge" sentinel at
/// observation boundaries rather than allowed to carry genuine infinities
/// into a bucket.
///
/// # Invariants
/// - Always `>= 0.0`.
/// - Never `NaN`; `NaN` inputs are coerced to `0.0`.
/// - Values at or above [`Seconds::HUGE`] are clamped to it, the "1 day"
///   unavailability sentinel.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Seconds(f64);

impl Seconds {
    /// The "unstable system" sentinel latency: one day, in seconds.
    pub const HUGE: Seconds = Seconds(86_400.0);
    pub const ZERO: Seconds = Seconds(0.0);

    /// Builds a `Seconds`, clamping negative or non-finite input to `0.0`
    /// and clamping anything at or above [`Seconds::HUGE`] down to it.
    pub fn new(value: f64) -> Self {
        if !value.is_finite() {
            if value.is_infinite() && value > 0.0 {
                return Self::HUGE;
            }
            return Self::ZERO;
        }
        if value <= 0.0 {
            return Self::ZERO;
        }
        if value >= Self::HUGE.0 {
            return Self::HUGE;
        }
        Seconds(value)
    }

    /// Builds a `Seconds` without clamping to `HUGE`, only to non-negative.
    /// Used internally by queueing math that needs to compare against
    /// `HUGE` before deciding whether to treat a system as unstable.
    pub fn new_unclamped(value: f64) -> Self {
        if !value.is_finite() || value <= 0.0 {
            return Self::ZERO;
        }
        Seconds(value)
    }

    pub fn as_f64(self) -> f64 {
        self.0
    }

    pub fn is_huge(self) -> bool {
        self.0 >= Self::HUGE.0
    }
}

impl std::ops::Add for Seconds {
    type Output = Seconds;
    fn add(self, rhs: Seconds) -> Seconds {
        Seconds::new(self.0 + rhs.0)
    }
}

impl std::ops::Mul<f64> for Seconds {
    type Output = Seconds;
    fn mul(self, rhs: f64) -> Seconds {
        Seconds::new(self.0 * rhs)
    }
}

impl Default for Seconds {
    fn default() -> Self {
        Self::ZERO
    }
}

/// Capability shared by every outcome value type the metrics and
/// reduction layers operate on generically.
pub trait Observable {
    fn is_success(&self) -> bool;
    fn get_latency(&self) -> Seconds;
}

/// A single access/operation outcome: it either succeeded at some latency,
/// or failed at some latency (failures are not instantaneous either — a
/// timeout or rejection still takes time to observe).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccessResult {
    pub success: bool,
    pub latency: Seconds,
}

impl AccessResult {
    pub fn success(latency: Seconds) -> Self {
        Self {
            success: true,
            latency,
        }
    }

    pub fn failure(latency: Seconds) -> Self {
        Self {
            success: false,
            latency,
        }
    }

    /// Total combinator: a pairwise sequential composition where the
    /// combined operation only succeeds if both steps succeed, and the
    /// combined latency is the sum of both.
    pub fn and_access(a: &AccessResult, b: &AccessResult) -> AccessResult {
        AccessResult {
            success: a.success && b.success,
            latency: a.latency + b.latency,
        }
    }
}

impl Observable for AccessResult {
    fn is_success(&self) -> bool {
        self.success
    }
    fn get_latency(&self) -> Seconds {
        self.latency
    }
}

/// An outcome carrying a latency *range* rather than a point value, used
/// by visualisation-oriented converters. `min <= mode <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangedResult {
    pub success: bool,
    pub min_latency: Seconds,
    pub mode_latency: Seconds,
    pub max_latency: Seconds,
}

impl RangedResult {
    /// Builds a ranged result, reordering inputs if necessary so the
    /// `min <= mode <= max` invariant always holds.
    pub fn new(success: bool, min: Seconds, mode: Seconds, max: Seconds) -> Self {
        let mut values = [min.as_f64(), mode.as_f64(), max.as_f64()];
        values.sort_by(|a, b| a.partial_cmp(b).unwrap());
        Self {
            success,
            min_latency: Seconds::new(values[0]),
            mode_latency: Seconds::new(values[1]),
            max_latency: Seconds::new(values[2]),
        }
    }

    /// Zero-range interpretation of a point `AccessResult`.
    pub fn from_access(access: &AccessResult) -> Self {
        Self {
            success: access.success,
            min_latency: access.latency,
            mode_latency: access.latency,
            max_latency: access.latency,
        }
    }

    /// Samples a latency inside `[min, max]`, biased toward `mode`, using a
    /// triangular distribution.
    pub fn sample_latency(&self, rng: &mut impl rand::Rng) -> Seconds {
        let (min, mode, max) = (
            self.min_latency.as_f64(),
            self.mode_latency.as_f64(),
            self.max_latency.as_f64(),
        );
        if (max - min).abs() < 1e-12 {
            return self.min_latency;
        }
        let u: f64 = rng.gen();
        let fc = (mode - min) / (max - min);
        let sample = if u < fc {
            min + (u * (max - min) * (mode - min)).sqrt()
        } else {
            max - ((1.0 - u) * (max - min) * (max - mode)).sqrt()
        };
        Seconds::new(sample)
    }

    pub fn to_access(&self, rng: &mut impl rand::Rng) -> AccessResult {
        AccessResult {
            success: self.success,
            latency: self.sample_latency(rng),
        }
    }
}

impl Observable for RangedResult {
    fn is_success(&self) -> bool {
        self.success
    }
    fn get_latency(&self) -> Seconds {
        // Conservative single-value view: the mode is the most likely
        // latency in the range.
        self.mode_latency
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seconds_clamps_negative_and_nan() {
        assert_eq!(Seconds::new(-5.0), Seconds::ZERO);
        assert_eq!(Seconds::new(f64::NAN), Seconds::ZERO);
        assert_eq!(Seconds::new(0.0), Seconds::ZERO);
    }

    #[test]
    fn seconds_clamps_to_huge() {
        assert_eq!(Seconds::new(f64::INFINITY), Seconds::HUGE);
        assert_eq!(Seconds::new(200_000.0), Seconds::HUGE);
        assert!(Seconds::new(1.0) < Seconds::HUGE);
    }

    #[test]
    fn and_access_combines_success_and_latency() {
        let a = AccessResult::success(Seconds::new(0.01));
        let b = AccessResult::success(Seconds::new(0.02));
        let combined = AccessResult::and_access(&a, &b);
        assert!(combined.success);
        assert!((combined.latency.as_f64() - 0.03).abs() < 1e-9);

        let c = AccessResult::failure(Seconds::new(0.01));
        let combined2 = AccessResult::and_access(&a, &c);
        assert!(!combined2.success);
    }

    #[test]
    fn ranged_result_orders_min_mode_max() {
        let r = RangedResult::new(
            true,
            Seconds::new(0.5),
            Seconds::new(0.1),
            Seconds::new(0.3),
        );
        assert!(r.min_latency <= r.mode_latency);
        assert!(r.mode_latency <= r.max_latency);
    }

    #[test]
    fn ranged_result_sample_stays_in_range() {
        let r = RangedResult::new(
            true,
            Seconds::new(0.1),
            Seconds::new(0.2),
            Seconds::new(0.5),
        );
        let mut rng = rand::thread_rng();
        for _ in 0..200 {
            let s = r.sample_latency(&mut rng);
            assert!(s.as_f64() >= r.min_latency.as_f64() - 1e-9);
            assert!(s.as_f64() <= r.max_latency.as_f64() + 1e-9);
        }
    }
}
