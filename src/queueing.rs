//! Analytical queueing theory: closed-form M/M/c and M/M/c/K formulas, and
//! the shared wait-time distribution approximation used by `Queue`,
//! `ResourcePool`, and `Batcher`.
//!
//! Pure `f64` math, no I/O — free functions with a dense `#[cfg(test)]`
//! block at the bottom.

use crate::outcome::Outcomes;
use crate::result::{AccessResult, Seconds};

/// `n!` for small `n`. Returns `f64::INFINITY` once the true factorial
/// would overflow an `f64`'s usable range, which the caller treats as a
/// `NumericOverflow` → "unstable" signal rather than a panic.
pub fn factorial(n: u64) -> f64 {
    if n > 170 {
        return f64::INFINITY;
    }
    let mut result = 1.0_f64;
    for i in 2..=n {
        result *= i as f64;
        if !result.is_finite() {
            return f64::INFINITY;
        }
    }
    result
}

/// Offered load `a = lambda / mu`.
pub fn offered_load(arrival_rate: f64, service_rate: f64) -> f64 {
    if service_rate <= 0.0 {
        return f64::INFINITY;
    }
    arrival_rate / service_rate
}

/// Utilisation `rho = a / c`.
pub fn utilization(offered_load: f64, servers: u32) -> f64 {
    if servers == 0 {
        return f64::INFINITY;
    }
    offered_load / servers as f64
}

/// `true` for an unbounded system iff `rho < 1`.
pub fn is_stable(rho: f64) -> bool {
    rho.is_finite() && rho < 1.0
}

/// `P0` for an M/M/c/K queue (Erlang-style loss/delay formula with a
/// bounded K). Handles `rho == 1` via the geometric-series sum limit and
/// returns `0.0` on overflow (treated as "unstable" by callers, since a
/// zero `P0` with non-zero `Pk` will still produce a sane blocking
/// probability downstream via the normalised terms).
pub fn p0_mm_c_k(a: f64, c: u32, k: u32, rho: f64) -> f64 {
    if !a.is_finite() || !rho.is_finite() {
        return 0.0;
    }
    let c_usize = c as usize;
    let k_usize = k as usize;

    let mut sum = 0.0_f64;
    for n in 0..=c_usize.min(k_usize) {
        let term = a.powi(n as i32) / factorial(n as u64);
        if !term.is_finite() {
            return 0.0;
        }
        sum += term;
    }

    if k_usize > c_usize {
        let c_term = a.powi(c as i32) / factorial(c as u64);
        if !c_term.is_finite() {
            return 0.0;
        }
        let extra_terms = k_usize - c_usize;
        if (rho - 1.0).abs() < 1e-9 {
            sum += c_term * extra_terms as f64;
        } else {
            let geometric = (1.0 - rho.powi(extra_terms as i32 + 1)) / (1.0 - rho);
            sum += c_term * (geometric - 1.0);
        }
    }

    if sum <= 0.0 || !sum.is_finite() {
        0.0
    } else {
        1.0 / sum
    }
}

/// Blocking probability `Pk`: probability an arrival finds the system at
/// capacity `K`.
pub fn pk_mm_c_k(p0: f64, a: f64, c: u32, k: u32, rho: f64) -> f64 {
    if !p0.is_finite() || !a.is_finite() || !rho.is_finite() {
        return 1.0;
    }
    if k < c {
        // Degenerate: capacity below server count behaves like M/M/k/k.
        let term = a.powi(k as i32) / factorial(k as u64);
        return (p0 * term).clamp(0.0, 1.0);
    }
    let c_term = a.powi(c as i32) / factorial(c as u64);
    let extra = (k - c) as i32;
    let scale = rho.powi(extra);
    (p0 * c_term * scale).clamp(0.0, 1.0)
}

/// Expected queue length `Lq` for an M/M/c/K queue.
pub fn lq_mm_c_k(p0: f64, a: f64, c: u32, k: u32, rho: f64) -> f64 {
    if !p0.is_finite() || !a.is_finite() || !rho.is_finite() || k <= c {
        return 0.0;
    }
    let c_term = a.powi(c as i32) / factorial(c as u64);
    if !c_term.is_finite() {
        return f64::INFINITY;
    }
    let extra = (k - c) as i32;

    if (rho - 1.0).abs() < 1e-9 {
        // rho == 1: Lq = P0 * c_term * sum_{j=1}^{extra} j
        let sum: f64 = (1..=extra).map(|j| j as f64).sum();
        p0 * c_term * sum
    } else {
        // Lq = P0 * c_term * rho / (1 - rho)^2 * (1 - rho^extra * (extra*(1-rho) + 1))
        let one_minus_rho = 1.0 - rho;
        let bracket = 1.0 - rho.powi(extra) * (extra as f64 * one_minus_rho + 1.0);
        let value = p0 * c_term * rho / one_minus_rho.powi(2) * bracket;
        if value.is_finite() {
            value.max(0.0)
        } else {
            f64::INFINITY
        }
    }
}

/// Chooses a proxy `K` large enough to approximate an unbounded queue:
/// `K = c + clamp(20 / (1 - rho), 5, 10000 - c)`.
pub fn infinite_k_proxy(servers: u32, rho: f64) -> u32 {
    let extra = if rho < 1.0 {
        (20.0 / (1.0 - rho)).clamp(5.0, (10000 - servers.min(9999)) as f64)
    } else {
        (10000 - servers.min(9999)) as f64
    };
    servers + extra.round() as u32
}

/// `Wq = Lq / lambda_eff`, where `lambda_eff = lambda * (1 - Pk)`.
/// Returns `f64::INFINITY` if any input is non-finite/NaN, and is never
/// negative.
pub fn wq_from_lq(lq: f64, arrival_rate: f64, pk: f64) -> f64 {
    if !lq.is_finite() || !arrival_rate.is_finite() || !pk.is_finite() {
        return f64::INFINITY;
    }
    let lambda_eff = arrival_rate * (1.0 - pk);
    if lambda_eff <= 0.0 {
        return f64::INFINITY;
    }
    (lq / lambda_eff).max(0.0)
}

/// Full M/M/c/K derivation bundle, computed from current configuration.
#[derive(Debug, Clone, Copy)]
pub struct MmckResult {
    pub offered_load: f64,
    pub utilization: f64,
    pub p0: f64,
    pub pk: f64,
    pub lq: f64,
    pub wq: f64,
}

/// Runs the full M/M/c/K derivation. `capacity` of `None` means
/// unbounded — a proxy `K` is chosen via [`infinite_k_proxy`].
pub fn solve_mm_c_k(
    arrival_rate: f64,
    service_rate: f64,
    servers: u32,
    capacity: Option<u32>,
) -> MmckResult {
    let a = offered_load(arrival_rate, service_rate);
    let rho = utilization(a, servers.max(1));
    let k = capacity.unwrap_or_else(|| infinite_k_proxy(servers.max(1), rho));
    let p0 = p0_mm_c_k(a, servers.max(1), k, rho);
    let pk = pk_mm_c_k(p0, a, servers.max(1), k, rho);
    let lq = lq_mm_c_k(p0, a, servers.max(1), k, rho);
    let wq = wq_from_lq(lq, arrival_rate, pk);
    MmckResult {
        offered_load: a,
        utilization: rho,
        p0,
        pk,
        lq,
        wq,
    }
}

/// Approximates the wait-time distribution around an average `Wq` using
/// a 5-bucket exponential inverse-CDF scheme. `success` marks
/// buckets as "waited then served"; pass `false` to model
/// "rejected/overloaded" instead (used by `ResourcePool`/`Queue` when the
/// waiting itself is the failure mode).
pub fn wait_time_distribution(wq: f64, success_when_served: bool) -> Outcomes<AccessResult> {
    if !wq.is_finite() || wq >= Seconds::HUGE.as_f64() {
        return Outcomes::deterministic(AccessResult::failure(Seconds::HUGE));
    }
    if wq < 1e-9 {
        return Outcomes::deterministic(AccessResult::success(Seconds::ZERO));
    }

    let mut out = Outcomes::new();
    for &p in &[0.10, 0.30, 0.50, 0.70, 0.90] {
        let latency = (-wq * (1.0 - p).ln()).max(0.0);
        let value = if success_when_served {
            AccessResult::success(Seconds::new(latency))
        } else {
            AccessResult::failure(Seconds::new(latency))
        };
        out = out.add(0.20, value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factorial_matches_known_values() {
        assert_eq!(factorial(0), 1.0);
        assert_eq!(factorial(1), 1.0);
        assert_eq!(factorial(5), 120.0);
    }

    #[test]
    fn mm1_closed_form_matches_expected_wq() {
        // lambda = 9, Ts = 0.1 -> mu = 10, c = 1
        let lambda = 9.0;
        let mu = 10.0;
        let result = solve_mm_c_k(lambda, mu, 1, None);
        assert!((result.wq - 0.9).abs() / 0.9 < 0.01, "wq={}", result.wq);
    }

    #[test]
    fn mm1_unbounded_unstable_yields_infinite_wq() {
        let result = solve_mm_c_k(10.0, 9.0, 1, None);
        assert!(result.wq.is_infinite() || result.wq >= Seconds::HUGE.as_f64());
    }

    #[test]
    fn mm1_2_bounded_blocking_probability() {
        // lambda = mu = 10, c = 1, K = 2 -> Pk ~= 1/3
        let a = offered_load(10.0, 10.0);
        let rho = utilization(a, 1);
        let p0 = p0_mm_c_k(a, 1, 2, rho);
        let pk = pk_mm_c_k(p0, a, 1, 2, rho);
        assert!((pk - 1.0 / 3.0).abs() / (1.0 / 3.0) < 0.01, "pk={}", pk);
    }

    #[test]
    fn mmc_beats_mm1_at_same_utilization() {
        // lambda=15, Ts=0.1 -> mu=10, c=2, rho=0.75
        let mmc = solve_mm_c_k(15.0, 10.0, 2, None);
        // Equivalent M/M/1 at same rho=0.75: lambda'=7.5, mu=10, c=1
        let mm1 = solve_mm_c_k(7.5, 10.0, 1, None);
        assert!(mmc.wq < mm1.wq, "mmc.wq={} mm1.wq={}", mmc.wq, mm1.wq);
    }

    #[test]
    fn wait_time_distribution_degenerates_at_extremes() {
        let huge = wait_time_distribution(f64::INFINITY, true);
        assert_eq!(huge.len(), 1);
        assert!(!huge.buckets()[0].value.success);

        let instant = wait_time_distribution(1e-12, true);
        assert_eq!(instant.len(), 1);
        assert!(instant.buckets()[0].value.success);
        assert_eq!(instant.buckets()[0].value.latency, Seconds::ZERO);
    }

    #[test]
    fn wait_time_distribution_has_five_equal_weight_buckets() {
        let o = wait_time_distribution(0.5, true);
        assert_eq!(o.len(), 5);
        for b in o.buckets() {
            assert!((b.weight - 0.20).abs() < 1e-9);
            assert!(b.value.success);
        }
    }

    #[test]
    fn infinite_k_proxy_grows_with_utilization() {
        let low = infinite_k_proxy(4, 0.2);
        let high = infinite_k_proxy(4, 0.95);
        assert!(high > low);
    }
}
