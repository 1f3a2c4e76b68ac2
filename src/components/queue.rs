//! `Queue`: a stateless M/M/c/K analytical model.
//!
//! Grounded stylistically in `pure/connection_pool.rs`'s
//! rate/window-tracking helpers, generalized from a live rate limiter to a
//! steady-state closed-form queueing model. Queue has no state machine: it
//! recomputes `Pk`/`Wq`/`rho` from current configuration on every call.

use std::collections::HashMap;

use crate::flow::{FlowAnalyzable, FlowPattern, UtilizationInfo, UtilizationProvider};
use crate::outcome::Outcomes;
use crate::queueing::{solve_mm_c_k, wait_time_distribution};
use crate::result::{AccessResult, Seconds};

/// A ~10ns "negligible but non-zero" latency used for the `enqueue`
/// admission decision itself, distinct from the `Wq` waiting-time cost
/// observed via `dequeue`.
const ENQUEUE_LATENCY: f64 = 1e-8;

/// M/M/c/K queue: arrivals from (possibly several, named) sources share a
/// bounded queue served by `servers` servers at `service_rate` each.
#[derive(Debug, Clone)]
pub struct Queue {
    pub service_rate: f64,
    pub servers: u32,
    pub capacity: Option<u32>,
    arrival_rates: HashMap<String, f64>,
}

impl Default for Queue {
    fn default() -> Self {
        Self {
            service_rate: 0.0,
            servers: 0,
            capacity: None,
            arrival_rates: HashMap::new(),
        }
    }
}

impl Queue {
    pub fn new(service_rate: f64, servers: u32, capacity: Option<u32>) -> Self {
        let mut q = Self {
            service_rate,
            servers,
            capacity,
            arrival_rates: HashMap::new(),
        };
        q.init();
        q
    }

    /// Fills zero-valued fields with defaults. `service_rate` defaults to
    /// `1.0`, `servers` defaults to `1` — both strictly-positive
    /// requirements coerced rather than rejected.
    pub fn init(&mut self) {
        if self.service_rate <= 0.0 {
            self.service_rate = 1.0;
        }
        if self.servers == 0 {
            self.servers = 1;
        }
    }

    pub fn set_arrival_rate(&mut self, method: &str, rate: f64) {
        self.arrival_rates.insert(method.to_string(), rate.max(0.0));
    }

    pub fn get_arrival_rate(&self, method: &str) -> f64 {
        *self.arrival_rates.get(method).unwrap_or(&0.0)
    }

    pub fn get_total_arrival_rate(&self) -> f64 {
        self.arrival_rates.values().sum()
    }

    fn solve(&self) -> crate::queueing::MmckResult {
        solve_mm_c_k(
            self.get_total_arrival_rate(),
            self.service_rate,
            self.servers,
            self.capacity,
        )
    }

    pub fn get_utilization(&self) -> f64 {
        self.solve().utilization
    }

    /// `enqueue()`: success mass `1 - Pk` and failure mass `Pk`, both at
    /// the ~10ns admission-check latency. Collapses to a single
    /// deterministic bucket when one side is effectively zero.
    pub fn enqueue(&self) -> Outcomes<AccessResult> {
        let result = self.solve();
        let pk = result.pk.clamp(0.0, 1.0);

        if pk <= 1e-9 {
            return Outcomes::deterministic(AccessResult::success(Seconds::new(ENQUEUE_LATENCY)));
        }
        if pk >= 1.0 - 1e-9 {
            return Outcomes::deterministic(AccessResult::failure(Seconds::new(ENQUEUE_LATENCY)));
        }

        Outcomes::new()
            .add(
                1.0 - pk,
                AccessResult::success(Seconds::new(ENQUEUE_LATENCY)),
            )
            .add(pk, AccessResult::failure(Seconds::new(ENQUEUE_LATENCY)))
    }

    /// `dequeue()`: the waiting-time distribution per the shared 5-bucket
    /// exponential approximation around the computed `Wq`.
    pub fn dequeue(&self) -> Outcomes<AccessResult> {
        let result = self.solve();
        wait_time_distribution(result.wq, true)
    }
}

impl FlowAnalyzable for Queue {
    fn get_flow_pattern(&self, _method_name: &str, input_rate: f64) -> FlowPattern {
        let result = self.solve();
        FlowPattern::new(1.0 / self.service_rate)
            .with_outflow("served", input_rate * (1.0 - result.pk))
            .with_success_rate(1.0 - result.pk)
    }
}

impl UtilizationProvider for Queue {
    fn get_utilization_info(&self) -> Vec<UtilizationInfo> {
        let result = self.solve();
        vec![UtilizationInfo::new(
            "queue",
            self.servers as f64,
            result.offered_load,
        )
        .bottleneck(result.utilization >= 0.9)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics;

    #[test]
    fn enqueue_is_never_empty_and_len_at_least_one() {
        let mut q = Queue::new(10.0, 2, Some(5));
        q.set_arrival_rate("default", 5.0);
        let o = q.enqueue();
        assert!(o.len() >= 1);
    }

    #[test]
    fn enqueue_collapses_to_single_bucket_when_blocking_negligible() {
        let mut q = Queue::new(1000.0, 10, Some(1000));
        q.set_arrival_rate("default", 1.0);
        let o = q.enqueue();
        assert_eq!(o.len(), 1);
        assert!(metrics::availability(&o) > 0.999);
    }

    #[test]
    fn dequeue_returns_duration_like_distribution() {
        let mut q = Queue::new(10.0, 1, Some(20));
        q.set_arrival_rate("default", 9.0);
        let o = q.dequeue();
        assert!(o.len() >= 1);
        assert!(metrics::mean_latency(&o) >= 0.0);
    }

    #[test]
    fn total_arrival_rate_sums_named_sources() {
        let mut q = Queue::new(10.0, 1, Some(20));
        q.set_arrival_rate("reads", 3.0);
        q.set_arrival_rate("writes", 2.0);
        assert!((q.get_total_arrival_rate() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn re_setting_arrival_rate_changes_derived_values_next_call() {
        let mut q = Queue::new(10.0, 1, Some(50));
        q.set_arrival_rate("default", 1.0);
        let low_util = q.get_utilization();
        q.set_arrival_rate("default", 9.0);
        let high_util = q.get_utilization();
        assert!(high_util > low_util);
    }
}
