//! `ResourcePool`: a stateless M/M/c analytical model over a fixed number
//! of homogeneous resources.
//!
//! Grounded stylistically in `components/queue.rs` (this crate's own
//! M/M/c/K model) — `ResourcePool` is the unbounded-capacity special case,
//! so it shares the same "recompute on every call" posture rather than
//! caching a derived value that a setter could silently invalidate.

use crate::flow::{FlowAnalyzable, FlowPattern, UtilizationInfo, UtilizationProvider};
use crate::outcome::Outcomes;
use crate::queueing::{solve_mm_c_k, wait_time_distribution};
use crate::result::{AccessResult, Seconds};

/// A pool of `size` identical resources, each held for `avg_hold_time`
/// seconds per acquisition, servicing arrivals at `arrival_rate`.
#[derive(Debug, Clone)]
pub struct ResourcePool {
    pub size: u32,
    pub avg_hold_time: f64,
    pub arrival_rate: f64,
}

impl Default for ResourcePool {
    fn default() -> Self {
        Self {
            size: 0,
            avg_hold_time: 0.0,
            arrival_rate: 0.0,
        }
    }
}

impl ResourcePool {
    pub fn new(size: u32, avg_hold_time: f64) -> Self {
        let mut pool = Self {
            size,
            avg_hold_time,
            arrival_rate: 0.0,
            ..Default::default()
        };
        pool.init();
        pool
    }

    /// Fills zero-valued fields with defaults: `size` defaults to `1`,
    /// `avg_hold_time` defaults to `1ms` — both strictly-positive
    /// requirements coerced rather than rejected.
    pub fn init(&mut self) {
        if self.size == 0 {
            self.size = 1;
        }
        if self.avg_hold_time <= 0.0 {
            self.avg_hold_time = 0.001;
        }
    }

    pub fn set_arrival_rate(&mut self, rate: f64) {
        self.arrival_rate = rate.max(0.0);
    }

    fn service_rate(&self) -> f64 {
        1.0 / self.avg_hold_time
    }

    fn solve(&self) -> crate::queueing::MmckResult {
        solve_mm_c_k(self.arrival_rate, self.service_rate(), self.size, None)
    }

    /// `acquire()`: unstable (`rho >= 1` or `Wq` clamps to a day) yields a
    /// single failure bucket at [`Seconds::HUGE`]; negligible `Wq` yields a
    /// single instant success; otherwise the shared 5-bucket exponential
    /// approximation, marked `success = true` (acquired after waiting).
    pub fn acquire(&self) -> Outcomes<AccessResult> {
        let result = self.solve();
        if !result.utilization.is_finite() || result.utilization >= 1.0 || result.wq.is_infinite()
        {
            tracing::debug!(
                utilization = result.utilization,
                "resource pool unstable, returning failure bucket"
            );
            return Outcomes::deterministic(AccessResult::failure(Seconds::HUGE));
        }
        wait_time_distribution(result.wq, true)
    }
}

impl FlowAnalyzable for ResourcePool {
    fn get_flow_pattern(&self, _method_name: &str, input_rate: f64) -> FlowPattern {
        let result = self.solve();
        // Success degrades smoothly past 0.8 utilisation down to 0 at 1.0.
        let success_rate = if result.utilization <= 0.8 {
            1.0
        } else {
            (1.0 - (result.utilization - 0.8) / 0.2).clamp(0.0, 1.0)
        };
        FlowPattern::new(self.avg_hold_time)
            .with_outflow("acquired", input_rate * success_rate)
            .with_success_rate(success_rate)
            .with_amplification(1.0)
    }
}

impl UtilizationProvider for ResourcePool {
    fn get_utilization_info(&self) -> Vec<UtilizationInfo> {
        vec![UtilizationInfo::new("pool", self.size as f64, self.arrival_rate).bottleneck(true)]
    }
}
