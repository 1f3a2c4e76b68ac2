//! `Batcher`: size- or time-based formation wait, followed by
//! delegation to a downstream [`BatchProcessor`].

use crate::outcome::Outcomes;
use crate::queueing::wait_time_distribution;
use crate::reduction::trim_to_size;
use crate::result::AccessResult;

/// Consumed by `Batcher::submit`: given a batch size, returns
/// the service-time distribution for processing a batch of that size.
pub trait BatchProcessor {
    fn process_batch(&self, batch_size: u32) -> Outcomes<AccessResult>;
}

/// Formation policy: accumulate until `batch_size` requests have arrived,
/// or until `timeout` elapses, whichever the policy names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatcherPolicy {
    SizeBased,
    TimeBased,
}

/// Reduction trigger/ceiling applied to `submit()`'s combined distribution.
const TRIM_TRIGGER: usize = 64;
const TRIM_MAX_LEN: usize = 32;

/// A request batcher sitting in front of a [`BatchProcessor`].
pub struct Batcher<P: BatchProcessor> {
    pub policy: BatcherPolicy,
    pub batch_size: u32,
    pub timeout: f64,
    pub arrival_rate: f64,
    pub downstream: P,
}

impl<P: BatchProcessor> Batcher<P> {
    pub fn new(policy: BatcherPolicy, downstream: P) -> Self {
        let mut b = Self {
            policy,
            batch_size: 0,
            timeout: 0.0,
            arrival_rate: 0.0,
            downstream,
        };
        b.init();
        b
    }

    /// Fills zero-valued fields with defaults: `batch_size` defaults to
    /// `1`, `timeout` to `10ms`, `arrival_rate` to `1.0`.
    pub fn init(&mut self) {
        if self.batch_size == 0 {
            self.batch_size = 1;
        }
        if self.timeout <= 0.0 {
            self.timeout = 0.010;
        }
        if self.arrival_rate <= 0.0 {
            self.arrival_rate = 1.0;
        }
    }

    /// `(avg_wait_time, avg_batch_size)` using the formulas for each
    /// policy.
    pub fn derived_averages(&self) -> (f64, f64) {
        match self.policy {
            BatcherPolicy::SizeBased => {
                let avg_wait = (self.batch_size as f64 - 1.0) / (2.0 * self.arrival_rate);
                (avg_wait.max(0.0), self.batch_size as f64)
            }
            BatcherPolicy::TimeBased => {
                let avg_wait = self.timeout / 2.0;
                let avg_batch_size = (self.arrival_rate * self.timeout).max(1.0);
                (avg_wait, avg_batch_size)
            }
        }
    }

    /// Formation wait (5-bucket exponential approximation around
    /// `avg_wait_time`) composed with `downstream.process_batch(ceil(avg_batch_size))`,
    /// then trimmed to bound size.
    pub fn submit(&self) -> Outcomes<AccessResult> {
        let (avg_wait, avg_batch_size) = self.derived_averages();
        let wait = wait_time_distribution(avg_wait, true);
        let batch_size = avg_batch_size.ceil().max(1.0) as u32;
        let service = self.downstream.process_batch(batch_size);
        let combined = wait.and(&service, |w, s| AccessResult::and_access(w, s));
        trim_to_size(&combined, TRIM_TRIGGER, TRIM_MAX_LEN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics;
    use crate::result::Seconds;

    struct FixedProcessor {
        outcome: Outcomes<AccessResult>,
    }

    impl BatchProcessor for FixedProcessor {
        fn process_batch(&self, _batch_size: u32) -> Outcomes<AccessResult> {
            self.outcome.clone()
        }
    }

    fn known_downstream() -> FixedProcessor {
        FixedProcessor {
            outcome: Outcomes::new()
                .add(0.95, AccessResult::success(Seconds::new(0.01)))
                .add(0.05, AccessResult::failure(Seconds::new(0.02))),
        }
    }

    #[test]
    fn size_based_end_to_end_availability_matches_downstream() {
        let batcher = Batcher::new(
            BatcherPolicy::SizeBased,
            known_downstream(),
        );
        let mut batcher = batcher;
        batcher.batch_size = 8;
        batcher.arrival_rate = 100.0;
        batcher.init();
        let o = batcher.submit();
        let downstream_avail = metrics::availability(&known_downstream().process_batch(8));
        assert!((metrics::availability(&o) - downstream_avail).abs() < 1e-6);
    }

    #[test]
    fn size_based_mean_latency_within_tolerance() {
        let mut batcher = Batcher::new(BatcherPolicy::SizeBased, known_downstream());
        batcher.batch_size = 8;
        batcher.arrival_rate = 100.0;
        batcher.init();
        let o = batcher.submit();
        let (avg_wait, _) = batcher.derived_averages();
        let downstream_mean = metrics::mean_latency(&known_downstream().process_batch(8));
        let expected = avg_wait + downstream_mean;
        let actual = metrics::mean_latency(&o);
        assert!(
            (actual - expected).abs() / expected.max(1e-9) < 0.30,
            "actual={actual} expected={expected}"
        );
    }

    #[test]
    fn time_based_avg_batch_size_scales_with_arrival_rate() {
        let mut batcher = Batcher::new(BatcherPolicy::TimeBased, known_downstream());
        batcher.timeout = 0.05;
        batcher.arrival_rate = 200.0;
        batcher.init();
        let (_, avg_batch_size) = batcher.derived_averages();
        assert!((avg_batch_size - 10.0).abs() < 1e-9);
    }

    #[test]
    fn submit_never_empty() {
        let batcher = Batcher::new(BatcherPolicy::SizeBased, known_downstream());
        assert!(!batcher.submit().is_empty());
    }
}
