//! `NetworkLink`: base latency, jitter, and packet loss as a
//! precomputed outcome distribution.

use std::cell::RefCell;

use crate::outcome::Outcomes;
use crate::result::{AccessResult, Seconds};

/// The deliberate "+1ms" sentinel keeping the failure bucket strictly
/// outside the jittered success range, kept fixed for reproducibility.
const FAILURE_LATENCY_MARGIN: f64 = 0.001;

/// A point-to-point network link: `LatencyBuckets` success buckets spread
/// linearly across `[BaseLatency - MaxJitter, BaseLatency + MaxJitter]`,
/// plus one failure bucket for `PacketLossProb`.
#[derive(Debug, Clone)]
pub struct NetworkLink {
    pub base_latency: f64,
    pub max_jitter: f64,
    pub packet_loss_prob: f64,
    pub latency_buckets: usize,
    cache: RefCell<Option<Outcomes<AccessResult>>>,
}

impl Default for NetworkLink {
    fn default() -> Self {
        Self {
            base_latency: 0.0,
            max_jitter: 0.0,
            packet_loss_prob: 0.0,
            latency_buckets: 0,
            cache: RefCell::new(None),
        }
    }
}

impl NetworkLink {
    pub fn new(base_latency: f64, max_jitter: f64, packet_loss_prob: f64) -> Self {
        let mut link = Self {
            base_latency,
            max_jitter,
            packet_loss_prob,
            latency_buckets: 0,
            ..Default::default()
        };
        link.init();
        link
    }

    /// Defaults `latency_buckets` to `5` and clamps `packet_loss_prob`
    /// into `[0, 1]`; invalidates the cached, precomputed transfer
    /// distribution.
    pub fn init(&mut self) {
        if self.latency_buckets == 0 {
            self.latency_buckets = 5;
        }
        self.packet_loss_prob = self.packet_loss_prob.clamp(0.0, 1.0);
        self.max_jitter = self.max_jitter.max(0.0);
        *self.cache.borrow_mut() = None;
    }

    fn compute(&self) -> Outcomes<AccessResult> {
        let n = self.latency_buckets.max(1);
        let low = (self.base_latency - self.max_jitter).max(0.0);
        let high = (self.base_latency + self.max_jitter).max(low);
        let success_mass = 1.0 - self.packet_loss_prob;
        let per_bucket = success_mass / n as f64;

        let mut out = Outcomes::new();
        for i in 0..n {
            let t = if n == 1 {
                0.5
            } else {
                i as f64 / (n - 1) as f64
            };
            let latency = low + t * (high - low);
            out = out.add(per_bucket, AccessResult::success(Seconds::new(latency)));
        }

        if self.packet_loss_prob > 0.0 {
            let failure_latency = high + FAILURE_LATENCY_MARGIN;
            out = out.add(
                self.packet_loss_prob,
                AccessResult::failure(Seconds::new(failure_latency)),
            );
        }
        out
    }

    /// Precomputed once per configuration and returned as a clone on every
    /// call: the distribution is cached and observably immutable.
    pub fn transfer(&self) -> Outcomes<AccessResult> {
        if let Some(cached) = self.cache.borrow().as_ref() {
            return cached.clone();
        }
        let computed = self.compute();
        *self.cache.borrow_mut() = Some(computed.clone());
        computed
    }
}
