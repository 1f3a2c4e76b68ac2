//! `Cache` and `CacheWithContention`: hit/miss/failure latency
//! composition, with an optional M/M/1 queuing-delay overlay.

use std::cell::RefCell;

use crate::flow::{FlowAnalyzable, FlowPattern, UtilizationInfo, UtilizationProvider};
use crate::outcome::Outcomes;
use crate::result::{AccessResult, Seconds};

/// A cache's configuration: hit rate, failure probability, and the
/// latency shape of each of the three outcome classes (hit / miss /
/// failure). Each shape defaults to a single deterministic zero-latency
/// bucket, meaning "instant" until configured otherwise.
#[derive(Debug, Clone)]
pub struct Cache {
    pub hit_rate: f64,
    pub failure_prob: f64,
    pub hit_latency: Outcomes<Seconds>,
    pub miss_latency: Outcomes<Seconds>,
    pub failure_latency: Outcomes<Seconds>,
    read_cache: RefCell<Option<Outcomes<AccessResult>>>,
    write_cache: RefCell<Option<Outcomes<AccessResult>>>,
}

impl Default for Cache {
    fn default() -> Self {
        Self {
            hit_rate: 0.0,
            failure_prob: 0.0,
            hit_latency: Outcomes::deterministic(Seconds::ZERO),
            miss_latency: Outcomes::deterministic(Seconds::ZERO),
            failure_latency: Outcomes::deterministic(Seconds::ZERO),
            read_cache: RefCell::new(None),
            write_cache: RefCell::new(None),
        }
    }
}

fn spread(shape: &Outcomes<Seconds>, mass: f64, success: bool) -> Outcomes<AccessResult> {
    let mut out = Outcomes::new();
    if mass <= 0.0 {
        return out;
    }
    let total = shape.total_weight();
    if total <= 0.0 {
        return out.add(mass, AccessResult { success, latency: Seconds::ZERO });
    }
    for b in shape.buckets() {
        let weight = mass * (b.weight / total);
        let value = AccessResult {
            success,
            latency: b.value,
        };
        out = out.add(weight, value);
    }
    out
}

impl Cache {
    pub fn new(hit_rate: f64, failure_prob: f64) -> Self {
        let mut c = Self {
            hit_rate,
            failure_prob,
            ..Default::default()
        };
        c.init();
        c
    }

    /// Clamps `hit_rate`/`failure_prob` into `[0, 1]` and invalidates any
    /// cached, precomputed read/write distributions — any configuration
    /// change invalidates cached derived outcomes.
    pub fn init(&mut self) {
        self.hit_rate = self.hit_rate.clamp(0.0, 1.0);
        self.failure_prob = self.failure_prob.clamp(0.0, 1.0);
        *self.read_cache.borrow_mut() = None;
        *self.write_cache.borrow_mut() = None;
    }

    fn compute_read(&self) -> Outcomes<AccessResult> {
        let remaining = 1.0 - self.failure_prob;
        let hit_mass = remaining * self.hit_rate;
        let miss_mass = remaining * (1.0 - self.hit_rate);
        let hit = spread(&self.hit_latency, hit_mass, true);
        let miss = spread(&self.miss_latency, miss_mass, false);
        let fail = spread(&self.failure_latency, self.failure_prob, false);
        let combined = hit.append(miss).append(fail);
        if combined.is_empty() {
            Outcomes::deterministic(AccessResult::failure(Seconds::ZERO))
        } else {
            combined
        }
    }

    /// Hit/miss/failure composition: `success = true` on hit,
    /// `success = false` on miss or failure. Result is cached until the
    /// next [`Cache::init`].
    pub fn read(&self) -> Outcomes<AccessResult> {
        if let Some(cached) = self.read_cache.borrow().as_ref() {
            return cached.clone();
        }
        let computed = self.compute_read();
        *self.read_cache.borrow_mut() = Some(computed.clone());
        computed
    }

    fn compute_write(&self) -> Outcomes<AccessResult> {
        let remaining = 1.0 - self.failure_prob;
        let hit_mass = remaining * self.hit_rate;
        let miss_mass = remaining * (1.0 - self.hit_rate);
        // Hit/miss distinction collapsed into a single success category —
        // both latency shapes contribute, both marked `success = true`.
        let hit = spread(&self.hit_latency, hit_mass, true);
        let miss = spread(&self.miss_latency, miss_mass, true);
        let fail = spread(&self.failure_latency, self.failure_prob, false);
        let combined = hit.append(miss).append(fail);
        if combined.is_empty() {
            Outcomes::deterministic(AccessResult::failure(Seconds::ZERO))
        } else {
            combined
        }
    }

    pub fn write(&self) -> Outcomes<AccessResult> {
        if let Some(cached) = self.write_cache.borrow().as_ref() {
            return cached.clone();
        }
        let computed = self.compute_write();
        *self.write_cache.borrow_mut() = Some(computed.clone());
        computed
    }
}

/// Default M/M/1 max-throughput assumption when none is configured.
pub const DEFAULT_MAX_THROUGHPUT: f64 = 10_000.0;

/// "infinite" sentinel applied to the queuing-delay overlay when the
/// cache's throughput is saturated (`rho >= 1`): one hour, distinct from
/// the engine-wide one-day sentinel since a saturated cache is a
/// configuration warning, not necessarily total unavailability.
const CACHE_OVERLOAD_WAIT: f64 = 3_600.0;

/// A `Cache` overlaid with an M/M/1 queuing-delay correction derived from
/// `max_throughput` and the currently configured arrival rate.
#[derive(Debug, Clone)]
pub struct CacheWithContention {
    pub cache: Cache,
    pub max_throughput: f64,
    pub arrival_rate: f64,
}

impl Default for CacheWithContention {
    fn default() -> Self {
        Self {
            cache: Cache::default(),
            max_throughput: DEFAULT_MAX_THROUGHPUT,
            arrival_rate: 0.0,
        }
    }
}

impl CacheWithContention {
    pub fn new(cache: Cache, max_throughput: f64) -> Self {
        Self {
            cache,
            max_throughput: if max_throughput > 0.0 {
                max_throughput
            } else {
                DEFAULT_MAX_THROUGHPUT
            },
            arrival_rate: 0.0,
        }
    }

    pub fn set_arrival_rate(&mut self, rate: f64) {
        self.arrival_rate = rate.max(0.0);
    }

    fn rho(&self) -> f64 {
        self.arrival_rate / self.max_throughput
    }

    /// `Wq = (rho * 1/mu) / (1 - rho)`, or [`CACHE_OVERLOAD_WAIT`] once
    /// `rho >= 1`.
    fn queue_wait(&self) -> Seconds {
        let rho = self.rho();
        if !rho.is_finite() || rho >= 1.0 {
            return Seconds::new(CACHE_OVERLOAD_WAIT);
        }
        let service_time = 1.0 / self.max_throughput;
        Seconds::new(rho * service_time / (1.0 - rho))
    }

    fn overlay(&self, base: Outcomes<AccessResult>) -> Outcomes<AccessResult> {
        let wait = self.queue_wait();
        base.map(|v| AccessResult {
            success: v.success,
            latency: v.latency + wait,
        })
    }

    pub fn read(&self) -> Outcomes<AccessResult> {
        self.overlay(self.cache.read())
    }

    pub fn write(&self) -> Outcomes<AccessResult> {
        self.overlay(self.cache.write())
    }
}

impl FlowAnalyzable for CacheWithContention {
    fn get_flow_pattern(&self, method_name: &str, input_rate: f64) -> FlowPattern {
        let service_time = 1.0 / self.max_throughput;
        let success_rate = if method_name.eq_ignore_ascii_case("write") {
            1.0 - self.cache.failure_prob
        } else {
            (1.0 - self.cache.failure_prob) * self.cache.hit_rate
        };
        FlowPattern::new(service_time)
            .with_outflow("served", input_rate)
            .with_success_rate(success_rate)
    }
}

impl UtilizationProvider for CacheWithContention {
    fn get_utilization_info(&self) -> Vec<UtilizationInfo> {
        vec![UtilizationInfo::new("cache", self.max_throughput, self.arrival_rate)
            .bottleneck(self.rho() >= 0.9)]
    }
}
