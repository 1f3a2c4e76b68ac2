//! `LsmTree`: writes land in an in-memory memtable and are
//! amplified on flush/compaction; reads branch probabilistically across
//! memtable, L0, and deeper levels, with an overlaid compaction-slowdown
//! interference model shared by both operations.

use std::rc::Rc;

use crate::outcome::Outcomes;
use crate::result::{AccessResult, Seconds};

use super::super::disk::DiskOperations;
use super::{scale_latency, IndexBase};

pub struct LsmTree {
    pub base: IndexBase,
    pub memtable_hit_prob: f64,
    pub level0_hit_prob: f64,
    /// Exposed for utilisation/informational reporting; the read-path cost
    /// formula captures deeper-level amplification through
    /// `read_amp_factor` rather than iterating per level.
    pub levels: u32,
    pub read_amp_factor: f64,
    pub write_amp_factor: f64,
    pub compaction_impact_prob: f64,
    pub compaction_slowdown: Outcomes<Seconds>,
}

impl LsmTree {
    pub fn new(disk: Rc<dyn DiskOperations>) -> Self {
        let mut tree = Self {
            base: IndexBase::new(disk),
            memtable_hit_prob: 0.0,
            level0_hit_prob: 0.0,
            levels: 0,
            read_amp_factor: 0.0,
            write_amp_factor: 0.0,
            compaction_impact_prob: 0.0,
            compaction_slowdown: Outcomes::new(),
        };
        tree.init();
        tree
    }

    pub fn init(&mut self) {
        self.base.init();
        self.memtable_hit_prob = self.memtable_hit_prob.clamp(0.0, 1.0);
        self.level0_hit_prob = self.level0_hit_prob.clamp(0.0, 1.0);
        if self.levels == 0 {
            self.levels = 4;
        }
        if self.read_amp_factor <= 0.0 {
            self.read_amp_factor = 1.0;
        }
        if self.write_amp_factor <= 0.0 {
            self.write_amp_factor = 1.0;
        }
        self.compaction_impact_prob = self.compaction_impact_prob.clamp(0.0, 1.0);
        if self.compaction_slowdown.is_empty() {
            self.compaction_slowdown = Outcomes::deterministic(Seconds::new(0.005));
        }
    }

    /// Splits `base` into an unimpacted share (`1 - CompactionImpactProb`,
    /// unchanged) and an impacted share whose *successful* buckets get
    /// `compaction_slowdown` added to their latency; impacted failure
    /// buckets are left as-is: compaction slowdown is added to successful
    /// latencies only.
    fn overlay_compaction(&self, base: &Outcomes<AccessResult>) -> Outcomes<AccessResult> {
        let prob = self.compaction_impact_prob;
        let (success, failure) = base.split(|v| v.success);
        let unimpacted = base.copy().scale_weights(1.0 - prob);

        let slowdown_as_access = self.compaction_slowdown.map(|s| AccessResult::success(*s));
        let impacted_success = success
            .and(&slowdown_as_access, |a, b| AccessResult::and_access(a, b))
            .scale_weights(prob);
        let impacted_failure = failure.scale_weights(prob);

        unimpacted.append(impacted_success).append(impacted_failure)
    }

    /// CPU + one disk write, write-amplified (successful latencies only),
    /// then overlaid with compaction interference.
    pub fn write(&self) -> Outcomes<AccessResult> {
        let base = self.base.with_cpu(self.base.disk.write(), 1.0);
        let amplified = base.map(|v| {
            if v.success {
                AccessResult::success(v.latency * self.write_amp_factor)
            } else {
                *v
            }
        });
        self.base.reduce(self.overlay_compaction(&amplified))
    }

    /// Branches across memtable / L0 / deeper levels, weighted by
    /// `MemtableHitProb` and `Level0HitProb`, then overlays compaction
    /// interference.
    pub fn read(&self) -> Outcomes<AccessResult> {
        let memtable = self
            .base
            .cpu_cost(1.0)
            .scale_weights(self.memtable_hit_prob);

        let miss_memtable = 1.0 - self.memtable_hit_prob;
        let l0_weight = miss_memtable * self.level0_hit_prob;
        let deep_weight = miss_memtable * (1.0 - self.level0_hit_prob);

        let l0 = self
            .base
            .with_cpu(self.base.disk.read(), 1.0)
            .scale_weights(l0_weight);

        let deep_read = scale_latency(&self.base.disk.read(), self.read_amp_factor);
        let deep = self.base.with_cpu(deep_read, 1.0).scale_weights(deep_weight);

        let combined = memtable.append(l0).append(deep);
        self.base.reduce(self.overlay_compaction(&combined))
    }
}
