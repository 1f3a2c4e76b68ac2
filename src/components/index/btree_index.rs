//! `BTreeIndex`: a height-balanced index. Lookup cost is
//! one disk read and one node-search CPU step per level; mutation adds an
//! amortised split/merge propagation cost on top of `Find`.

use std::rc::Rc;

use crate::outcome::Outcomes;
use crate::result::{AccessResult, Seconds};

use super::super::disk::DiskOperations;
use super::{log2_ceil, log_base_ceil, scale_latency, IndexBase};

/// Reduce every 3 levels while walking the tree, bounding growth without
/// reducing on every single level.
const REDUCE_EVERY_LEVELS: u32 = 3;

pub struct BTreeIndex {
    pub base: IndexBase,
    pub node_fanout: u32,
    pub occupancy: f64,
    pub avg_split_prop_cost: f64,
    pub avg_merge_prop_cost: f64,
}

impl BTreeIndex {
    pub fn new(disk: Rc<dyn DiskOperations>) -> Self {
        let mut index = Self {
            base: IndexBase::new(disk),
            node_fanout: 0,
            occupancy: 0.0,
            avg_split_prop_cost: 0.0,
            avg_merge_prop_cost: 0.0,
        };
        index.init();
        index
    }

    pub fn init(&mut self) {
        self.base.init();
        if self.node_fanout == 0 {
            self.node_fanout = 100;
        }
        if self.occupancy <= 0.0 {
            self.occupancy = 0.7;
        }
        if self.avg_split_prop_cost <= 0.0 {
            self.avg_split_prop_cost = 0.05;
        }
        if self.avg_merge_prop_cost <= 0.0 {
            self.avg_merge_prop_cost = 0.05;
        }
    }

    /// `ceil(log_fanout(NumPages)) + 1`, minimum 1.
    pub fn height(&self) -> u32 {
        (log_base_ceil(self.base.num_pages(), self.node_fanout) + 1).max(1)
    }

    /// `Height * (disk read + per-node search CPU)`, reducing every
    /// [`REDUCE_EVERY_LEVELS`] levels to bound growth.
    pub fn find(&self) -> Outcomes<AccessResult> {
        let search_cpu = log2_ceil(self.node_fanout as u64).max(1) as f64;
        let mut acc = Outcomes::deterministic(AccessResult::success(Seconds::ZERO));
        for level in 0..self.height() {
            let step = self.base.with_cpu(self.base.disk.read(), search_cpu);
            acc = acc.and(&step, |a, b| AccessResult::and_access(a, b));
            if (level + 1) % REDUCE_EVERY_LEVELS == 0 {
                acc = self.base.reduce(acc);
            }
        }
        self.base.reduce(acc)
    }

    /// `Find` + leaf CPU modify + leaf write, plus an amortised split
    /// propagation cost of `AvgSplitPropCost * (disk_read + disk_write)`.
    pub fn insert(&self) -> Outcomes<AccessResult> {
        let located = self.find();
        let leaf_write = self.base.with_cpu(self.base.disk.write(), 1.0);
        let base = located.and(&leaf_write, |a, b| AccessResult::and_access(a, b));

        let prop_unit = self
            .base
            .disk
            .read()
            .and(&self.base.disk.write(), |a, b| AccessResult::and_access(a, b));
        let propagation = scale_latency(&prop_unit, self.avg_split_prop_cost);

        self.base
            .reduce(base.and(&propagation, |a, b| AccessResult::and_access(a, b)))
    }

    /// `Find` + leaf CPU modify + leaf write, plus an amortised merge
    /// propagation cost of `AvgMergePropCost * (disk_read + disk_write)`.
    pub fn delete(&self) -> Outcomes<AccessResult> {
        let located = self.find();
        let leaf_write = self.base.with_cpu(self.base.disk.write(), 1.0);
        let base = located.and(&leaf_write, |a, b| AccessResult::and_access(a, b));

        let prop_unit = self
            .base
            .disk
            .read()
            .and(&self.base.disk.write(), |a, b| AccessResult::and_access(a, b));
        let propagation = scale_latency(&prop_unit, self.avg_merge_prop_cost);

        self.base
            .reduce(base.and(&propagation, |a, b| AccessResult::and_access(a, b)))
    }
}
