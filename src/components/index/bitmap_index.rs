//! `BitmapIndex`: a bitmap over a low/medium-cardinality
//! column. Lookup is one bitmap load plus a handful of bitwise ops and
//! result-materialisation CPU proportional to selectivity; mutation scales
//! the whole unit by an update-cost factor.

use std::rc::Rc;

use crate::outcome::Outcomes;
use crate::result::{AccessResult, Seconds};

use super::super::disk::DiskOperations;
use super::{scale_latency, IndexBase};

/// Per-bitwise-op CPU cost, uncompressed vs compressed.
pub const BITWISE_OP_COST_UNCOMPRESSED: f64 = 50e-9;
pub const BITWISE_OP_COST_COMPRESSED: f64 = 150e-9;
const BITWISE_OPS_PER_QUERY: f64 = 3.0;

pub struct BitmapIndex {
    pub base: IndexBase,
    pub cardinality: u64,
    pub is_compressed: bool,
    pub update_cost_factor: f64,
    pub query_selectivity: f64,
}

impl BitmapIndex {
    pub fn new(disk: Rc<dyn DiskOperations>) -> Self {
        let mut index = Self {
            base: IndexBase::new(disk),
            cardinality: 0,
            is_compressed: false,
            update_cost_factor: 0.0,
            query_selectivity: 0.0,
        };
        index.init();
        index
    }

    pub fn init(&mut self) {
        self.base.init();
        if self.cardinality == 0 {
            self.cardinality = 2;
        }
        if self.update_cost_factor <= 0.0 {
            self.update_cost_factor = 1.0;
        }
        if self.query_selectivity <= 0.0 {
            self.query_selectivity = 0.1;
        }
    }

    fn bitwise_op_cost(&self) -> f64 {
        if self.is_compressed {
            BITWISE_OP_COST_COMPRESSED
        } else {
            BITWISE_OP_COST_UNCOMPRESSED
        }
    }

    fn bitwise_ops_outcome(&self) -> Outcomes<AccessResult> {
        Outcomes::deterministic(AccessResult::success(Seconds::new(
            self.bitwise_op_cost() * BITWISE_OPS_PER_QUERY,
        )))
    }

    /// One disk read to load the bitmap, plus fixed bitwise-op CPU, plus
    /// result-processing CPU proportional to `NumRecords * QuerySelectivity`.
    pub fn find(&self) -> Outcomes<AccessResult> {
        let read = self.base.disk.read();
        let bitwise = self.bitwise_ops_outcome();
        let result_processing = self
            .base
            .cpu_cost(self.base.num_records as f64 * self.query_selectivity);

        let combined = read
            .and(&bitwise, |a, b| AccessResult::and_access(a, b))
            .and(&result_processing, |a, b| AccessResult::and_access(a, b));
        self.base.reduce(combined)
    }

    /// `(read + CPU*3 + write)`, with total latency scaled by
    /// `UpdateCostFactor`.
    fn mutate(&self) -> Outcomes<AccessResult> {
        let bitwise = self.bitwise_ops_outcome();
        let unit = self
            .base
            .disk
            .read()
            .and(&bitwise, |a, b| AccessResult::and_access(a, b))
            .and(&self.base.disk.write(), |a, b| AccessResult::and_access(a, b));
        self.base.reduce(scale_latency(&unit, self.update_cost_factor))
    }

    pub fn insert(&self) -> Outcomes<AccessResult> {
        self.mutate()
    }

    pub fn delete(&self) -> Outcomes<AccessResult> {
        self.mutate()
    }

    pub fn update(&self) -> Outcomes<AccessResult> {
        self.mutate()
    }
}
