//! The index family: `HeapFile`, `SortedFile`, `HashIndex`,
//! `BTreeIndex`, `BitmapIndex`, `LSMTree`. All share [`IndexBase`] — disk
//! dependency, page/record geometry, per-record CPU cost, and the
//! reduction bound each index's composed distributions are kept under.
//!
//! Each type is a struct of config fields plus methods, adapted from an
//! actual on-disk data structure to closed-form cost estimation — none of
//! these types store real records, only the parameters needed to estimate
//! the cost of operating on `num_records` of them.

use std::rc::Rc;

use crate::outcome::Outcomes;
use crate::reduction::trim_to_size;
use crate::result::{AccessResult, Seconds};

use super::disk::DiskOperations;

pub mod bitmap_index;
pub mod btree_index;
pub mod hash_index;
pub mod heap_file;
pub mod lsm_tree;
pub mod sorted_file;

pub use bitmap_index::BitmapIndex;
pub use btree_index::BTreeIndex;
pub use hash_index::HashIndex;
pub use heap_file::HeapFile;
pub use lsm_tree::LsmTree;
pub use sorted_file::SortedFile;

/// Default geometry/reduction constants, used by [`IndexBase::init`] to
/// fill zero-valued fields.
pub const DEFAULT_PAGE_SIZE: u32 = 4096;
pub const DEFAULT_RECORD_SIZE: u32 = 100;
pub const DEFAULT_MAX_OUTCOME_LEN: usize = 32;
pub const DEFAULT_RECORD_PROCESSING_TIME: f64 = 1e-7;

/// Shared configuration and composition helpers for every index type.
pub struct IndexBase {
    pub disk: Rc<dyn DiskOperations>,
    pub page_size: u32,
    pub record_size: u32,
    pub num_records: u64,
    pub max_outcome_len: usize,
    /// Per-record CPU cost distribution, an `Outcomes[Duration]`.
    pub record_processing_time: Outcomes<Seconds>,
}

impl IndexBase {
    pub fn new(disk: Rc<dyn DiskOperations>) -> Self {
        let mut base = Self {
            disk,
            page_size: 0,
            record_size: 0,
            num_records: 0,
            max_outcome_len: 0,
            record_processing_time: Outcomes::new(),
        };
        base.init();
        base
    }

    /// Fills zero-valued fields with defaults and computes derived values —
    /// here there are no further derived values beyond the defaults
    /// themselves.
    pub fn init(&mut self) {
        if self.page_size == 0 {
            self.page_size = DEFAULT_PAGE_SIZE;
        }
        if self.record_size == 0 {
            self.record_size = DEFAULT_RECORD_SIZE;
        }
        if self.max_outcome_len == 0 {
            self.max_outcome_len = DEFAULT_MAX_OUTCOME_LEN;
        }
        if self.record_processing_time.is_empty() {
            self.record_processing_time =
                Outcomes::deterministic(Seconds::new(DEFAULT_RECORD_PROCESSING_TIME));
        }
    }

    /// `NumPages = ceil(NumRecords * RecordSize / PageSize)`, minimum 1.
    pub fn num_pages(&self) -> u64 {
        if self.num_records == 0 {
            return 1;
        }
        let total_bytes = self.num_records * self.record_size as u64;
        let pages = (total_bytes as f64 / self.page_size as f64).ceil() as u64;
        pages.max(1)
    }

    /// `RecordsPerPage = PageSize / RecordSize`, minimum 1.
    pub fn records_per_page(&self) -> u64 {
        (self.page_size / self.record_size.max(1)).max(1) as u64
    }

    /// The per-record CPU cost distribution scaled by `multiplier`
    /// (typically a record count), as an always-succeeding `AccessResult`
    /// distribution ready to `and` against a disk outcome.
    pub fn cpu_cost(&self, multiplier: f64) -> Outcomes<AccessResult> {
        self.record_processing_time
            .map(|latency| AccessResult::success(*latency * multiplier))
    }

    /// Composes `base` with `multiplier` units of per-record CPU cost.
    pub fn with_cpu(&self, base: Outcomes<AccessResult>, multiplier: f64) -> Outcomes<AccessResult> {
        base.and(&self.cpu_cost(multiplier), |a, b| {
            AccessResult::and_access(a, b)
        })
    }

    /// Applies this index's configured bucket-explosion control.
    pub fn reduce(&self, o: Outcomes<AccessResult>) -> Outcomes<AccessResult> {
        trim_to_size(&o, self.max_outcome_len * 2, self.max_outcome_len)
    }
}

/// Scales every bucket's latency (success and failure alike) by `factor`,
/// leaving `success` untouched. Used to express "N additional reads" or
/// "amplified by a factor" costs without composing N separate steps.
pub fn scale_latency(o: &Outcomes<AccessResult>, factor: f64) -> Outcomes<AccessResult> {
    o.map(|v| AccessResult {
        success: v.success,
        latency: v.latency * factor,
    })
}

/// Splits `base` into an unimpacted share (weight `1 - prob`, unchanged)
/// and an impacted share (weight `prob`, composed with `extra`). Used by
/// `HashIndex::insert`'s resize overlay and `LsmTree`'s compaction
/// interference overlay — both are "with probability p, additionally
/// incur this extra cost" patterns.
pub fn overlay_with_probability(
    base: &Outcomes<AccessResult>,
    prob: f64,
    extra: &Outcomes<AccessResult>,
) -> Outcomes<AccessResult> {
    let prob = prob.clamp(0.0, 1.0);
    let unimpacted = base.copy().scale_weights(1.0 - prob);
    let impacted = base
        .and(extra, |a, b| AccessResult::and_access(a, b))
        .scale_weights(prob);
    unimpacted.append(impacted)
}

/// `log2(n)`, rounded up, minimum `0` for `n <= 1`.
pub fn log2_ceil(n: u64) -> u32 {
    if n <= 1 {
        return 0;
    }
    (n as f64).log2().ceil() as u32
}

/// `log_base(n)`, rounded up, minimum `1`.
pub fn log_base_ceil(n: u64, base: u32) -> u32 {
    if n <= 1 || base <= 1 {
        return 1;
    }
    ((n as f64).ln() / (base as f64).ln()).ceil().max(1.0) as u32
}
