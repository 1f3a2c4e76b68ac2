//! `HeapFile`: an unordered record store. `Find`/`Scan` cost
//! is dominated by how many pages must be read; no structure accelerates
//! lookups.

use std::rc::Rc;

use crate::outcome::Outcomes;
use crate::result::{AccessResult, Seconds};

use super::super::disk::DiskOperations;
use super::IndexBase;

pub struct HeapFile {
    pub base: IndexBase,
}

impl HeapFile {
    pub fn new(disk: Rc<dyn DiskOperations>) -> Self {
        Self {
            base: IndexBase::new(disk),
        }
    }

    /// Composes `pages` independent page-read steps via binary
    /// exponentiation (`O(log pages)` compositions rather than one per
    /// page), reducing after every composition so the distribution stays
    /// tractable even for a heap of millions of pages. Each page step
    /// composes a disk read with `RecordsPerPage` units of per-record CPU
    /// cost.
    fn walk_pages(&self, pages: u64) -> Outcomes<AccessResult> {
        let per_page_cpu = self.base.records_per_page() as f64;
        let single_page = self
            .base
            .reduce(self.base.with_cpu(self.base.disk.read(), per_page_cpu));

        let mut result = Outcomes::deterministic(AccessResult::success(Seconds::ZERO));
        let mut power = single_page;
        let mut remaining = pages.max(1);
        while remaining > 0 {
            if remaining & 1 == 1 {
                result = self
                    .base
                    .reduce(result.and(&power, |a, b| AccessResult::and_access(a, b)));
            }
            remaining >>= 1;
            if remaining > 0 {
                power = self
                    .base
                    .reduce(power.and(&power, |a, b| AccessResult::and_access(a, b)));
            }
        }
        result
    }

    /// Full sequential scan: every page is read once.
    pub fn scan(&self) -> Outcomes<AccessResult> {
        self.walk_pages(self.base.num_pages())
    }

    /// Expected cost of an unindexed point lookup: half the file, on
    /// average, must be scanned before the match (or exhaustion) is found.
    pub fn find(&self) -> Outcomes<AccessResult> {
        let half = (self.base.num_pages() as f64 / 2.0).ceil() as u64;
        self.walk_pages(half.max(1))
    }

    /// One disk read followed by per-record CPU cost — an approximation
    /// of unordered-append semantics (no search required to place a new
    /// record).
    pub fn insert(&self) -> Outcomes<AccessResult> {
        let step = self.base.with_cpu(self.base.disk.read(), 1.0);
        self.base.reduce(step)
    }

    /// Same expected cost as `find` (the record must be located before it
    /// can be removed).
    pub fn delete(&self) -> Outcomes<AccessResult> {
        self.find()
    }
}
