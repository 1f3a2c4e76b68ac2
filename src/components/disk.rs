//! `Disk` and `DiskWithContention`: fixed-profile storage
//! devices, optionally overlaid with a resource-pool or queue contention
//! model so index composition (§4.10) can share one dependency type.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::flow::UtilizationInfo;
use crate::outcome::Outcomes;
use crate::profiles::{self, DiskProfile};
use crate::result::{AccessResult, Seconds};

use super::queue::Queue;
use super::resource_pool::ResourcePool;

/// Shared capability both `Disk` and `DiskWithContention` implement, so
/// index components (§4.10) can depend on either through one trait object
/// rather than needing a generic parameter per index type.
pub trait DiskOperations {
    fn read(&self) -> Outcomes<AccessResult>;
    fn write(&self) -> Outcomes<AccessResult>;
    fn read_process_write(&self, processing_time: Seconds) -> Outcomes<AccessResult>;
    fn utilization_info(&self) -> Vec<UtilizationInfo> {
        Vec::new()
    }
}

/// Adds `processing_time` to the latency of every *successful* bucket,
/// leaving failure buckets' latency untouched (a failed read/write is
/// never followed by processing).
fn add_fixed_latency(o: &Outcomes<AccessResult>, extra: Seconds) -> Outcomes<AccessResult> {
    o.map(|v| {
        if v.success {
            AccessResult::success(v.latency + extra)
        } else {
            *v
        }
    })
}

/// A disk backed by one of the canonical, pre-built profiles.
#[derive(Debug, Clone)]
pub struct Disk {
    pub profile: DiskProfile,
}

impl Default for Disk {
    fn default() -> Self {
        Self {
            profile: DiskProfile::Ssd,
        }
    }
}

impl Disk {
    pub fn new(profile: DiskProfile) -> Self {
        Self { profile }
    }

    /// Resolves `name` via [`profiles::resolve_profile_name`] (unknown
    /// names fall back to SSD and are reported once, never fatal).
    pub fn from_profile_name(name: &str) -> Self {
        Self::new(profiles::resolve_profile_name(name))
    }
}

impl DiskOperations for Disk {
    fn read(&self) -> Outcomes<AccessResult> {
        profiles::read_profile(self.profile)
    }

    fn write(&self) -> Outcomes<AccessResult> {
        profiles::write_profile(self.profile)
    }

    /// `and(Read, Write)` then `processing_time` is added to every
    /// successful bucket's latency.
    fn read_process_write(&self, processing_time: Seconds) -> Outcomes<AccessResult> {
        let combined = self
            .read()
            .and(&self.write(), |a, b| AccessResult::and_access(a, b));
        add_fixed_latency(&combined, processing_time)
    }
}

/// The contention model a `DiskWithContention` overlays on its raw
/// profile: a bounded resource pool (SSD-style — many outstanding I/Os
/// served concurrently) or a single-server queue (HDD-style — one head,
/// strictly serialized).
#[derive(Debug, Clone)]
pub enum ContentionModel {
    Pool(ResourcePool),
    SingleServerQueue(Queue),
}

/// Default SSD-style pool: 32 outstanding I/Os, 0.5ms average hold.
pub const DEFAULT_POOL_SIZE: u32 = 32;
pub const DEFAULT_POOL_HOLD_TIME: f64 = 0.0005;

/// A disk whose `read`/`write` latency is overlaid with a queuing-delay
/// distribution reflecting contention from concurrent callers.
pub struct DiskWithContention {
    pub disk: Disk,
    pub contention: ContentionModel,
    arrival_rates: RefCell<HashMap<&'static str, f64>>,
}

impl DiskWithContention {
    /// SSD-style: a bounded resource pool of concurrent I/O slots.
    pub fn ssd_with_pool(size: u32, avg_hold_time: f64) -> Self {
        Self {
            disk: Disk::new(DiskProfile::Ssd),
            contention: ContentionModel::Pool(ResourcePool::new(size, avg_hold_time)),
            arrival_rates: RefCell::new(HashMap::new()),
        }
    }

    /// HDD-style: a single-server queue (one physical head serializes
    /// access).
    pub fn hdd_with_queue(service_rate: f64, capacity: Option<u32>) -> Self {
        Self {
            disk: Disk::new(DiskProfile::Hdd),
            contention: ContentionModel::SingleServerQueue(Queue::new(service_rate, 1, capacity)),
            arrival_rates: RefCell::new(HashMap::new()),
        }
    }

    pub fn default_ssd_pool() -> Self {
        Self::ssd_with_pool(DEFAULT_POOL_SIZE, DEFAULT_POOL_HOLD_TIME)
    }

    pub fn set_arrival_rate(&self, method: &'static str, rate: f64) {
        self.arrival_rates.borrow_mut().insert(method, rate.max(0.0));
        match &self.contention {
            ContentionModel::Pool(_) => {}
            ContentionModel::SingleServerQueue(_) => {}
        }
    }

    fn total_arrival_rate(&self) -> f64 {
        self.arrival_rates.borrow().values().sum()
    }

    fn wait_outcome(&self) -> Outcomes<AccessResult> {
        match &self.contention {
            ContentionModel::Pool(pool) => {
                let mut pool = pool.clone();
                pool.set_arrival_rate(self.total_arrival_rate());
                pool.acquire()
            }
            ContentionModel::SingleServerQueue(queue) => {
                let mut queue = queue.clone();
                queue.set_arrival_rate("contention", self.total_arrival_rate());
                queue.dequeue()
            }
        }
    }

    fn overlay(&self, raw: Outcomes<AccessResult>) -> Outcomes<AccessResult> {
        self.wait_outcome()
            .and(&raw, |wait, disk| AccessResult::and_access(wait, disk))
    }
}

impl DiskOperations for DiskWithContention {
    fn read(&self) -> Outcomes<AccessResult> {
        self.overlay(self.disk.read())
    }

    fn write(&self) -> Outcomes<AccessResult> {
        self.overlay(self.disk.write())
    }

    fn read_process_write(&self, processing_time: Seconds) -> Outcomes<AccessResult> {
        self.overlay(self.disk.read_process_write(processing_time))
    }

    fn utilization_info(&self) -> Vec<UtilizationInfo> {
        match &self.contention {
            ContentionModel::Pool(pool) => {
                let mut pool = pool.clone();
                pool.set_arrival_rate(self.total_arrival_rate());
                use crate::flow::UtilizationProvider;
                pool.get_utilization_info()
            }
            ContentionModel::SingleServerQueue(queue) => {
                let mut queue = queue.clone();
                queue.set_arrival_rate("contention", self.total_arrival_rate());
                use crate::flow::UtilizationProvider;
                queue.get_utilization_info()
            }
        }
    }
}
