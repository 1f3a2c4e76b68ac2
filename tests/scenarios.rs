//! End-to-end scenarios combining several components into one system.

use std::rc::Rc;

use pretty_assertions::assert_eq;
use sdl_core::components::batcher::BatchProcessor;
use sdl_core::components::disk::DiskOperations;
use sdl_core::{
    metrics, AccessResult, Batcher, BatcherPolicy, BTreeIndex, Disk, DiskProfile, Outcomes,
    ResourcePool, Seconds,
};

#[test]
fn s1_ssd_read_profile_sanity() {
    let disk = Disk::new(DiskProfile::Ssd);
    let read = disk.read();
    assert!((metrics::availability(&read) - 0.998).abs() < 0.01);
    assert!(metrics::mean_latency(&read) < 0.0002);
    assert!((metrics::percentile_latency(&read, 0.99) - 0.002).abs() < 0.002);
}

#[test]
fn s2_hdd_read_vs_ssd_read() {
    let hdd = Disk::new(DiskProfile::Hdd);
    let ssd = Disk::new(DiskProfile::Ssd);
    assert!(metrics::mean_latency(&hdd.read()) > metrics::mean_latency(&ssd.read()));
    assert!(metrics::percentile_latency(&hdd.read(), 0.99) >= 0.1);
    assert!(metrics::percentile_latency(&ssd.read(), 0.99) <= 0.002);
}

#[test]
fn s3_btree_find_cost() {
    let disk: Rc<dyn DiskOperations> = Rc::new(Disk::new(DiskProfile::Ssd));
    let ssd_mean = metrics::mean_latency(&Disk::new(DiskProfile::Ssd).read());

    let mut index = BTreeIndex::new(disk);
    index.base.num_records = 5_000_000;
    index.node_fanout = 150;
    index.init();

    let height = index.height();
    assert!(height == 3 || height == 4, "height={height}");

    let find = index.find();
    assert!(metrics::availability(&find) >= 0.99);

    let find_mean = metrics::mean_latency(&find);
    let h = height as f64;
    assert!(find_mean >= 0.5 * h * ssd_mean);
    assert!(find_mean <= 2.0 * h * ssd_mean);
}

#[test]
fn s4_resource_pool_overload() {
    let mut pool = ResourcePool::new(1, 0.1);
    pool.set_arrival_rate(11.0);
    let o = pool.acquire();
    assert_eq!(o.len(), 1);
    assert_eq!(metrics::availability(&o), 0.0);
    assert_eq!(o.buckets()[0].value.latency, Seconds::HUGE);
}

struct KnownDownstream;

impl BatchProcessor for KnownDownstream {
    fn process_batch(&self, _batch_size: u32) -> Outcomes<AccessResult> {
        Outcomes::new()
            .add(0.95, AccessResult::success(Seconds::new(0.01)))
            .add(0.05, AccessResult::failure(Seconds::new(0.02)))
    }
}

#[test]
fn s5_batcher_formation() {
    let mut batcher = Batcher::new(BatcherPolicy::SizeBased, KnownDownstream);
    batcher.batch_size = 8;
    batcher.arrival_rate = 100.0;
    batcher.init();

    let downstream_outcome = KnownDownstream.process_batch(8);
    let downstream_avail = metrics::availability(&downstream_outcome);
    let downstream_mean = metrics::mean_latency(&downstream_outcome);

    let submitted = batcher.submit();
    assert!((metrics::availability(&submitted) - downstream_avail).abs() < 1e-6);

    let expected_wait = (8.0_f64 - 1.0) / (2.0 * 100.0);
    let expected_mean = expected_wait + downstream_mean;
    let actual_mean = metrics::mean_latency(&submitted);
    assert!(
        (actual_mean - expected_mean).abs() / expected_mean.max(1e-9) < 0.30,
        "actual={actual_mean} expected={expected_mean}"
    );
}

#[test]
fn s6_lsm_compaction_overlay() {
    use sdl_core::components::index::lsm_tree::LsmTree;

    let disk: Rc<dyn DiskOperations> = Rc::new(Disk::new(DiskProfile::Ssd));
    let base_write_mean = metrics::mean_latency(&Disk::new(DiskProfile::Ssd).write());

    let mut tree = LsmTree::new(disk);
    tree.memtable_hit_prob = 0.10;
    tree.level0_hit_prob = 0.5;
    tree.read_amp_factor = 4.0;
    tree.write_amp_factor = 1.0;
    tree.compaction_impact_prob = 0.05;
    tree.compaction_slowdown = Outcomes::deterministic(Seconds::new(0.005));
    tree.init();

    let write_mean = metrics::mean_latency(&tree.write());
    assert!(write_mean > base_write_mean);
    assert!(write_mean < base_write_mean + 0.005);
}
