//! System-component models: disks, caches, queues, resource pools,
//! indexes, network links, and batchers — each producing outcome
//! distributions by composing its dependencies via the outcome algebra.
//!
//! A thin `mod`-and-`pub use` re-export layer over one file (or
//! submodule) per component.

pub mod batcher;
pub mod cache;
pub mod disk;
pub mod index;
pub mod network_link;
pub mod queue;
pub mod resource_pool;

pub use batcher::{Batcher, BatcherPolicy};
pub use cache::{Cache, CacheWithContention};
pub use disk::{Disk, DiskWithContention};
pub use index::{BTreeIndex, BitmapIndex, HashIndex, HeapFile, LsmTree, SortedFile};
pub use network_link::NetworkLink;
pub use queue::Queue;
pub use resource_pool::ResourcePool;
