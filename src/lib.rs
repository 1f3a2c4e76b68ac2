// sdl-core - Analytical performance modelling for distributed systems
// Root library module

pub mod builders;
pub mod components;
pub mod error;
pub mod flow;
pub mod metrics;
pub mod outcome;
pub mod profiles;
pub mod queueing;
pub mod reduction;
pub mod result;

pub use components::{
    BTreeIndex, Batcher, BatcherPolicy, BitmapIndex, Cache, CacheWithContention, Disk,
    DiskWithContention, HashIndex, HeapFile, LsmTree, NetworkLink, Queue, ResourcePool,
    SortedFile,
};
pub use error::{SdlError, SdlResult};
pub use flow::{ConditionalFlow, FlowAnalyzable, FlowPattern, UtilizationInfo, UtilizationProvider};
pub use outcome::{Bucket, Outcomes};
pub use profiles::DiskProfile;
pub use result::{AccessResult, Observable, RangedResult, Seconds};
