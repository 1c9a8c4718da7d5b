//! Pool Usage Metrics Collector
//!
//! Collects per-pool capacity, object and I/O counters from `ceph df detail`.
//!
//! # Metrics Produced
//! - `ceph_pool_used_bytes` - Bytes stored in the pool
//! - `ceph_pool_raw_used_bytes` - Raw bytes used by the pool, including replication
//! - `ceph_pool_available_bytes` - Free space available to the pool
//! - `ceph_pool_percent_used` - Fraction of the pool's capacity in use
//! - `ceph_pool_objects_total` - Objects stored in the pool
//! - `ceph_pool_dirty_objects_total` - Objects not yet written to the base tier
//! - `ceph_pool_read_total` / `ceph_pool_read_bytes_total` - Read operations and bytes
//! - `ceph_pool_write_total` / `ceph_pool_write_bytes_total` - Write operations and bytes
//! - `ceph_pool_quota_max_bytes` / `ceph_pool_quota_max_objects` - Configured quotas
//!
//! All metrics are labelled with `pool`. Numbers missing from the payload are reported as 0.

use super::Collector;
use crate::ceph::types::PoolDf;
use crate::ceph::{Query, QueryRunner};
use crate::error::Result;
use crate::metrics::{MetricDesc, MetricSample};
use async_trait::async_trait;
use tracing::debug;

const POOL: &[&str] = &["pool"];

pub const POOL_USED_BYTES: MetricDesc =
    MetricDesc::gauge("pool_used_bytes", "Capacity of the pool that is currently under use", POOL);
pub const POOL_RAW_USED_BYTES: MetricDesc = MetricDesc::gauge(
    "pool_raw_used_bytes",
    "Raw capacity of the pool that is currently under use, this factors in the size",
    POOL,
);
pub const POOL_AVAILABLE_BYTES: MetricDesc = MetricDesc::gauge(
    "pool_available_bytes",
    "Free space for the pool",
    POOL,
);
pub const POOL_PERCENT_USED: MetricDesc = MetricDesc::gauge(
    "pool_percent_used",
    "Percentage of the capacity available to this pool that is used by this pool",
    POOL,
);
pub const POOL_OBJECTS: MetricDesc =
    MetricDesc::gauge("pool_objects_total", "Total no. of objects allocated within the pool", POOL);
pub const POOL_DIRTY_OBJECTS: MetricDesc = MetricDesc::gauge(
    "pool_dirty_objects_total",
    "Total no. of dirty objects in a cache-tier pool",
    POOL,
);
pub const POOL_READ: MetricDesc =
    MetricDesc::counter("pool_read_total", "Total read I/O calls for the pool", POOL);
pub const POOL_READ_BYTES: MetricDesc =
    MetricDesc::counter("pool_read_bytes_total", "Total read throughput for the pool", POOL);
pub const POOL_WRITE: MetricDesc =
    MetricDesc::counter("pool_write_total", "Total write I/O calls for the pool", POOL);
pub const POOL_WRITE_BYTES: MetricDesc = MetricDesc::counter(
    "pool_write_bytes_total",
    "Total write throughput for the pool",
    POOL,
);
pub const POOL_QUOTA_MAX_BYTES: MetricDesc = MetricDesc::gauge(
    "pool_quota_max_bytes",
    "Maximum bytes the pool may hold (0 = no quota)",
    POOL,
);
pub const POOL_QUOTA_MAX_OBJECTS: MetricDesc = MetricDesc::gauge(
    "pool_quota_max_objects",
    "Maximum objects the pool may hold (0 = no quota)",
    POOL,
);

/// Maps a decoded `ceph df detail` payload to samples
///
/// Pure function of its input: the same payload always yields the same samples.
pub fn pool_samples(df: &PoolDf) -> Vec<MetricSample> {
    let mut samples = Vec::with_capacity(df.pools.len() * 12);
    for pool in &df.pools {
        let name = [pool.name.as_str()];
        let stats = &pool.stats;

        samples.push(POOL_USED_BYTES.sample(stats.stored, &name));
        samples.push(POOL_RAW_USED_BYTES.sample(stats.stored_raw, &name));
        samples.push(POOL_AVAILABLE_BYTES.sample(stats.max_avail, &name));
        samples.push(POOL_PERCENT_USED.sample(stats.percent_used, &name));
        samples.push(POOL_OBJECTS.sample(stats.objects, &name));
        samples.push(POOL_DIRTY_OBJECTS.sample(stats.dirty, &name));
        samples.push(POOL_READ.sample(stats.rd, &name));
        samples.push(POOL_READ_BYTES.sample(stats.rd_bytes, &name));
        samples.push(POOL_WRITE.sample(stats.wr, &name));
        samples.push(POOL_WRITE_BYTES.sample(stats.wr_bytes, &name));
        samples.push(POOL_QUOTA_MAX_BYTES.sample(stats.quota_bytes, &name));
        samples.push(POOL_QUOTA_MAX_OBJECTS.sample(stats.quota_objects, &name));

        debug!(pool = %pool.name, "Updated metrics for pool");
    }
    samples
}

pub struct PoolUsageCollector {
    runner: QueryRunner,
}

impl PoolUsageCollector {
    pub fn new(runner: QueryRunner) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl Collector for PoolUsageCollector {
    fn name(&self) -> &'static str {
        "pool_usage"
    }

    fn describe(&self) -> Vec<MetricDesc> {
        vec![
            POOL_USED_BYTES,
            POOL_RAW_USED_BYTES,
            POOL_AVAILABLE_BYTES,
            POOL_PERCENT_USED,
            POOL_OBJECTS,
            POOL_DIRTY_OBJECTS,
            POOL_READ,
            POOL_READ_BYTES,
            POOL_WRITE,
            POOL_WRITE_BYTES,
            POOL_QUOTA_MAX_BYTES,
            POOL_QUOTA_MAX_OBJECTS,
        ]
    }

    async fn collect(&self) -> Result<Vec<MetricSample>> {
        let df: PoolDf = self
            .runner
            .json(&Query::ceph(&["df", "detail", "--format", "json"]))
            .await?;
        Ok(pool_samples(&df))
    }
}
