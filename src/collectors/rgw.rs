//! RADOS Gateway Metrics Collector
//!
//! Collects garbage-collection backlog and bucket resharding activity via `radosgw-admin`.
//!
//! # Metrics Produced
//! - `ceph_rgw_gc_active_tasks` / `ceph_rgw_gc_active_objects` - GC tasks (and their
//!   objects) whose expiry has passed and that are ready to be processed
//! - `ceph_rgw_gc_pending_tasks` / `ceph_rgw_gc_pending_objects` - GC tasks (and their
//!   objects) still waiting for their expiry
//! - `ceph_rgw_active_reshards` - Number of buckets queued for resharding
//! - `ceph_rgw_bucket_reshard` - Bucket queued for resharding (value is always 1)
//!   - Labels: bucket
//!
//! The GC and reshard queries are independent; one failing does not hide the other.

use super::Collector;
use crate::ceph::types::{GcTask, ReshardEntry};
use crate::ceph::{Query, QueryRunner};
use crate::error::Result;
use crate::metrics::{MetricDesc, MetricSample};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::warn;

pub const RGW_GC_ACTIVE_TASKS: MetricDesc =
    MetricDesc::gauge("rgw_gc_active_tasks", "RGW GC active task count", &[]);
pub const RGW_GC_ACTIVE_OBJECTS: MetricDesc =
    MetricDesc::gauge("rgw_gc_active_objects", "RGW GC active object count", &[]);
pub const RGW_GC_PENDING_TASKS: MetricDesc =
    MetricDesc::gauge("rgw_gc_pending_tasks", "RGW GC pending task count", &[]);
pub const RGW_GC_PENDING_OBJECTS: MetricDesc =
    MetricDesc::gauge("rgw_gc_pending_objects", "RGW GC pending object count", &[]);
pub const RGW_ACTIVE_RESHARDS: MetricDesc = MetricDesc::gauge(
    "rgw_active_reshards",
    "Number of buckets queued for resharding",
    &[],
);
pub const RGW_BUCKET_RESHARD: MetricDesc = MetricDesc::gauge(
    "rgw_bucket_reshard",
    "Bucket queued for resharding (value is always 1)",
    &["bucket"],
);

/// Splits GC tasks into active (expired before `now`) and pending
///
/// A task whose timestamp cannot be parsed is counted as pending.
pub fn gc_samples(tasks: &[GcTask], now: DateTime<Utc>) -> Vec<MetricSample> {
    let (mut active_tasks, mut active_objects) = (0u64, 0u64);
    let (mut pending_tasks, mut pending_objects) = (0u64, 0u64);

    for task in tasks {
        let objects = task.objs.len() as u64;
        match task.expires_at() {
            Some(expiry) if expiry < now => {
                active_tasks += 1;
                active_objects += objects;
            }
            _ => {
                pending_tasks += 1;
                pending_objects += objects;
            }
        }
    }

    vec![
        RGW_GC_ACTIVE_TASKS.sample(active_tasks as f64, &[]),
        RGW_GC_ACTIVE_OBJECTS.sample(active_objects as f64, &[]),
        RGW_GC_PENDING_TASKS.sample(pending_tasks as f64, &[]),
        RGW_GC_PENDING_OBJECTS.sample(pending_objects as f64, &[]),
    ]
}

/// Maps the entries of `radosgw-admin reshard list` to samples
///
/// # Arguments
///
/// * `entries` - Buckets currently queued for resharding
///
/// # Returns
///
/// One `rgw_active_reshards` sample holding the number of entries, followed by one
/// `rgw_bucket_reshard` sample (value 1) per entry, labelled with its bucket.
pub fn reshard_samples(entries: &[ReshardEntry]) -> Vec<MetricSample> {
    let mut samples = Vec::with_capacity(entries.len() + 1);
    samples.push(RGW_ACTIVE_RESHARDS.sample(entries.len() as f64, &[]));
    for entry in entries {
        samples.push(RGW_BUCKET_RESHARD.sample(1.0, &[entry.bucket_name.as_str()]));
    }
    samples
}

pub struct RgwCollector {
    runner: QueryRunner,
}

impl RgwCollector {
    pub fn new(runner: QueryRunner) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl Collector for RgwCollector {
    fn name(&self) -> &'static str {
        "rgw"
    }

    fn describe(&self) -> Vec<MetricDesc> {
        vec![
            RGW_GC_ACTIVE_TASKS,
            RGW_GC_ACTIVE_OBJECTS,
            RGW_GC_PENDING_TASKS,
            RGW_GC_PENDING_OBJECTS,
            RGW_ACTIVE_RESHARDS,
            RGW_BUCKET_RESHARD,
        ]
    }

    async fn collect(&self) -> Result<Vec<MetricSample>> {
        let gc = self
            .runner
            .json::<Vec<GcTask>>(&Query::radosgw_admin(&["gc", "list", "--include-all"]))
            .await;
        let reshards = self
            .runner
            .json::<Vec<ReshardEntry>>(&Query::radosgw_admin(&["reshard", "list"]))
            .await;

        match (gc, reshards) {
            (Ok(tasks), Ok(entries)) => {
                let mut samples = gc_samples(&tasks, Utc::now());
                samples.extend(reshard_samples(&entries));
                Ok(samples)
            }
            (Ok(tasks), Err(e)) => {
                warn!(error = %e, "failed to list rgw reshards");
                Ok(gc_samples(&tasks, Utc::now()))
            }
            (Err(e), Ok(entries)) => {
                warn!(error = %e, "failed to list rgw gc tasks");
                Ok(reshard_samples(&entries))
            }
            (Err(gc_err), Err(e)) => {
                warn!(error = %gc_err, "failed to list rgw gc tasks");
                Err(e)
            }
        }
    }
}
