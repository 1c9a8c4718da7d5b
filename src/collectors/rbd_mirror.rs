//! RBD Mirror Metrics Collector
//!
//! Reports mirroring health from `rbd mirror pool status`. Only registered against clusters
//! that run at least one `rbd-mirror` daemon.
//!
//! # Metrics Produced
//! - `ceph_rbd_mirror_pool_status` - Overall mirroring health
//! - `ceph_rbd_mirror_pool_daemon_status` - Health of the rbd-mirror daemons
//! - `ceph_rbd_mirror_pool_image_status` - Health of the mirrored images
//!
//! Values: 0=OK, 1=WARNING, 2=ERROR, 3=UNKNOWN.

use super::Collector;
use crate::ceph::types::MirrorPoolStatus;
use crate::ceph::{Query, QueryRunner};
use crate::error::Result;
use crate::metrics::{MetricDesc, MetricSample};
use async_trait::async_trait;

pub const RBD_MIRROR_POOL_STATUS: MetricDesc = MetricDesc::gauge(
    "rbd_mirror_pool_status",
    "Health status of rbd-mirror, can vary only between 3 states (err:2, warn:1, ok:0)",
    &[],
);
pub const RBD_MIRROR_POOL_DAEMON_STATUS: MetricDesc = MetricDesc::gauge(
    "rbd_mirror_pool_daemon_status",
    "Health status of rbd-mirror daemons, can vary only between 3 states (err:2, warn:1, ok:0)",
    &[],
);
pub const RBD_MIRROR_POOL_IMAGE_STATUS: MetricDesc = MetricDesc::gauge(
    "rbd_mirror_pool_image_status",
    "Health status of rbd-mirror images, can vary only between 3 states (err:2, warn:1, ok:0)",
    &[],
);

/// Numeric value for a mirror health string
pub fn health_value(health: &str) -> f64 {
    match health.to_uppercase().as_str() {
        "OK" => 0.0,
        "WARNING" => 1.0,
        "ERROR" => 2.0,
        _ => 3.0,
    }
}

/// Maps a decoded `rbd mirror pool status` summary to samples
///
/// # Arguments
///
/// * `status` - Mirror pool status as reported by `rbd`
///
/// # Returns
///
/// Exactly three unlabelled samples (pool, daemon and image health), each encoded as
/// 0=OK, 1=WARNING, 2=ERROR and 3 for anything else.
pub fn mirror_samples(status: &MirrorPoolStatus) -> Vec<MetricSample> {
    let summary = &status.summary;
    vec![
        RBD_MIRROR_POOL_STATUS.sample(health_value(&summary.health), &[]),
        RBD_MIRROR_POOL_DAEMON_STATUS.sample(health_value(&summary.daemon_health), &[]),
        RBD_MIRROR_POOL_IMAGE_STATUS.sample(health_value(&summary.image_health), &[]),
    ]
}

pub struct RbdMirrorCollector {
    runner: QueryRunner,
}

impl RbdMirrorCollector {
    pub fn new(runner: QueryRunner) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl Collector for RbdMirrorCollector {
    fn name(&self) -> &'static str {
        "rbd_mirror"
    }

    fn describe(&self) -> Vec<MetricDesc> {
        vec![
            RBD_MIRROR_POOL_STATUS,
            RBD_MIRROR_POOL_DAEMON_STATUS,
            RBD_MIRROR_POOL_IMAGE_STATUS,
        ]
    }

    async fn collect(&self) -> Result<Vec<MetricSample>> {
        let status: MirrorPoolStatus = self
            .runner
            .json(&Query::rbd(&["mirror", "pool", "status", "--format", "json"]))
            .await?;
        Ok(mirror_samples(&status))
    }
}
