//! Metrics Collectors
//!
//! Each collector owns one Ceph subsystem: it queries the cluster through a
//! [`QueryRunner`], decodes the payload and returns [`MetricSample`]s.
//!
//! # Architecture
//!
//! Collectors follow a consistent pattern:
//! - Constructed once at startup with a shared [`QueryRunner`]
//! - Describe their metric families up front (`describe`, no I/O)
//! - Query, decode and map payloads to samples on every `collect`
//!
//! The set of collectors is closed: [`CollectorKind`] lists every implementation together
//! with its registry name and version gate.
//!
//! # Error Handling
//!
//! `collect` returns `Err` when the collector cannot contribute anything this cycle. The
//! exporter logs it and carries on with the other collectors. Partial failures inside a
//! collector (one daemon, one record) are logged and skipped by the collector itself.

use crate::ceph::{Feature, QueryRunner, VersionGate, VersionNumber};
use crate::error::Result;
use crate::metrics::{MetricDesc, MetricSample};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// A source of metric samples for one subsystem
#[async_trait]
pub trait Collector: Send + Sync {
    /// Registry key, also used in logs and self-metrics
    fn name(&self) -> &'static str;

    /// Metric families this collector may emit
    fn describe(&self) -> Vec<MetricDesc>;

    /// Run one full query → decode → emit pass
    async fn collect(&self) -> Result<Vec<MetricSample>>;
}

/// Status of a metrics collection operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionStatus {
    /// Samples were produced
    Success,
    /// Collection failed but is non-fatal (already logged as warning)
    Failed,
}

impl CollectionStatus {
    pub fn as_value(self) -> f64 {
        match self {
            CollectionStatus::Success => 1.0,
            CollectionStatus::Failed => 0.0,
        }
    }
}

/// Helper to reduce boilerplate in collectors
///
/// Wraps a query with consistent error handling:
/// - On success: maps the data to samples with `process`
/// - On error: logs a warning and contributes no samples
///
/// # Arguments
///
/// * `name` - Name of the metric group being collected (for logging)
/// * `query_future` - Async query that returns data
/// * `process` - Function turning the data into samples
pub async fn collect_with_handler<T, F, P, E>(
    name: &str,
    query_future: F,
    process: P,
) -> Vec<MetricSample>
where
    F: std::future::Future<Output = std::result::Result<T, E>>,
    E: std::fmt::Display,
    P: FnOnce(T) -> Vec<MetricSample>,
{
    match query_future.await {
        Ok(data) => {
            let samples = process(data);
            debug!(count = samples.len(), "Updated {} metrics", name);
            samples
        }
        Err(e) => {
            warn!("Failed to query {}: {}", name, e);
            Vec::new()
        }
    }
}

/// Every collector the exporter knows how to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectorKind {
    PoolUsage,
    Mds,
    Rgw,
    RbdMirror,
}

impl CollectorKind {
    pub const ALL: [CollectorKind; 4] = [
        CollectorKind::PoolUsage,
        CollectorKind::Mds,
        CollectorKind::Rgw,
        CollectorKind::RbdMirror,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CollectorKind::PoolUsage => "pool_usage",
            CollectorKind::Mds => "mds",
            CollectorKind::Rgw => "rgw",
            CollectorKind::RbdMirror => "rbd_mirror",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    pub fn gate(self) -> VersionGate {
        match self {
            CollectorKind::PoolUsage => VersionGate::always(),
            CollectorKind::Mds => VersionGate::since(VersionNumber::NAUTILUS),
            CollectorKind::Rgw => VersionGate::since(VersionNumber::LUMINOUS),
            CollectorKind::RbdMirror => {
                VersionGate::since(VersionNumber::NAUTILUS).requiring(Feature::RbdMirror)
            }
        }
    }

    pub fn build(self, runner: QueryRunner) -> Arc<dyn Collector> {
        match self {
            CollectorKind::PoolUsage => Arc::new(pool_usage::PoolUsageCollector::new(runner)),
            CollectorKind::Mds => Arc::new(mds::MdsCollector::new(runner)),
            CollectorKind::Rgw => Arc::new(rgw::RgwCollector::new(runner)),
            CollectorKind::RbdMirror => Arc::new(rbd_mirror::RbdMirrorCollector::new(runner)),
        }
    }
}

// Collector modules
pub mod mds;
pub mod pool_usage;
pub mod rbd_mirror;
pub mod rgw;

pub use mds::MdsCollector;
pub use pool_usage::PoolUsageCollector;
pub use rbd_mirror::RbdMirrorCollector;
pub use rgw::RgwCollector;
