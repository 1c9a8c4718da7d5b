//! Ceph Payload Type Definitions
//!
//! Serde structs for the JSON the Ceph admin tools print. They are read-only value objects
//! that live for a single collection pass.
//!
//! # Design Notes
//!
//! - **Lenient decoding**: nearly every field carries `#[serde(default)]`, so a payload that
//!   omits an optional number decodes to zero instead of failing the whole collector.
//! - **Dead Code**: fields that no collector reads yet are kept for completeness.
//!
//! # Queries Covered
//!
//! - `ceph version` → [`VersionReport`]
//! - `ceph versions` → [`DaemonVersions`]
//! - `ceph health detail` → [`HealthDetail`]
//! - `ceph mds stat` → [`MdsStat`]
//! - `ceph tell <mds> status` → [`DaemonStatus`]
//! - `ceph tell <mds> dump_blocked_ops` → [`BlockedOps`]
//! - `ceph df detail` → [`PoolDf`]
//! - `radosgw-admin gc list` → [`GcTask`]
//! - `radosgw-admin reshard list` → [`ReshardEntry`]
//! - `rbd mirror pool status` → [`MirrorPoolStatus`]

#![allow(dead_code)]
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Deserialize, Clone)]
pub struct VersionReport {
    pub version: String,
}

/// Daemon type → version string → daemon count
pub type DaemonVersions = HashMap<String, HashMap<String, u64>>;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct HealthDetail {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub checks: HashMap<String, HealthCheck>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct HealthCheck {
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub summary: HealthSummary,
    #[serde(default)]
    pub detail: Vec<HealthDetailMessage>,
    #[serde(default)]
    pub muted: bool,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct HealthSummary {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub count: u64,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct HealthDetailMessage {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct MdsStat {
    #[serde(default)]
    pub fsmap: FsMap,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct FsMap {
    #[serde(default)]
    pub filesystems: Vec<Filesystem>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Filesystem {
    #[serde(default)]
    pub mdsmap: MdsMap,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct MdsMap {
    #[serde(default)]
    pub fs_name: String,
    #[serde(default)]
    pub info: HashMap<String, MdsInfo>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct MdsInfo {
    #[serde(default)]
    pub gid: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub rank: i64,
    #[serde(default)]
    pub state: String,
}

/// Output of `ceph tell <mds> status`
#[derive(Debug, Deserialize, Clone, Default)]
pub struct DaemonStatus {
    #[serde(default)]
    pub cluster_fsid: String,
    #[serde(default)]
    pub whoami: i64,
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub want_state: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub fs_name: String,
    #[serde(default)]
    pub rank_uptime: f64,
    #[serde(default)]
    pub uptime: f64,
}

/// Output of `ceph tell <mds> dump_blocked_ops`
#[derive(Debug, Deserialize, Clone, Default)]
pub struct BlockedOps {
    #[serde(default)]
    pub ops: Vec<BlockedOp>,
    #[serde(default)]
    pub complaint_time: f64,
    #[serde(default)]
    pub num_blocked_ops: u64,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct BlockedOp {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub initiated_at: String,
    #[serde(default)]
    pub age: f64,
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub type_data: OpTypeData,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct OpTypeData {
    #[serde(default)]
    pub flag_point: String,
    #[serde(default)]
    pub reqid: String,
    #[serde(default)]
    pub op_type: String,
    #[serde(default)]
    pub client_info: ClientInfo,
    #[serde(default)]
    pub events: Vec<OpEvent>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ClientInfo {
    #[serde(default)]
    pub client: String,
    #[serde(default)]
    pub tid: u64,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct OpEvent {
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub event: String,
}

/// Output of `ceph df detail`
#[derive(Debug, Deserialize, Clone, Default)]
pub struct PoolDf {
    #[serde(default)]
    pub pools: Vec<PoolUsage>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct PoolUsage {
    pub name: String,
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub stats: PoolStats,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct PoolStats {
    #[serde(default)]
    pub stored: f64,
    #[serde(default)]
    pub stored_raw: f64,
    #[serde(default)]
    pub kb_used: f64,
    #[serde(default)]
    pub max_avail: f64,
    #[serde(default)]
    pub percent_used: f64,
    #[serde(default)]
    pub objects: f64,
    #[serde(default)]
    pub dirty: f64,
    #[serde(default)]
    pub rd: f64,
    #[serde(default)]
    pub rd_bytes: f64,
    #[serde(default)]
    pub wr: f64,
    #[serde(default)]
    pub wr_bytes: f64,
    #[serde(default)]
    pub quota_bytes: f64,
    #[serde(default)]
    pub quota_objects: f64,
}

/// One entry of `radosgw-admin gc list --include-all`
#[derive(Debug, Deserialize, Clone, Default)]
pub struct GcTask {
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub objs: Vec<GcObject>,
}

impl GcTask {
    /// Moment the task becomes eligible for processing
    ///
    /// The timestamp looks like `1975-01-01 16:31:09.0.564455s`; everything from the first
    /// `.` on is ignored. Returns `None` when the remainder is not a valid UTC timestamp.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let seconds = self.time.split('.').next()?;
        NaiveDateTime::parse_from_str(seconds.trim(), "%Y-%m-%d %H:%M:%S")
            .ok()
            .map(|t| t.and_utc())
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct GcObject {
    #[serde(default)]
    pub pool: String,
    #[serde(default)]
    pub oid: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub instance: String,
}

/// One entry of `radosgw-admin reshard list`
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ReshardEntry {
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub tenant: String,
    #[serde(default)]
    pub bucket_name: String,
    #[serde(default)]
    pub bucket_id: String,
    #[serde(default)]
    pub new_instance_id: String,
    #[serde(default)]
    pub old_num_shards: u64,
    #[serde(default)]
    pub new_num_shards: u64,
}

/// Output of `rbd mirror pool status`
#[derive(Debug, Deserialize, Clone, Default)]
pub struct MirrorPoolStatus {
    #[serde(default)]
    pub summary: MirrorSummary,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct MirrorSummary {
    #[serde(default)]
    pub health: String,
    #[serde(default)]
    pub daemon_health: String,
    #[serde(default)]
    pub image_health: String,
    #[serde(default)]
    pub states: HashMap<String, u64>,
}
