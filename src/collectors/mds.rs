//! MDS Metrics Collector
//!
//! Collects metadata-server daemon states and aggregates the requests the MDS daemons report
//! as slow or blocked.
//!
//! # Metrics Produced
//! - `ceph_mds_daemon_state` - MDS daemon state (value is always 1)
//!   - Labels: fs, name, rank, state
//! - `ceph_mds_blocked_ops` - Blocked ops per distinct label set
//!   - Labels: fs, name, state, optype, fs_optype, flag_point, inode
//!
//! # Slow Op Aggregation
//!
//! 1. `ceph health detail` is checked for `MDS_SLOW_REQUEST`. No check, no samples.
//! 2. Each detail message (`mds.a(mds.0): 3 slow requests are blocked > 30 secs`) names a
//!    daemon before the `(`.
//! 3. Every named daemon is asked for its `status` and `dump_blocked_ops`, concurrently.
//! 4. `client_request` descriptions are parsed for the filesystem op and the inode.
//! 5. Records are counted per [`SlowOpKey`] and one counter sample is emitted per key.
//!
//! Malformed messages, unreachable daemons and unparseable descriptions are logged and
//! skipped; they never hide the rest of the batch.

use super::{collect_with_handler, Collector};
use crate::ceph::types::{BlockedOps, DaemonStatus, HealthDetail, MdsStat};
use crate::ceph::{Query, QueryRunner};
use crate::error::{ExporterError, Result};
use crate::metrics::{MetricDesc, MetricSample};
use async_trait::async_trait;
use futures_util::stream::{FuturesUnordered, StreamExt};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{LazyLock, Mutex};
use tracing::{debug, warn};

/// Health check raised while MDS daemons have slow or blocked requests
pub const SLOW_REQUEST_CHECK: &str = "MDS_SLOW_REQUEST";

const CLIENT_REQUEST: &str = "client_request";

static DESCRIPTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"client_request\(client\.(?P<clientid>[0-9].+?):(?P<cid>[0-9].+?)\s(?P<fsoptype>\w+)\s.*#(?P<inode>0x[0-9a-fA-F]+|[0-9]+)[^a-zA-Z\d:].*",
    )
    .expect("valid op description regex")
});

pub const MDS_DAEMON_STATE: MetricDesc = MetricDesc::gauge(
    "mds_daemon_state",
    "MDS Daemon State",
    &["fs", "name", "rank", "state"],
);

pub const MDS_BLOCKED_OPS: MetricDesc = MetricDesc::counter(
    "mds_blocked_ops",
    "MDS Blocked Ops",
    &["fs", "name", "state", "optype", "fs_optype", "flag_point", "inode"],
);

/// Fields extracted from a `client_request(...)` op description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpDescription {
    pub client_id: String,
    pub fs_op_type: String,
    pub inode: String,
}

/// Parse a blocked op description such as
///
/// ```text
/// client_request(client.20001974182:344151 rmdir #0x10000000030/72a26231 2024-02-13T22:11:00.196767+0000 caller_uid=0, caller_gid=0{})
/// ```
///
/// into its client id (`20001974182`), filesystem op (`rmdir`) and inode (`0x10000000030`).
pub fn parse_op_description(description: &str) -> Result<OpDescription> {
    let invalid =
        || ExporterError::Parse(format!("invalid op description, unable to parse {:?}", description));

    let caps = DESCRIPTION_RE.captures(description).ok_or_else(invalid)?;
    let group = |name: &str| {
        caps.name(name)
            .map(|m| m.as_str().to_string())
            .ok_or_else(invalid)
    };

    Ok(OpDescription {
        client_id: group("clientid")?,
        fs_op_type: group("fsoptype")?,
        inode: group("inode")?,
    })
}

/// Daemon name from a slow request detail message
///
/// The message must contain exactly one `(`; the daemon is the text before it.
pub fn daemon_from_message(message: &str) -> Result<String> {
    let parts: Vec<&str> = message.split('(').collect();
    if parts.len() != 2 {
        return Err(ExporterError::Parse(format!(
            "incorrect part count in slow request message {:?}",
            message
        )));
    }

    let name = parts[0].trim();
    if name.is_empty() {
        return Err(ExporterError::Parse(format!(
            "no daemon name in slow request message {:?}",
            message
        )));
    }
    Ok(name.to_string())
}

/// Label set identifying one `mds_blocked_ops` series
///
/// Field order matches the label order of [`MDS_BLOCKED_OPS`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SlowOpKey {
    pub fs: String,
    pub daemon: String,
    pub state: String,
    pub op_type: String,
    pub fs_op_type: String,
    pub flag_point: String,
    pub inode: String,
}

impl SlowOpKey {
    fn label_values(&self) -> [&str; 7] {
        [
            self.fs.as_str(),
            self.daemon.as_str(),
            self.state.as_str(),
            self.op_type.as_str(),
            self.fs_op_type.as_str(),
            self.flag_point.as_str(),
            self.inode.as_str(),
        ]
    }
}

/// Per-pass counter map shared by the concurrent per-daemon lookups
#[derive(Debug, Default)]
pub struct SlowOpTally {
    counts: Mutex<BTreeMap<SlowOpKey, u64>>,
}

impl SlowOpTally {
    /// Count one blocked op under `key`
    ///
    /// # Arguments
    ///
    /// * `key` - Full label set of the op; equal keys share a counter
    ///
    /// Safe to call from concurrent per-daemon lookups.
    pub fn record(&self, key: SlowOpKey) {
        let mut counts = self.counts.lock().unwrap_or_else(|p| p.into_inner());
        *counts.entry(key).or_insert(0) += 1;
    }

    /// Number of distinct keys seen so far
    pub fn len(&self) -> usize {
        self.counts.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// One counter sample per distinct key, valued with its count
    pub fn into_samples(self) -> Vec<MetricSample> {
        let counts = self.counts.into_inner().unwrap_or_else(|p| p.into_inner());
        counts
            .iter()
            .map(|(key, count)| MDS_BLOCKED_OPS.sample(*count as f64, &key.label_values()))
            .collect()
    }
}

/// Count the blocked ops of one daemon into `tally`
///
/// Returns the number of records counted; records with an unparseable description are
/// skipped.
pub fn tally_blocked_ops(
    tally: &SlowOpTally,
    daemon: &str,
    status: &DaemonStatus,
    ops: &BlockedOps,
) -> usize {
    let mut counted = 0;
    for op in &ops.ops {
        let (fs_op_type, inode) = if op.type_data.op_type == CLIENT_REQUEST {
            match parse_op_description(&op.description) {
                Ok(desc) => (desc.fs_op_type, desc.inode),
                Err(e) => {
                    warn!(mds = daemon, error = %e, "failed parsing blocked op description");
                    continue;
                }
            }
        } else {
            (String::new(), String::new())
        };

        tally.record(SlowOpKey {
            fs: status.fs_name.clone(),
            daemon: daemon.to_string(),
            state: status.state.clone(),
            op_type: op.type_data.op_type.clone(),
            fs_op_type,
            flag_point: op.type_data.flag_point.clone(),
            inode,
        });
        counted += 1;
    }
    counted
}

/// Daemons named by the slow request check, in name order and without duplicates
pub fn slow_request_daemons(health: &HealthDetail) -> Option<BTreeSet<String>> {
    let check = health.checks.get(SLOW_REQUEST_CHECK)?;
    let daemons = check
        .detail
        .iter()
        .filter_map(|detail| match daemon_from_message(&detail.message) {
            Ok(name) => Some(name),
            Err(e) => {
                warn!(message = %detail.message, error = %e, "invalid mds slow request message found, check syntax");
                None
            }
        })
        .collect();
    Some(daemons)
}

/// Maps a decoded `ceph mds stat` payload to daemon state samples
///
/// # Arguments
///
/// * `stat` - FS map as reported by `ceph mds stat`
///
/// # Returns
///
/// One `mds_daemon_state` sample (value 1) per MDS daemon of every filesystem, labelled with
/// the filesystem, daemon name, rank and state.
pub fn daemon_state_samples(stat: &MdsStat) -> Vec<MetricSample> {
    let mut samples = Vec::new();
    for fs in &stat.fsmap.filesystems {
        for info in fs.mdsmap.info.values() {
            samples.push(MDS_DAEMON_STATE.sample(
                1.0,
                &[
                    fs.mdsmap.fs_name.as_str(),
                    info.name.as_str(),
                    info.rank.to_string().as_str(),
                    info.state.as_str(),
                ],
            ));
        }
    }
    samples
}

pub struct MdsCollector {
    runner: QueryRunner,
}

impl MdsCollector {
    pub fn new(runner: QueryRunner) -> Self {
        Self { runner }
    }

    async fn tally_daemon(&self, daemon: &str, tally: &SlowOpTally) -> Result<usize> {
        let status: DaemonStatus = self
            .runner
            .json(&Query::ceph(&["tell", daemon, "status"]))
            .await?;
        let ops: BlockedOps = self
            .runner
            .json(&Query::ceph(&["tell", daemon, "dump_blocked_ops"]))
            .await?;
        Ok(tally_blocked_ops(tally, daemon, &status, &ops))
    }

    async fn slow_op_samples(&self) -> Result<Vec<MetricSample>> {
        let health: HealthDetail = self
            .runner
            .json(&Query::ceph(&["health", "detail", "--format", "json"]))
            .await?;

        let Some(daemons) = slow_request_daemons(&health) else {
            debug!("no slow mds requests reported");
            return Ok(Vec::new());
        };

        let tally = SlowOpTally::default();
        {
            let mut pending: FuturesUnordered<_> = daemons
                .iter()
                .map(|daemon| {
                    let tally = &tally;
                    async move { (daemon, self.tally_daemon(daemon, tally).await) }
                })
                .collect();

            while let Some((daemon, result)) = pending.next().await {
                match result {
                    Ok(counted) => debug!(mds = %daemon, counted, "counted blocked ops"),
                    Err(e) => warn!(mds = %daemon, error = %e, "failed getting blocked ops from mds"),
                }
            }
        }

        Ok(tally.into_samples())
    }
}

#[async_trait]
impl Collector for MdsCollector {
    fn name(&self) -> &'static str {
        "mds"
    }

    fn describe(&self) -> Vec<MetricDesc> {
        vec![MDS_DAEMON_STATE, MDS_BLOCKED_OPS]
    }

    async fn collect(&self) -> Result<Vec<MetricSample>> {
        let stat: MdsStat = self
            .runner
            .json(&Query::ceph(&["mds", "stat", "--format", "json"]))
            .await?;

        let mut samples = daemon_state_samples(&stat);
        samples.extend(
            collect_with_handler("mds slow ops", self.slow_op_samples(), |samples| samples).await,
        );
        Ok(samples)
    }
}
