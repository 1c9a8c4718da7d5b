//! Payload decoding tests
//!
//! Tests that the serde types accept real `ceph` output and tolerate missing fields.

use ceph_exporter::ceph::types::{
    BlockedOps, DaemonStatus, GcTask, HealthDetail, MdsStat, MirrorPoolStatus, PoolDf,
    ReshardEntry,
};
use chrono::{TimeZone, Utc};

#[test]
fn test_health_detail_deserialization() {
    // Given: A health report with a slow request check
    let json = r#"{
        "status": "HEALTH_WARN",
        "checks": {
            "MDS_SLOW_REQUEST": {
                "severity": "HEALTH_WARN",
                "summary": {"message": "1 MDSs report slow requests", "count": 1},
                "detail": [{"message": "mds.a(mds.0): 5 slow requests are blocked > 30 secs"}],
                "muted": false
            }
        },
        "mutes": []
    }"#;

    // When: Decoding
    let health: HealthDetail = serde_json::from_str(json).expect("Failed to parse health");

    // Then: The check and its messages are available
    let check = &health.checks["MDS_SLOW_REQUEST"];
    assert_eq!(health.status, "HEALTH_WARN");
    assert_eq!(check.summary.count, 1);
    assert_eq!(check.detail.len(), 1);
    assert!(check.detail[0].message.starts_with("mds.a("));
}

#[test]
fn test_health_detail_without_checks() {
    let health: HealthDetail =
        serde_json::from_str(r#"{"status":"HEALTH_OK"}"#).expect("Failed to parse health");

    assert!(health.checks.is_empty());
}

#[test]
fn test_mds_stat_deserialization() {
    let json = r#"{
        "fsmap": {
            "epoch": 12,
            "filesystems": [{
                "mdsmap": {
                    "fs_name": "cephfs",
                    "info": {
                        "gid_4242": {"gid": 4242, "name": "a", "rank": 0, "state": "up:active"},
                        "gid_4343": {"gid": 4343, "name": "b", "rank": -1, "state": "up:standby-replay"}
                    }
                }
            }]
        }
    }"#;

    let stat: MdsStat = serde_json::from_str(json).expect("Failed to parse mds stat");

    let mdsmap = &stat.fsmap.filesystems[0].mdsmap;
    assert_eq!(mdsmap.fs_name, "cephfs");
    assert_eq!(mdsmap.info.len(), 2);
    assert_eq!(mdsmap.info["gid_4343"].rank, -1);
}

#[test]
fn test_daemon_status_and_blocked_ops_deserialization() {
    let status: DaemonStatus = serde_json::from_str(
        r#"{"cluster_fsid":"f00","whoami":0,"id":4242,"want_state":"up:active","state":"up:active","fs_name":"cephfs","rank_uptime":12.5,"uptime":40.0}"#,
    )
    .expect("Failed to parse status");
    assert_eq!(status.fs_name, "cephfs");
    assert_eq!(status.state, "up:active");

    let ops: BlockedOps = serde_json::from_str(
        r#"{
            "ops": [{
                "description": "client_request(client.20001974182:344151 rmdir #0x10000000030/72a26231 2024-02-13T22:11:00.196767+0000 caller_uid=0, caller_gid=0{})",
                "initiated_at": "2024-02-13T22:11:00.196767+0000",
                "age": 3600.5,
                "duration": 3600.6,
                "type_data": {
                    "flag_point": "failed to authpin, subtree is being exported",
                    "reqid": "client.20001974182:344151",
                    "op_type": "client_request",
                    "client_info": {"client": "client.20001974182", "tid": 344151},
                    "events": [{"time": "2024-02-13T22:11:00.196767+0000", "event": "initiated"}]
                }
            }],
            "complaint_time": 30.0,
            "num_blocked_ops": 1
        }"#,
    )
    .expect("Failed to parse blocked ops");
    assert_eq!(ops.num_blocked_ops, 1);
    assert_eq!(ops.ops[0].type_data.op_type, "client_request");
    assert_eq!(ops.ops[0].type_data.client_info.tid, 344151);
}

#[test]
fn test_pool_df_missing_stats_default_to_zero() {
    // Given: A pool entry that only reports its object count
    let df: PoolDf = serde_json::from_str(r#"{"pools":[{"name":"rbd","stats":{"objects":5}}]}"#)
        .expect("Failed to parse df");

    // Then: Missing numbers decode as zero
    let pool = &df.pools[0];
    assert_eq!(pool.name, "rbd");
    assert_eq!(pool.stats.objects, 5.0);
    assert_eq!(pool.stats.stored, 0.0);
    assert_eq!(pool.stats.max_avail, 0.0);
}

#[test]
fn test_pool_without_name_is_rejected() {
    let result = serde_json::from_str::<PoolDf>(r#"{"pools":[{"stats":{"objects":5}}]}"#);

    assert!(result.is_err());
}

#[test]
fn test_gc_task_expiry_parsing() {
    // Given: A GC entry with the radosgw-admin timestamp format
    let task: GcTask = serde_json::from_str(
        r#"{"tag":"t1","time":"1975-01-01 16:31:09.0.564455s","objs":[{"pool":"default.rgw.buckets.data","oid":"o1","key":"","instance":""}]}"#,
    )
    .expect("Failed to parse gc task");

    // Then: Everything after the first dot is ignored
    let expected = Utc.with_ymd_and_hms(1975, 1, 1, 16, 31, 9).unwrap();
    assert_eq!(task.expires_at(), Some(expected));
    assert_eq!(task.objs.len(), 1);
}

#[test]
fn test_gc_task_unparseable_time() {
    let task = GcTask {
        time: "not a time".to_string(),
        ..GcTask::default()
    };

    assert_eq!(task.expires_at(), None);
}

#[test]
fn test_reshard_entry_deserialization() {
    let entries: Vec<ReshardEntry> = serde_json::from_str(
        r#"[{"time":"2024-02-13 22:11:00.000000Z","tenant":"","bucket_name":"photos","bucket_id":"abc.1","new_instance_id":"","old_num_shards":11,"new_num_shards":23}]"#,
    )
    .expect("Failed to parse reshard list");

    assert_eq!(entries[0].bucket_name, "photos");
    assert_eq!(entries[0].new_num_shards, 23);
}

#[test]
fn test_mirror_pool_status_deserialization() {
    let status: MirrorPoolStatus = serde_json::from_str(
        r#"{"summary":{"health":"WARNING","daemon_health":"OK","image_health":"WARNING","states":{"replaying":3,"unknown":1}}}"#,
    )
    .expect("Failed to parse mirror status");

    assert_eq!(status.summary.health, "WARNING");
    assert_eq!(status.summary.states["replaying"], 3);
}
