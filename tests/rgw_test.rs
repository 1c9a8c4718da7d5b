//! RADOS gateway collector tests

mod common;

use ceph_exporter::ceph::types::{GcTask, ReshardEntry};
use ceph_exporter::collectors::rgw::{gc_samples, reshard_samples};
use ceph_exporter::collectors::{Collector, RgwCollector};
use ceph_exporter::metrics::MetricSample;
use chrono::{TimeZone, Utc};
use common::{runner, MockGateway};
use std::sync::Arc;

const GC_LIST: &str = r#"[
    {"tag": "a", "time": "1975-01-01 16:31:09.0.564455s", "objs": [{"oid": "1"}, {"oid": "2"}]},
    {"tag": "b", "time": "1975-01-01 17:31:09.0.564455s", "objs": [{"oid": "3"}, {"oid": "4"}]},
    {"tag": "c", "time": "3075-01-01 11:30:09.0.123456s", "objs": [{"oid": "5"}, {"oid": "6"}, {"oid": "7"}]}
]"#;

const RESHARD_LIST: &str = r#"[
    {"bucket_name": "photos", "old_num_shards": 11, "new_num_shards": 23},
    {"bucket_name": "logs", "old_num_shards": 1, "new_num_shards": 7}
]"#;

fn value(samples: &[MetricSample], name: &str) -> Option<f64> {
    samples.iter().find(|s| s.name == name).map(|s| s.value)
}

#[test]
fn test_gc_tasks_split_by_expiry() {
    // Given: Two expired tasks and one in the far future
    let tasks: Vec<GcTask> = serde_json::from_str(GC_LIST).unwrap();
    let now = Utc.with_ymd_and_hms(2024, 2, 13, 0, 0, 0).unwrap();

    // When: Mapping to samples
    let samples = gc_samples(&tasks, now);

    // Then: Expired tasks are active, the rest pending
    assert_eq!(value(&samples, "rgw_gc_active_tasks"), Some(2.0));
    assert_eq!(value(&samples, "rgw_gc_active_objects"), Some(4.0));
    assert_eq!(value(&samples, "rgw_gc_pending_tasks"), Some(1.0));
    assert_eq!(value(&samples, "rgw_gc_pending_objects"), Some(3.0));
}

#[test]
fn test_unparseable_gc_time_counts_as_pending() {
    let tasks = vec![GcTask {
        time: "soon".to_string(),
        ..GcTask::default()
    }];

    let samples = gc_samples(&tasks, Utc::now());

    assert_eq!(value(&samples, "rgw_gc_active_tasks"), Some(0.0));
    assert_eq!(value(&samples, "rgw_gc_pending_tasks"), Some(1.0));
}

#[test]
fn test_reshard_queue_is_reported_per_bucket() {
    let entries: Vec<ReshardEntry> = serde_json::from_str(RESHARD_LIST).unwrap();

    let samples = reshard_samples(&entries);

    assert_eq!(value(&samples, "rgw_active_reshards"), Some(2.0));
    let buckets: Vec<&str> = samples
        .iter()
        .filter(|s| s.name == "rgw_bucket_reshard")
        .filter_map(|s| s.label("bucket"))
        .collect();
    assert_eq!(buckets, vec!["photos", "logs"]);
}

#[tokio::test]
async fn test_collect_reports_gc_and_reshards() {
    let gateway = Arc::new(
        MockGateway::new()
            .reply("radosgw-admin gc list --include-all", GC_LIST)
            .reply("radosgw-admin reshard list", RESHARD_LIST),
    );
    let collector = RgwCollector::new(runner(gateway));

    let samples = collector.collect().await.expect("collect should succeed");

    assert_eq!(value(&samples, "rgw_gc_active_tasks"), Some(2.0));
    assert_eq!(value(&samples, "rgw_active_reshards"), Some(2.0));
}

#[tokio::test]
async fn test_reshard_failure_keeps_gc_samples() {
    // Given: The reshard listing fails
    let gateway = Arc::new(
        MockGateway::new()
            .reply("radosgw-admin gc list --include-all", GC_LIST)
            .fail("radosgw-admin reshard list", "permission denied"),
    );
    let collector = RgwCollector::new(runner(gateway));

    // When: Collecting
    let samples = collector.collect().await.expect("collect should succeed");

    // Then: GC metrics survive
    assert_eq!(value(&samples, "rgw_gc_pending_objects"), Some(3.0));
    assert_eq!(value(&samples, "rgw_active_reshards"), None);
}

#[tokio::test]
async fn test_both_queries_failing_fails_the_pass() {
    let gateway = Arc::new(MockGateway::new());
    let collector = RgwCollector::new(runner(gateway));

    assert!(collector.collect().await.is_err());
}
