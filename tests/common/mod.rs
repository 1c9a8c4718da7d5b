//! Shared test helpers
//!
//! An in-memory [`ClusterGateway`] that answers queries from canned payloads keyed by the
//! rendered command line (`ceph df detail --format json`), plus a collector with canned
//! samples for pipeline and exporter tests.

#![allow(dead_code)]

use async_trait::async_trait;
use ceph_exporter::ceph::{ClusterGateway, Query, QueryRunner};
use ceph_exporter::collectors::Collector;
use ceph_exporter::error::{ExporterError, Result};
use ceph_exporter::metrics::{MetricDesc, MetricSample};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const PACIFIC_VERSION: &str = r#"{"version":"ceph version 16.2.11-22-wasd (1984a8c33225d70559cdf27dbab81e3ce153f6ac) pacific (stable)"}"#;
pub const LUMINOUS_VERSION: &str = r#"{"version":"ceph version 12.2.13 (584a20eb0237c657dc0567da126be145106aa47e) luminous (stable)"}"#;

enum Reply {
    Payload(Vec<u8>),
    Fail(String),
    Hang,
}

/// Gateway serving canned replies; unknown queries fail
#[derive(Default)]
pub struct MockGateway {
    replies: Mutex<HashMap<String, Reply>>,
    fail_once: Mutex<HashMap<String, String>>,
    calls: Mutex<Vec<String>>,
    count: AtomicUsize,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `query` with `payload`
    pub fn reply(self, query: &str, payload: &str) -> Self {
        self.set(query, Reply::Payload(payload.as_bytes().to_vec()));
        self
    }

    /// Fail `query` with `reason`
    pub fn fail(self, query: &str, reason: &str) -> Self {
        self.set(query, Reply::Fail(reason.to_string()));
        self
    }

    /// Fail the first call to `query` with `reason`, then answer as configured
    pub fn fail_once(self, query: &str, reason: &str) -> Self {
        self.fail_once
            .lock()
            .unwrap()
            .insert(query.to_string(), reason.to_string());
        self
    }

    /// Never answer `query`
    pub fn hang(self, query: &str) -> Self {
        self.set(query, Reply::Hang);
        self
    }

    /// Answer `ceph version` with a pacific release
    pub fn pacific(self) -> Self {
        self.reply("ceph version --format json", PACIFIC_VERSION)
    }

    fn set(&self, query: &str, reply: Reply) {
        self.replies
            .lock()
            .unwrap()
            .insert(query.to_string(), reply);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, query: &str) -> usize {
        self.calls().iter().filter(|q| *q == query).count()
    }

    pub fn call_count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClusterGateway for MockGateway {
    async fn run_query(&self, query: &Query) -> Result<Vec<u8>> {
        let key = query.to_string();
        self.calls.lock().unwrap().push(key.clone());
        self.count.fetch_add(1, Ordering::SeqCst);

        if let Some(reason) = self.fail_once.lock().unwrap().remove(&key) {
            return Err(ExporterError::Query { query: key, reason });
        }

        let reply = match self.replies.lock().unwrap().get(&key) {
            Some(Reply::Payload(data)) => Some(Ok(data.clone())),
            Some(Reply::Fail(reason)) => Some(Err(reason.clone())),
            Some(Reply::Hang) => None,
            None => Some(Err(format!("no canned reply for `{}`", key))),
        };

        match reply {
            Some(Ok(data)) => Ok(data),
            Some(Err(reason)) => Err(ExporterError::Query { query: key, reason }),
            None => std::future::pending::<Result<Vec<u8>>>().await,
        }
    }
}

/// Runner over `gateway` with a short deadline
pub fn runner(gateway: Arc<MockGateway>) -> QueryRunner {
    QueryRunner::new(gateway, Duration::from_secs(5))
}

pub const TEST_VALUE: MetricDesc = MetricDesc::gauge("test_value", "Test value", &["id"]);

/// Collector that returns `count` samples per pass, or fails, or stalls
pub struct StaticCollector {
    name: &'static str,
    count: usize,
    fail: bool,
    delay: Option<Duration>,
    passes: AtomicUsize,
}

impl StaticCollector {
    pub fn new(name: &'static str, count: usize) -> Self {
        Self {
            name,
            count,
            fail: false,
            delay: None,
            passes: AtomicUsize::new(0),
        }
    }

    pub fn failing(name: &'static str) -> Self {
        Self {
            fail: true,
            ..Self::new(name, 0)
        }
    }

    pub fn slow(name: &'static str, count: usize, delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new(name, count)
        }
    }

    pub fn passes(&self) -> usize {
        self.passes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Collector for StaticCollector {
    fn name(&self) -> &'static str {
        self.name
    }

    fn describe(&self) -> Vec<MetricDesc> {
        vec![TEST_VALUE]
    }

    async fn collect(&self) -> Result<Vec<MetricSample>> {
        let pass = self.passes.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(ExporterError::Parse(format!("{} always fails", self.name)));
        }
        Ok((0..self.count)
            .map(|i| TEST_VALUE.sample(pass as f64, &[format!("{}-{}", self.name, i).as_str()]))
            .collect())
    }
}
