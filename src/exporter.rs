//! Collector Registry and Scrape Coordination
//!
//! The [`Exporter`] owns the fixed set of collectors built at startup. For every scrape it:
//! 1. Resolves the cluster version
//! 2. Skips collectors whose [`VersionGate`](crate::ceph::VersionGate) rejects that version
//! 3. Runs the remaining collectors concurrently (or drains their background buffers)
//! 4. Merges all samples, adding its own `up`/success/duration samples
//!
//! # Error Handling
//!
//! A failing collector is logged and contributes nothing; the others are unaffected. If the
//! version cannot be resolved only version-gated collectors are skipped. Collectors still
//! running when the scrape deadline passes are abandoned and the samples merged so far are
//! returned.

use crate::ceph::{ClusterGateway, QueryRunner, VersionResolver};
use crate::collectors::{CollectionStatus, CollectorKind};
use crate::config::{CollectorsConfig, Config};
use crate::error::{ExporterError, Result};
use crate::metrics::{self, MetricDesc, MetricSample};
use crate::pipeline::{CollectionMode, ScheduledCollector};
use futures_util::stream::{FuturesUnordered, StreamExt};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub const UP: MetricDesc = MetricDesc::gauge(
    "up",
    "Whether the Ceph cluster version could be resolved (1=up, 0=down)",
    &[],
);

pub const COLLECTOR_SUCCESS: MetricDesc = MetricDesc::gauge(
    "exporter_collector_success",
    "Whether the collector contributed to the last scrape (1=success, 0=failed)",
    &["collector"],
);

pub const COLLECTOR_DURATION: MetricDesc = MetricDesc::gauge(
    "exporter_collector_duration_seconds",
    "Time the collector took during the last scrape (buffer drain only for background collectors)",
    &["collector"],
);

pub struct Exporter {
    collectors: Vec<ScheduledCollector>,
    resolver: VersionResolver,
    scrape_timeout: Duration,
    const_labels: HashMap<String, String>,
    up: AtomicBool,
    token: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Exporter {
    /// Build every enabled collector and start the background pollers
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(gateway: Arc<dyn ClusterGateway>, config: &Config) -> Result<Self> {
        let settings = &config.collectors;
        let runner = QueryRunner::new(gateway, settings.query_timeout());

        let mut collectors = Vec::with_capacity(settings.enabled.len());
        for name in &settings.enabled {
            let kind = CollectorKind::from_name(name)
                .ok_or_else(|| ExporterError::Config(format!("unknown collector `{}`", name)))?;
            if collectors
                .iter()
                .any(|c: &ScheduledCollector| c.name() == kind.name())
            {
                continue;
            }

            let collector = kind.build(runner.clone());
            let scheduled = if settings.is_background(name) {
                ScheduledCollector::background(collector, kind.gate(), settings.buffer_capacity)
            } else {
                ScheduledCollector::synchronous(collector, kind.gate())
            };
            collectors.push(scheduled);
        }

        for name in &settings.background {
            if !settings.is_enabled(name) {
                warn!(collector = %name, "background mode requested for a collector that is not enabled");
            }
        }

        Ok(Self::with_collectors(
            VersionResolver::new(runner),
            collectors,
            settings,
            &config.ceph.cluster,
        ))
    }

    /// Assemble an exporter from already built collectors
    pub fn with_collectors(
        resolver: VersionResolver,
        collectors: Vec<ScheduledCollector>,
        settings: &CollectorsConfig,
        cluster: &str,
    ) -> Self {
        let token = CancellationToken::new();
        let tasks = collectors
            .iter()
            .filter_map(|c| {
                c.spawn_poller(
                    resolver.clone(),
                    settings.background_interval(),
                    token.child_token(),
                )
            })
            .collect();

        for c in &collectors {
            info!(collector = c.name(), mode = ?c.mode(), "registered collector");
        }

        Self {
            collectors,
            resolver,
            scrape_timeout: settings.scrape_timeout(),
            const_labels: HashMap::from([("cluster".to_string(), cluster.to_string())]),
            up: AtomicBool::new(false),
            token,
            tasks: Mutex::new(tasks),
        }
    }

    pub fn collector_names(&self) -> Vec<&'static str> {
        self.collectors.iter().map(|c| c.name()).collect()
    }

    pub fn mode_of(&self, name: &str) -> Option<CollectionMode> {
        self.collectors
            .iter()
            .find(|c| c.name() == name)
            .map(|c| c.mode())
    }

    /// Whether the most recent version resolution succeeded; backs `/health`
    pub fn is_up(&self) -> bool {
        self.up.load(Ordering::Relaxed)
    }

    /// Metric families of every registered collector plus the exporter's own; no I/O
    pub fn describe(&self) -> Vec<MetricDesc> {
        let mut descs = vec![UP, COLLECTOR_SUCCESS, COLLECTOR_DURATION];
        for c in &self.collectors {
            descs.extend(c.collector().describe());
        }
        descs
    }

    /// Run one scrape and return every sample that could be produced
    pub async fn collect(&self) -> Vec<MetricSample> {
        let version = match self.resolver.resolve().await {
            Ok(version) => {
                self.up.store(true, Ordering::Relaxed);
                Some(version)
            }
            Err(e) => {
                warn!(error = %e, "failed to resolve cluster version, running unversioned collectors only");
                self.up.store(false, Ordering::Relaxed);
                None
            }
        };

        let mut pending: FuturesUnordered<_> = self
            .collectors
            .iter()
            .filter(|c| {
                let admitted = c.gate().admits(version.as_ref());
                if !admitted {
                    debug!(collector = c.name(), "skipping collector for this cluster version");
                }
                admitted
            })
            .map(|c| async move {
                let started = Instant::now();
                let result = c.samples().await;
                (c.name(), result, started.elapsed())
            })
            .collect();

        let deadline = tokio::time::Instant::now() + self.scrape_timeout;
        let mut samples = Vec::new();
        loop {
            let next = tokio::time::timeout_at(deadline, pending.next()).await;
            match next {
                Ok(Some((name, result, elapsed))) => {
                    let status = match result {
                        Ok(collected) => {
                            debug!(collector = name, count = collected.len(), "collected samples");
                            samples.extend(collected);
                            CollectionStatus::Success
                        }
                        Err(e) => {
                            warn!(collector = name, error = %e, "collector failed");
                            CollectionStatus::Failed
                        }
                    };
                    samples.push(COLLECTOR_SUCCESS.sample(status.as_value(), &[name]));
                    samples.push(COLLECTOR_DURATION.sample(elapsed.as_secs_f64(), &[name]));
                }
                Ok(None) => break,
                Err(_) => {
                    warn!(
                        unfinished = pending.len(),
                        "scrape deadline reached, returning partial results"
                    );
                    break;
                }
            }
        }

        let up = if version.is_some() { 1.0 } else { 0.0 };
        samples.push(UP.sample(up, &[]));
        samples
    }

    /// Run one scrape and render it in the Prometheus text format
    pub async fn render(&self) -> anyhow::Result<String> {
        let samples = self.collect().await;
        metrics::render(&self.describe(), samples, &self.const_labels)
    }

    /// Stop every background poller and wait for it to exit
    pub async fn shutdown(&self) {
        self.token.cancel();
        let tasks = std::mem::take(&mut *self.tasks.lock().await);
        for task in tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "background collector task ended abnormally");
            }
        }
        info!("all background collectors stopped");
    }
}

impl Drop for Exporter {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
