//! Collection Pipeline
//!
//! A collector runs in one of two modes:
//!
//! - **Synchronous**: every scrape runs the full query → decode → emit pass inline.
//! - **Background**: a long-lived task runs the pass on its own interval and pushes samples
//!   into a bounded [`SampleBuffer`]. Scrapes drain the buffer without waiting.
//!
//! # Backpressure
//!
//! When the buffer is full the newest sample is dropped. The poller never blocks on a slow
//! scraper and the buffer never grows past its capacity.
//!
//! The buffer also carries the outcome of the poller's most recent finished cycle, so a scrape
//! can report a background collector as failed even though draining itself cannot fail.

use crate::ceph::{VersionGate, VersionResolver};
use crate::collectors::Collector;
use crate::error::{ExporterError, Result};
use crate::metrics::MetricSample;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TryRecvError, error::TrySendError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionMode {
    Synchronous,
    Background,
}

/// Bounded queue between a background poller and the scrape path
///
/// Single writer, any number of drainers. Each sample is handed to exactly one drain.
pub struct SampleBuffer {
    tx: mpsc::Sender<MetricSample>,
    rx: Mutex<mpsc::Receiver<MetricSample>>,
    last_error: Mutex<Option<String>>,
}

impl SampleBuffer {
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        Self {
            tx,
            rx: Mutex::new(rx),
            last_error: Mutex::new(None),
        }
    }

    pub fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }

    /// Number of samples currently buffered
    pub fn len(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Buffer a sample; returns `false` when it was dropped because the buffer is full
    pub fn push(&self, sample: MetricSample) -> bool {
        match self.tx.try_send(sample) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Closed(_)) => false,
        }
    }

    /// Remove and return everything buffered right now
    pub fn drain(&self) -> Vec<MetricSample> {
        let mut rx = self.rx.lock().unwrap_or_else(|p| p.into_inner());
        let mut samples = Vec::with_capacity(self.len());
        loop {
            match rx.try_recv() {
                Ok(sample) => samples.push(sample),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        samples
    }

    /// Record how the latest background cycle ended; `None` means it succeeded
    pub fn record_cycle(&self, error: Option<String>) {
        *self.last_error.lock().unwrap_or_else(|p| p.into_inner()) = error;
    }

    /// Error of the latest finished cycle, if it failed
    pub fn last_cycle_error(&self) -> Option<String> {
        self.last_error
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }
}

/// A registered collector together with its gate, mode and buffer
pub struct ScheduledCollector {
    collector: Arc<dyn Collector>,
    gate: VersionGate,
    buffer: Option<Arc<SampleBuffer>>,
}

impl ScheduledCollector {
    pub fn synchronous(collector: Arc<dyn Collector>, gate: VersionGate) -> Self {
        Self {
            collector,
            gate,
            buffer: None,
        }
    }

    pub fn background(collector: Arc<dyn Collector>, gate: VersionGate, capacity: usize) -> Self {
        Self {
            collector,
            gate,
            buffer: Some(Arc::new(SampleBuffer::new(capacity))),
        }
    }

    pub fn name(&self) -> &'static str {
        self.collector.name()
    }

    pub fn gate(&self) -> &VersionGate {
        &self.gate
    }

    pub fn collector(&self) -> &Arc<dyn Collector> {
        &self.collector
    }

    pub fn mode(&self) -> CollectionMode {
        if self.buffer.is_some() {
            CollectionMode::Background
        } else {
            CollectionMode::Synchronous
        }
    }

    pub fn buffer(&self) -> Option<&Arc<SampleBuffer>> {
        self.buffer.as_ref()
    }

    /// Samples for the current scrape
    ///
    /// Synchronous collectors run now; background collectors hand over their buffer. A
    /// background collector whose latest cycle failed reports that failure and keeps its
    /// buffered samples for a later scrape.
    pub async fn samples(&self) -> Result<Vec<MetricSample>> {
        match &self.buffer {
            Some(buffer) => match buffer.last_cycle_error() {
                Some(reason) => Err(ExporterError::Collection {
                    collector: self.name().to_string(),
                    reason,
                }),
                None => Ok(buffer.drain()),
            },
            None => self.collector.collect().await,
        }
    }

    /// Start the polling task of a background collector
    ///
    /// Returns `None` for synchronous collectors.
    pub fn spawn_poller(
        &self,
        resolver: VersionResolver,
        interval: Duration,
        token: CancellationToken,
    ) -> Option<JoinHandle<()>> {
        let buffer = self.buffer.clone()?;
        let poller = Poller {
            collector: self.collector.clone(),
            gate: self.gate.clone(),
            buffer,
            resolver,
        };
        Some(tokio::spawn(poller.run(interval, token)))
    }
}

struct Poller {
    collector: Arc<dyn Collector>,
    gate: VersionGate,
    buffer: Arc<SampleBuffer>,
    resolver: VersionResolver,
}

impl Poller {
    async fn run(self, interval: Duration, token: CancellationToken) {
        let name = self.collector.name();
        debug!(collector = name, "background collection started");

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = self.cycle() => {}
            }

            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }
        }

        debug!(collector = name, "background collection stopped");
    }

    async fn cycle(&self) {
        let name = self.collector.name();

        if self.gate.is_versioned() {
            let version = match self.resolver.resolve().await {
                Ok(version) => Some(version),
                Err(e) => {
                    warn!(collector = name, error = %e, "skipping background cycle");
                    None
                }
            };
            if !self.gate.admits(version.as_ref()) {
                debug!(collector = name, "cluster version outside collector bounds");
                return;
            }
        }

        debug!(collector = name, background = true, "collecting");
        match self.collector.collect().await {
            Ok(samples) => {
                self.buffer.record_cycle(None);
                let total = samples.len();
                let mut dropped = 0;
                for sample in samples {
                    if !self.buffer.push(sample) {
                        dropped += 1;
                    }
                }
                if dropped > 0 {
                    warn!(collector = name, dropped, total, "sample buffer full, dropped newest samples");
                } else {
                    debug!(collector = name, total, "buffered samples");
                }
            }
            Err(e) => {
                error!(collector = name, background = true, error = %e, "error collecting stats");
                self.buffer.record_cycle(Some(e.to_string()));
            }
        }
    }
}
