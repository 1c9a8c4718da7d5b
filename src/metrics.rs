//! Metric Samples and Exposition
//!
//! Collectors do not touch a long-lived Prometheus registry. They return plain
//! [`MetricSample`] values, and every scrape renders its merged samples through a fresh
//! registry built from the exporter's [`MetricDesc`] list.
//!
//! # Metric Types
//!
//! - **Gauge**: current value (e.g., pool bytes used, daemon state)
//! - **Counter**: accumulated count (e.g., blocked MDS ops per label set)
//!
//! All metrics use the `ceph_` namespace prefix and carry the cluster's constant labels.

use prometheus::{CounterVec, Encoder, GaugeVec, Opts, Registry, TextEncoder};
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

/// Namespace shared by every metric the exporter produces
pub const NAMESPACE: &str = "ceph";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Gauge,
    Counter,
}

/// Metadata for one metric family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricDesc {
    pub name: &'static str,
    pub help: &'static str,
    pub labels: &'static [&'static str],
    pub kind: MetricKind,
}

impl MetricDesc {
    pub const fn gauge(
        name: &'static str,
        help: &'static str,
        labels: &'static [&'static str],
    ) -> Self {
        Self {
            name,
            help,
            labels,
            kind: MetricKind::Gauge,
        }
    }

    pub const fn counter(
        name: &'static str,
        help: &'static str,
        labels: &'static [&'static str],
    ) -> Self {
        Self {
            name,
            help,
            labels,
            kind: MetricKind::Counter,
        }
    }

    /// Build a sample of this family; `values` are matched to the label names by position
    pub fn sample(&self, value: f64, values: &[&str]) -> MetricSample {
        debug_assert_eq!(
            self.labels.len(),
            values.len(),
            "label count mismatch for {}",
            self.name
        );
        MetricSample {
            name: self.name,
            labels: self
                .labels
                .iter()
                .zip(values)
                .map(|(k, v)| (*k, v.to_string()))
                .collect(),
            value,
            kind: self.kind,
        }
    }

    /// Fully qualified metric name as it appears in the exposition
    pub fn fq_name(&self) -> String {
        format!("{}_{}", NAMESPACE, self.name)
    }
}

/// A single observation: name, ordered labels, value and kind
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    pub name: &'static str,
    pub labels: Vec<(&'static str, String)>,
    pub value: f64,
    pub kind: MetricKind,
}

impl MetricSample {
    /// Value of the label `key`, if present
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Collapse samples that describe the same series, keeping the last one written
///
/// Background collectors may buffer several cycles between two scrapes; emitting every
/// copy would double count counters. Output is sorted by name and labels.
pub fn collapse_duplicates(samples: Vec<MetricSample>) -> Vec<MetricSample> {
    let mut series: BTreeMap<(&'static str, Vec<(&'static str, String)>), MetricSample> =
        BTreeMap::new();
    for sample in samples {
        series.insert((sample.name, sample.labels.clone()), sample);
    }
    series.into_values().collect()
}

enum Family {
    Gauge(GaugeVec),
    Counter(CounterVec),
}

/// Render samples in the Prometheus text format
///
/// Every sample must match a descriptor in `descs` by name and label names; samples that do
/// not are logged and dropped instead of failing the whole scrape.
pub fn render(
    descs: &[MetricDesc],
    samples: Vec<MetricSample>,
    const_labels: &HashMap<String, String>,
) -> anyhow::Result<String> {
    let registry = Registry::new();
    let mut families: HashMap<&'static str, (MetricDesc, Family)> =
        HashMap::with_capacity(descs.len());

    for desc in descs {
        let opts = Opts::new(desc.name, desc.help)
            .namespace(NAMESPACE)
            .const_labels(const_labels.clone());
        let family = match desc.kind {
            MetricKind::Gauge => {
                let vec = GaugeVec::new(opts, desc.labels)?;
                registry.register(Box::new(vec.clone()))?;
                Family::Gauge(vec)
            }
            MetricKind::Counter => {
                let vec = CounterVec::new(opts, desc.labels)?;
                registry.register(Box::new(vec.clone()))?;
                Family::Counter(vec)
            }
        };
        families.insert(desc.name, (*desc, family));
    }

    for sample in collapse_duplicates(samples) {
        let Some((desc, family)) = families.get(sample.name) else {
            warn!(metric = sample.name, "dropping sample without a descriptor");
            continue;
        };

        let keys_match = desc.labels.len() == sample.labels.len()
            && desc
                .labels
                .iter()
                .zip(&sample.labels)
                .all(|(want, (got, _))| want == got);
        if !keys_match {
            warn!(metric = sample.name, "dropping sample with unexpected labels");
            continue;
        }

        let values: Vec<&str> = sample.labels.iter().map(|(_, v)| v.as_str()).collect();
        match family {
            Family::Gauge(vec) => vec.with_label_values(values.as_slice()).set(sample.value),
            Family::Counter(vec) => {
                if sample.value < 0.0 || sample.value.is_nan() {
                    warn!(metric = sample.name, value = sample.value, "dropping invalid counter value");
                    continue;
                }
                vec.with_label_values(values.as_slice()).inc_by(sample.value);
            }
        }
    }

    let encoder = TextEncoder::new();
    let metric_families = registry.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}
