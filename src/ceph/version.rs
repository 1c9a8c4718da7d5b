//! Cluster Version Resolution
//!
//! The cluster version is resolved once per scrape and decides which collectors run.
//! A [`VersionGate`] with no bounds and no required feature marks a collector as
//! unversioned: it keeps running even when the version cannot be determined.

use super::gateway::{Query, QueryRunner};
use super::types::{DaemonVersions, VersionReport};
use crate::error::{ExporterError, Result};
use regex::Regex;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use tracing::{debug, warn};

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"ceph version (?P<major>\d+)\.(?P<minor>\d+)\.(?P<patch>\d+)(?:-(?P<revision>\d+))?(?:[-.](?P<build>\S+))?(?:\s+\((?P<commit>[0-9a-fA-F]+)\))?(?:\s+(?P<codename>[a-z]+))?(?:\s+\((?P<release>[a-z]+)\))?",
    )
    .expect("valid version regex")
});

/// Numeric part of a Ceph release, ordered by `(major, minor, patch, revision)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct VersionNumber {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub revision: u32,
}

impl VersionNumber {
    pub const LUMINOUS: VersionNumber = VersionNumber::new(12, 0, 0, 0);
    pub const NAUTILUS: VersionNumber = VersionNumber::new(14, 0, 0, 0);
    pub const PACIFIC: VersionNumber = VersionNumber::new(16, 0, 0, 0);

    pub const fn new(major: u32, minor: u32, patch: u32, revision: u32) -> Self {
        Self {
            major,
            minor,
            patch,
            revision,
        }
    }
}

impl fmt::Display for VersionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}-{}", self.major, self.minor, self.patch, self.revision)
    }
}

/// Optional cluster capabilities detected alongside the version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Feature {
    /// At least one `rbd-mirror` daemon is running
    RbdMirror,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CephVersion {
    pub number: VersionNumber,
    pub build: Option<String>,
    pub commit: Option<String>,
    pub codename: Option<String>,
    pub release: Option<String>,
    pub features: BTreeSet<Feature>,
}

impl CephVersion {
    pub fn has_feature(&self, feature: Feature) -> bool {
        self.features.contains(&feature)
    }
}

impl FromStr for CephVersion {
    type Err = ExporterError;

    fn from_str(s: &str) -> Result<Self> {
        let caps = VERSION_RE
            .captures(s)
            .ok_or_else(|| ExporterError::Parse(format!("unrecognized ceph version {:?}", s)))?;

        let number_at = |name: &str| -> Result<u32> {
            caps.name(name).map_or(Ok(0), |m| {
                m.as_str()
                    .parse()
                    .map_err(|e| ExporterError::Parse(format!("bad {} in {:?}: {}", name, s, e)))
            })
        };
        let text_at = |name: &str| caps.name(name).map(|m| m.as_str().to_string());

        Ok(Self {
            number: VersionNumber::new(
                number_at("major")?,
                number_at("minor")?,
                number_at("patch")?,
                number_at("revision")?,
            ),
            build: text_at("build"),
            commit: text_at("commit"),
            codename: text_at("codename"),
            release: text_at("release"),
            features: BTreeSet::new(),
        })
    }
}

/// Features present according to `ceph versions`
pub fn features_from_versions(versions: &DaemonVersions) -> BTreeSet<Feature> {
    let mut features = BTreeSet::new();
    if versions
        .get("rbd-mirror")
        .is_some_and(|daemons| daemons.values().any(|count| *count > 0))
    {
        features.insert(Feature::RbdMirror);
    }
    features
}

/// Version bounds and required features for a collector
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionGate {
    /// Inclusive lower bound
    pub min: Option<VersionNumber>,
    /// Inclusive upper bound
    pub max: Option<VersionNumber>,
    pub requires: Option<Feature>,
}

impl VersionGate {
    /// Gate that admits every cluster, known version or not
    pub fn always() -> Self {
        Self::default()
    }

    pub fn since(min: VersionNumber) -> Self {
        Self {
            min: Some(min),
            ..Self::default()
        }
    }

    pub fn requiring(mut self, feature: Feature) -> Self {
        self.requires = Some(feature);
        self
    }

    pub fn is_versioned(&self) -> bool {
        self.min.is_some() || self.max.is_some() || self.requires.is_some()
    }

    /// Whether a collector behind this gate may run against `version`
    ///
    /// Unversioned gates admit everything, including an unknown version.
    pub fn admits(&self, version: Option<&CephVersion>) -> bool {
        if !self.is_versioned() {
            return true;
        }
        let Some(version) = version else {
            return false;
        };
        if self.min.is_some_and(|min| version.number < min) {
            return false;
        }
        if self.max.is_some_and(|max| version.number > max) {
            return false;
        }
        self.requires.map_or(true, |f| version.has_feature(f))
    }
}

#[derive(Clone)]
pub struct VersionResolver {
    runner: QueryRunner,
}

impl VersionResolver {
    pub fn new(runner: QueryRunner) -> Self {
        Self { runner }
    }

    /// Resolve the running cluster version and its feature set
    pub async fn resolve(&self) -> Result<CephVersion> {
        let report: VersionReport = self
            .runner
            .json(&Query::ceph(&["version", "--format", "json"]))
            .await
            .map_err(|e| ExporterError::Version(e.to_string()))?;

        let mut version: CephVersion = report
            .version
            .parse()
            .map_err(|e: ExporterError| ExporterError::Version(e.to_string()))?;

        // Feature detection is best effort; the version alone still gates most collectors.
        match self
            .runner
            .json::<DaemonVersions>(&Query::ceph(&["versions", "--format", "json"]))
            .await
        {
            Ok(versions) => version.features = features_from_versions(&versions),
            Err(e) => warn!(error = %e, "failed to enumerate daemon versions, assuming no optional features"),
        }

        debug!(version = %version.number, features = ?version.features, "resolved cluster version");
        Ok(version)
    }
}
