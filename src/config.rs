use crate::collectors::CollectorKind;
use anyhow::{ensure, Context, Result};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub ceph: CephConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub collectors: CollectorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CephConfig {
    /// Path to the `ceph` binary
    #[serde(default = "default_ceph_binary")]
    pub ceph_binary: String,
    /// Path to the `radosgw-admin` binary
    #[serde(default = "default_radosgw_admin_binary")]
    pub radosgw_admin_binary: String,
    /// Path to the `rbd` binary
    #[serde(default = "default_rbd_binary")]
    pub rbd_binary: String,
    /// Path to ceph.conf
    #[serde(default = "default_config_file")]
    pub config_file: String,
    /// Ceph client user, without the `client.` prefix
    #[serde(default = "default_user")]
    pub user: String,
    /// Value of the `cluster` label attached to every sample
    #[serde(default = "default_cluster")]
    pub cluster: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_addr")]
    pub addr: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CollectorsConfig {
    /// Collectors to register, by name
    #[serde(default = "default_enabled")]
    pub enabled: Vec<String>,
    /// Collectors that poll on their own interval instead of on every scrape
    #[serde(default)]
    pub background: Vec<String>,
    #[serde(default = "default_background_interval")]
    pub background_interval_seconds: u64,
    #[serde(default = "default_query_timeout")]
    pub query_timeout_seconds: u64,
    #[serde(default = "default_scrape_timeout")]
    pub scrape_timeout_seconds: u64,
    /// Maximum number of samples a background collector keeps between scrapes
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,
}

impl CollectorsConfig {
    pub fn is_enabled(&self, name: &str) -> bool {
        self.enabled.iter().any(|n| n == name)
    }

    pub fn is_background(&self, name: &str) -> bool {
        self.background.iter().any(|n| n == name)
    }

    pub fn background_interval(&self) -> Duration {
        Duration::from_secs(self.background_interval_seconds)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_seconds)
    }

    pub fn scrape_timeout(&self) -> Duration {
        Duration::from_secs(self.scrape_timeout_seconds)
    }
}

fn default_ceph_binary() -> String {
    "/usr/bin/ceph".to_string()
}

fn default_radosgw_admin_binary() -> String {
    "/usr/bin/radosgw-admin".to_string()
}

fn default_rbd_binary() -> String {
    "/usr/bin/rbd".to_string()
}

fn default_config_file() -> String {
    "/etc/ceph/ceph.conf".to_string()
}

fn default_user() -> String {
    "admin".to_string()
}

fn default_cluster() -> String {
    "ceph".to_string()
}

fn default_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    9128
}

fn default_enabled() -> Vec<String> {
    CollectorKind::ALL
        .iter()
        .map(|kind| kind.name().to_string())
        .collect()
}

fn default_background_interval() -> u64 {
    300
}

fn default_query_timeout() -> u64 {
    60
}

fn default_scrape_timeout() -> u64 {
    90
}

fn default_buffer_capacity() -> usize {
    100
}

impl Default for CephConfig {
    fn default() -> Self {
        Self {
            ceph_binary: default_ceph_binary(),
            radosgw_admin_binary: default_radosgw_admin_binary(),
            rbd_binary: default_rbd_binary(),
            config_file: default_config_file(),
            user: default_user(),
            cluster: default_cluster(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            port: default_port(),
        }
    }
}

impl Default for CollectorsConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            background: Vec::new(),
            background_interval_seconds: default_background_interval(),
            query_timeout_seconds: default_query_timeout(),
            scrape_timeout_seconds: default_scrape_timeout(),
            buffer_capacity: default_buffer_capacity(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        // Load environment variables from .env if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("CEPH_EXPORTER")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("collectors.enabled")
                    .with_list_parse_key("collectors.background")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: Self = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.validate().context("Invalid configuration")?;

        Ok(config)
    }

    /// Reject settings that would make the exporter spin or fail every query
    pub fn validate(&self) -> Result<()> {
        let collectors = &self.collectors;
        ensure!(
            collectors.background_interval_seconds > 0,
            "collectors.background_interval_seconds must be at least 1"
        );
        ensure!(
            collectors.query_timeout_seconds > 0,
            "collectors.query_timeout_seconds must be at least 1"
        );
        ensure!(
            collectors.scrape_timeout_seconds > 0,
            "collectors.scrape_timeout_seconds must be at least 1"
        );
        Ok(())
    }
}
