//! Ceph Prometheus Exporter
//!
//! A Prometheus metrics exporter for Ceph clusters.
//!
//! # Overview
//!
//! The exporter runs the Ceph admin tools (`ceph`, `radosgw-admin`, `rbd`) to query the
//! cluster and republishes the results as Prometheus samples. Each subsystem has its own
//! collector; collectors are gated on the cluster version and run either on every scrape
//! or on their own background interval.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐   ceph / radosgw-admin   ┌──────────────────────┐
//! │    Ceph     │ ◄──────────────────────► │       Exporter       │
//! │   Cluster   │      JSON payloads       │                      │
//! └─────────────┘                          │  ┌────────────────┐  │      HTTP      ┌────────────┐
//!                                          │  │ VersionResolver│  │ ◄────────────► │ Prometheus │
//!                                          │  └────────────────┘  │    /metrics    └────────────┘
//!                                          │  ┌────────────────┐  │
//!                                          │  │   Collectors   │  │
//!                                          │  │ (sync / bg buf)│  │
//!                                          │  └────────────────┘  │
//!                                          └──────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`ceph`] - Query gateway, payload types and version resolution
//! - [`collectors`] - Per-subsystem collectors
//! - [`pipeline`] - Synchronous and background collection, sample buffers
//! - [`exporter`] - Collector registry and scrape coordination
//! - [`metrics`] - Sample model and Prometheus text rendering
//! - [`server`] - HTTP server
//! - [`config`] - Configuration management
//! - [`error`] - Error types
//!
//! # Quick Start
//!
//! ```no_run
//! use ceph_exporter::{config::Config, server};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/Default.toml")?;
//!     server::start(config).await?;
//!     Ok(())
//! }
//! ```

pub mod ceph;
pub mod collectors;
pub mod config;
pub mod error;
pub mod exporter;
pub mod metrics;
pub mod pipeline;
pub mod server;
