//! Cluster Query Gateway
//!
//! All communication with the cluster goes through [`ClusterGateway::run_query`]: a query
//! names one of the admin tools plus its arguments and yields the raw bytes the tool printed.
//! The production implementation, [`CommandGateway`], shells out to `ceph`, `radosgw-admin`
//! and `rbd`; tests swap in an in-memory gateway.
//!
//! Deadlines are owned by [`QueryRunner`], which wraps every call in a timeout. Dropping the
//! timed-out future kills the child process, so an abandoned query never lingers.

use crate::config::CephConfig;
use crate::error::{ExporterError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::fmt;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Admin tool a query is addressed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    Ceph,
    RadosgwAdmin,
    Rbd,
}

impl Tool {
    pub fn as_str(self) -> &'static str {
        match self {
            Tool::Ceph => "ceph",
            Tool::RadosgwAdmin => "radosgw-admin",
            Tool::Rbd => "rbd",
        }
    }
}

/// A single administrative query against the cluster
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query {
    pub tool: Tool,
    pub args: Vec<String>,
}

impl Query {
    pub fn new(tool: Tool, args: &[&str]) -> Self {
        Self {
            tool,
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    pub fn ceph(args: &[&str]) -> Self {
        Self::new(Tool::Ceph, args)
    }

    pub fn radosgw_admin(args: &[&str]) -> Self {
        Self::new(Tool::RadosgwAdmin, args)
    }

    pub fn rbd(args: &[&str]) -> Self {
        Self::new(Tool::Rbd, args)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tool.as_str())?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Executes administrative queries against the cluster
#[async_trait]
pub trait ClusterGateway: Send + Sync {
    /// Run `query` and return the raw payload it produced
    async fn run_query(&self, query: &Query) -> Result<Vec<u8>>;
}

/// Gateway that runs the Ceph command line tools as child processes
pub struct CommandGateway {
    config: CephConfig,
}

impl CommandGateway {
    pub fn new(config: CephConfig) -> Self {
        Self { config }
    }

    fn binary(&self, tool: Tool) -> &str {
        match tool {
            Tool::Ceph => &self.config.ceph_binary,
            Tool::RadosgwAdmin => &self.config.radosgw_admin_binary,
            Tool::Rbd => &self.config.rbd_binary,
        }
    }

    fn command(&self, query: &Query) -> Command {
        let mut cmd = Command::new(self.binary(query.tool));
        cmd.arg("-c")
            .arg(&self.config.config_file)
            .arg("-n")
            .arg(format!("client.{}", self.config.user))
            .args(&query.args)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl ClusterGateway for CommandGateway {
    async fn run_query(&self, query: &Query) -> Result<Vec<u8>> {
        debug!(query = %query, "running cluster query");

        let output = self.command(query).output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExporterError::Query {
                query: query.to_string(),
                reason: format!("{}: {}", output.status, stderr.trim()),
            });
        }

        Ok(output.stdout)
    }
}

/// Gateway handle that applies the per-query deadline
#[derive(Clone)]
pub struct QueryRunner {
    gateway: Arc<dyn ClusterGateway>,
    timeout: Duration,
}

impl QueryRunner {
    pub fn new(gateway: Arc<dyn ClusterGateway>, timeout: Duration) -> Self {
        Self { gateway, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run a query and return its raw payload
    pub async fn raw(&self, query: &Query) -> Result<Vec<u8>> {
        match tokio::time::timeout(self.timeout, self.gateway.run_query(query)).await {
            Ok(result) => result,
            Err(_) => Err(ExporterError::Timeout {
                query: query.to_string(),
                after: self.timeout,
            }),
        }
    }

    /// Run a query and decode its payload as JSON
    pub async fn json<T>(&self, query: &Query) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let data = self.raw(query).await?;
        serde_json::from_slice(&data).map_err(ExporterError::Decode)
    }
}
