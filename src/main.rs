use anyhow::Result;
use ceph_exporter::{config::Config, server};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/Default.toml")]
    config: String,

    /// Path to ceph.conf (overrides config)
    #[arg(long, env = "CEPH_CONFIG")]
    ceph_config: Option<String>,

    /// Ceph client user without the `client.` prefix (overrides config)
    #[arg(long, env = "CEPH_USER")]
    ceph_user: Option<String>,

    /// Value of the `cluster` label (overrides config)
    #[arg(long, env = "CEPH_CLUSTER")]
    cluster: Option<String>,

    /// Port to listen on for metrics
    #[arg(short, long, env = "EXPORTER_PORT")]
    port: Option<u16>,

    /// Address to bind to
    #[arg(short, long, env = "EXPORTER_ADDR")]
    addr: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting Ceph Prometheus Exporter v{}",
        env!("CARGO_PKG_VERSION")
    );

    // Parse CLI arguments
    let args = Args::parse();

    // Load configuration
    let mut config = Config::load(&args.config)?;

    // Override with CLI arguments if provided
    if let Some(path) = args.ceph_config {
        config.ceph.config_file = path;
    }
    if let Some(user) = args.ceph_user {
        config.ceph.user = user;
    }
    if let Some(cluster) = args.cluster {
        config.ceph.cluster = cluster;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(addr) = args.addr {
        config.server.addr = addr;
    }

    info!("Configuration loaded successfully");
    info!("Ceph cluster: {} (client.{})", config.ceph.cluster, config.ceph.user);
    info!("Enabled collectors: {}", config.collectors.enabled.join(", "));
    info!(
        "Metrics endpoint: http://{}:{}/metrics",
        config.server.addr, config.server.port
    );

    // Start the metrics server
    if let Err(e) = server::start(config).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
