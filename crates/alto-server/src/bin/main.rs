//! ALTO server CLI

use std::net::IpAddr;
use std::path::PathBuf;

use alto_server::{init_prometheus_recorder, ServerBuilder, ServerConfig};
use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "alto-server")]
#[command(about = "ALTO information resource server")]
struct Args {
    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long)]
    bind: Option<IpAddr>,

    /// Port to listen on
    #[arg(long)]
    port: Option<u16>,

    /// Topology file (network map and cost tables)
    #[arg(long)]
    topology: Option<PathBuf>,

    /// Expose Prometheus metrics at /metrics
    #[arg(long)]
    metrics: bool,
}

impl Args {
    fn into_config(self) -> Result<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::from_file(path)?,
            None => ServerConfig::default(),
        };
        if let Some(bind) = self.bind {
            config.bind = bind;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(topology) = self.topology {
            config.topology = Some(topology);
        }
        config.metrics |= self.metrics;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Args::parse().into_config()?;
    tracing::info!(
        addr = %config.socket_addr(),
        topology = ?config.topology,
        metrics = config.metrics,
        "Starting ALTO server"
    );

    let mut builder = ServerBuilder::new(config.clone());
    if config.metrics {
        let handle = init_prometheus_recorder().context("failed to install metrics recorder")?;
        builder = builder.metrics_handle(handle);
    }

    builder.build()?.run().await
}
