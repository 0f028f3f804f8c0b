//! Server lifecycle: load the topology, build the router, serve until Ctrl-C

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use alto_core::TopologyStore;
use anyhow::{Context, Result};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::routes::{create_router, create_router_with_metrics};
use crate::state::ServerState;

/// Builder for [`AltoServer`]
#[derive(Default)]
pub struct ServerBuilder {
    config: ServerConfig,
    store: Option<TopologyStore>,
    metrics: Option<PrometheusHandle>,
}

impl ServerBuilder {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Serve this store instead of loading `config.topology`
    pub fn store(mut self, store: TopologyStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Expose `GET /metrics` from this recorder handle
    pub fn metrics_handle(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    pub fn build(self) -> Result<AltoServer> {
        let store = match self.store {
            Some(store) => store,
            None => {
                let path = self
                    .config
                    .topology
                    .as_ref()
                    .context("no topology file configured")?;
                TopologyStore::from_file(path)
                    .with_context(|| format!("failed to load topology {}", path.display()))?
            }
        };

        let state = Arc::new(ServerState::new(store).with_limits(&self.config));
        let router = match self.metrics {
            Some(handle) => create_router_with_metrics(state, handle),
            None => create_router(state),
        };

        Ok(AltoServer {
            addr: self.config.socket_addr(),
            router,
        })
    }
}

/// A ready-to-run ALTO server
pub struct AltoServer {
    addr: SocketAddr,
    router: Router,
}

impl AltoServer {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Bind the configured address and serve until Ctrl-C
    pub async fn run(self) -> Result<()> {
        let listener = TcpListener::bind(self.addr)
            .await
            .with_context(|| format!("failed to bind {}", self.addr))?;
        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on an already-bound listener until `shutdown` resolves
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local = listener.local_addr()?;
        tracing::info!(addr = %local, "ALTO server listening");
        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;
        tracing::info!("ALTO server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl-C, shutting down"),
        Err(e) => tracing::error!(error = %e, "Failed to listen for Ctrl-C"),
    }
}
