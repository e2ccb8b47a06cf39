//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Connect every configured node
//! - Start the metrics exporter when enabled
//! - Bind the listener and hand over to the HTTP server
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The listener starts last; the server probes nodes before serving

use std::path::Path;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::backend::BackendError;
use crate::config::loader::finalize;
use crate::config::{load_config, ConfigError, RouterConfig};
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;
use crate::load_balancer::pool::NodeSet;
use crate::observability::metrics;

#[derive(Error, Debug)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("node setup failed: {0}")]
    Node(#[from] BackendError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Read the config file, or fall back to the built-in node layout.
/// `bind` overrides the listener address.
pub fn load(path: Option<&Path>, bind: Option<String>) -> Result<RouterConfig, ConfigError> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => finalize(RouterConfig::with_default_nodes())?,
    };
    if let Some(bind) = bind {
        config.listener.bind_address = bind;
    }
    Ok(config)
}

/// Bring the router up and serve until `shutdown` fires.
pub async fn run(config: RouterConfig, shutdown: Shutdown) -> Result<(), StartupError> {
    tracing::info!(
        bind_address = %config.listener.bind_address,
        nodes = config.nodes.len(),
        merge_mode = ?config.reads.merge_mode,
        strategy = ?config.failover.strategy,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let nodes = NodeSet::connect(&config.nodes)?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    HttpServer::new(config, nodes).run(listener, shutdown).await?;
    Ok(())
}
