//! Appointment Router
//!
//! Routes appointment reads and writes across regional database nodes,
//! keeping requests flowing while individual nodes fail.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────────┐
//!                        │                APPOINTMENT ROUTER                 │
//!                        │                                                   │
//!     Client Request     │  ┌─────────┐    ┌──────────┐    ┌────────────┐   │
//!     ───────────────────┼─▶│  http   │───▶│ routing  │───▶│  shard map │   │
//!                        │  │ server  │    │ (router) │    │ luzon/vismin│  │
//!                        │  └─────────┘    └────┬─────┘    └────────────┘   │
//!                        │                      │                            │
//!                        │                      ▼                            │
//!                        │              ┌──────────────┐   ┌────────────┐    │
//!                        │              │load_balancer │◀──│   health   │    │
//!                        │              │  (selector)  │   │  monitor   │    │
//!                        │              └──────┬───────┘   └─────▲──────┘    │
//!                        │                     ▼                 │           │
//!     Client Response    │              ┌──────────────┐   ┌─────┴──────┐    │
//!     ◀──────────────────┼──────────────│  resilience  │──▶│  backend   │────┼──▶ Nodes
//!                        │              │  (failover)  │   │  adapters  │    │   (master,
//!                        │              └──────────────┘   └────────────┘    │   replicas)
//!                        │                                                   │
//!                        │   config · lifecycle · observability (cross-cut)  │
//!                        └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use appointment_router::lifecycle::{signals, startup, Shutdown};
use appointment_router::observability::logging;

#[derive(Parser)]
#[command(name = "appointment-router")]
#[command(about = "Sharded appointment data router with node failover", long_about = None)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listener address, overriding the configuration
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = startup::load(args.config.as_deref(), args.bind)?;
    logging::init(&config.observability.log_level);

    tracing::info!("appointment-router v{} starting", env!("CARGO_PKG_VERSION"));

    let shutdown = Shutdown::new();
    signals::install(shutdown.clone());

    startup::run(config, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
