//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, timeout, request ID, metrics)
//! - Run the first probe and start the health monitor before serving
//! - Bind server to listener and drain on shutdown

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{MatchedPath, Request};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::{ReadConfig, RouterConfig};
use crate::health::{HealthMonitor, HealthState};
use crate::http::handlers;
use crate::http::request::{make_span, propagate_request_id, set_request_id};
use crate::lifecycle::Shutdown;
use crate::load_balancer::pool::NodeSet;
use crate::load_balancer::strategy_for;
use crate::observability::metrics;
use crate::routing::{AppointmentRouter, ShardMap};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<AppointmentRouter>,
    pub health: Arc<HealthState>,
    pub nodes: Arc<NodeSet>,
    pub reads: ReadConfig,
}

/// HTTP front end of the appointment router.
pub struct HttpServer {
    router: Router,
    config: RouterConfig,
    nodes: Arc<NodeSet>,
    health: Arc<HealthState>,
}

impl HttpServer {
    /// Create a new HTTP server over already connected nodes.
    pub fn new(config: RouterConfig, nodes: NodeSet) -> Self {
        let nodes = Arc::new(nodes);
        let health = Arc::new(HealthState::new(
            nodes.ids(),
            strategy_for(config.failover.strategy),
        ));
        let shards = ShardMap::new(&config.sharding.luzon_regions);
        let appointments = Arc::new(AppointmentRouter::new(
            nodes.clone(),
            health.clone(),
            shards,
            &config.failover,
            config.reads.clone(),
        ));

        let state = AppState {
            router: appointments,
            health: health.clone(),
            nodes: nodes.clone(),
            reads: config.reads.clone(),
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            nodes,
            health,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &RouterConfig, state: AppState) -> Router {
        Router::new()
            .route("/status", get(handlers::get_status))
            .route(
                "/appointments",
                get(handlers::list_appointments).put(handlers::create_appointment),
            )
            .route("/appointments/size", get(handlers::appointment_count))
            .route(
                "/appointments/{id}",
                get(handlers::get_appointment)
                    .patch(handlers::update_appointment)
                    .delete(handlers::delete_appointment),
            )
            .route_layer(middleware::from_fn(track_metrics))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(set_request_id())
                    .layer(propagate_request_id())
                    .layer(TraceLayer::new_for_http().make_span_with(make_span))
                    .layer(TimeoutLayer::new(Duration::from_secs(
                        config.listener.request_timeout_secs,
                    ))),
            )
    }

    /// Shared availability state, for embedding and tests.
    pub fn health(&self) -> Arc<HealthState> {
        self.health.clone()
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        let monitor_rx = shutdown.subscribe();

        let monitor = HealthMonitor::new(
            self.nodes.clone(),
            self.health.clone(),
            self.config.health.clone(),
        );
        // Traffic only after the table reflects reality.
        monitor.probe_all().await;
        let table = self.health.snapshot();
        tracing::info!(
            available = table.available().len(),
            total = table.len(),
            "Initial probe complete"
        );
        let monitor_task = tokio::spawn(monitor.run(monitor_rx));

        tracing::info!(address = %addr, "HTTP server starting");
        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown.signalled())
            .await?;

        if let Err(e) = monitor_task.await {
            tracing::warn!(error = %e, "Health monitor task ended abnormally");
        }
        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }
}

async fn track_metrics(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());

    let response = next.run(request).await;
    metrics::record_request(&method, response.status().as_u16(), &route, start);
    response
}
