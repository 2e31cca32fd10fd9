//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the backend pool from configuration (fatal on bad addresses)
//! - Create the Axum router with the catch-all proxy handler
//! - Wire up middleware (request ID, tracing, request timeout)
//! - Spawn the health monitor and admin API when enabled
//! - Serve until the shutdown signal

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::admin;
use crate::config::ProxyConfig;
use crate::health::active::HealthMonitor;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::lifecycle::Shutdown;
use crate::load_balancer::{build_client, BackendPool, BuildError, UpstreamClient};
use crate::observability::metrics;
use crate::routing::{ProxyError, Router as ProxyRouter};

/// HTTP server for the round-robin proxy.
pub struct HttpServer {
    app: Router,
    config: ProxyConfig,
    pool: Arc<BackendPool>,
    client: UpstreamClient,
}

impl HttpServer {
    /// Build the pool from `config.backends` and assemble the server.
    pub fn new(config: ProxyConfig) -> Result<Self, BuildError> {
        let client = build_client(&config.timeouts);
        let pool = BackendPool::from_config(&config.backends, &client, &config.timeouts)?;
        Ok(Self::assemble(config, Arc::new(pool), client))
    }

    /// Assemble a server around an already built pool.
    pub fn with_pool(config: ProxyConfig, pool: Arc<BackendPool>) -> Self {
        let client = build_client(&config.timeouts);
        Self::assemble(config, pool, client)
    }

    fn assemble(config: ProxyConfig, pool: Arc<BackendPool>, client: UpstreamClient) -> Self {
        let router = ProxyRouter::new(pool.clone());
        let app = Self::build_router(&config, router);
        Self {
            app,
            config,
            pool,
            client,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ProxyConfig, router: ProxyRouter) -> Router {
        Router::new()
            .route("/", any(proxy_handler))
            .route("/{*path}", any(proxy_handler))
            .with_state(router)
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(set_request_id_layer())
    }

    /// The proxy application, for in-process use.
    pub fn app(&self) -> Router {
        self.app.clone()
    }

    /// The shared backend pool.
    pub fn pool(&self) -> &Arc<BackendPool> {
        &self.pool
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            backends = self.pool.len(),
            "HTTP server starting"
        );

        if self.config.health_check.enabled {
            let monitor = HealthMonitor::new(
                self.pool.clone(),
                self.config.health_check.clone(),
                self.client.clone(),
            );
            let rx = shutdown.subscribe();
            tokio::spawn(async move {
                monitor.run(rx).await;
            });
        }

        if self.config.admin.enabled {
            let admin_listener = TcpListener::bind(&self.config.admin.bind_address).await?;
            tracing::info!(address = %admin_listener.local_addr()?, "Admin API listening");
            let admin_app = admin::setup_admin_router(self.pool.clone(), &self.config.admin);
            let admin_shutdown = shutdown.clone();
            tokio::spawn(async move {
                if let Err(e) = axum::serve(admin_listener, admin_app)
                    .with_graceful_shutdown(admin_shutdown.wait())
                    .await
                {
                    tracing::error!(error = %e, "Admin API stopped with error");
                }
            });
        }

        let app = self.app.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown.wait())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Catch-all proxy handler.
async fn proxy_handler(State(router): State<ProxyRouter>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let method = request.method().to_string();

    match router.handle(request).await {
        Ok(response) => {
            metrics::record_request(&method, response.status().as_u16(), start_time);
            response
        }
        Err(e) => {
            if let ProxyError::Forward { .. } = e {
                tracing::error!(error = %e, "Upstream error");
            }
            metrics::record_request(&method, e.status().as_u16(), start_time);
            e.into_response()
        }
    }
}
