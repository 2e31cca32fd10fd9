//! Request dispatch onto the backend pool.
//!
//! # Responsibilities
//! - Ask the pool for the next live backend
//! - Forward the request exactly once to that backend
//! - Report an explicit error when no backend is live or forwarding fails
//!
//! # Design Decisions
//! - Stateless beyond the shared pool (thread-safe without locks)
//! - No retry onto another backend within one request
//! - Forward failures never change backend liveness

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use std::sync::Arc;
use thiserror::Error;

use crate::http::request::X_REQUEST_ID;
use crate::load_balancer::{BackendPool, ForwardError, NoLiveBackend};
use crate::observability::metrics;

/// Why a request could not be proxied.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Every backend in the pool is dead.
    #[error(transparent)]
    NoLiveBackend(#[from] NoLiveBackend),

    /// The selected backend failed at the transport level.
    #[error("forwarding to {address} failed: {source}")]
    Forward {
        address: String,
        #[source]
        source: ForwardError,
    },
}

impl ProxyError {
    /// HTTP status reported to the client.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::NoLiveBackend(_) => StatusCode::SERVICE_UNAVAILABLE,
            ProxyError::Forward {
                source: ForwardError::Timeout(_),
                ..
            } => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::Forward { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

/// Entry point for proxied requests.
#[derive(Debug, Clone)]
pub struct Router {
    pool: Arc<BackendPool>,
}

impl Router {
    pub fn new(pool: Arc<BackendPool>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Arc<BackendPool> {
        &self.pool
    }

    /// Select a live backend and relay `request` to it.
    pub async fn handle(&self, request: Request<Body>) -> Result<Response<Body>, ProxyError> {
        let request_id = request
            .headers()
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();

        let backend = match self.pool.next_live() {
            Ok(backend) => backend,
            Err(e) => {
                tracing::warn!(request_id = %request_id, probed = e.probed, "No live backend");
                metrics::record_no_live_backend();
                return Err(e.into());
            }
        };

        tracing::info!(
            request_id = %request_id,
            method = %request.method(),
            path = %request.uri().path(),
            address = %backend.address(),
            "Forwarding request"
        );

        backend
            .forward(request)
            .await
            .map_err(|source| ProxyError::Forward {
                address: backend.address().to_string(),
                source,
            })
    }
}
