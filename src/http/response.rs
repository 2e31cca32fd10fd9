//! Error responses for proxied requests.
//!
//! # Responsibilities
//! - Map proxy errors to HTTP status codes
//!
//! # Design Decisions
//! - No live backend → 503 Service Unavailable
//! - Transport failure → 502 Bad Gateway
//! - Upstream deadline elapsed → 504 Gateway Timeout
//! - Upstream responses (any status) pass through untouched

use axum::response::{IntoResponse, Response};

use crate::routing::ProxyError;

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let message = match &self {
            ProxyError::NoLiveBackend(_) => "No live backends",
            ProxyError::Forward { .. } => "Upstream request failed",
        };
        (self.status(), message).into_response()
    }
}
