//! In-process backend double used by unit tests.

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::load_balancer::backend::{Backend, ForwardFuture, Liveness};
use crate::load_balancer::error::ForwardError;

/// Answers every forward with `200` and its own address as the body.
#[derive(Debug)]
pub struct StaticBackend {
    address: String,
    liveness: Liveness,
    forwarded: AtomicUsize,
    time_out: AtomicBool,
}

impl StaticBackend {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            liveness: Liveness::new(),
            forwarded: AtomicUsize::new(0),
            time_out: AtomicBool::new(false),
        }
    }

    /// Make every subsequent forward fail with a timeout.
    pub fn fail_forwards(&self) {
        self.time_out.store(true, Ordering::SeqCst);
    }

    /// Number of requests this backend received.
    pub fn forwarded(&self) -> usize {
        self.forwarded.load(Ordering::SeqCst)
    }
}

impl Backend for StaticBackend {
    fn address(&self) -> &str {
        &self.address
    }

    fn liveness(&self) -> &Liveness {
        &self.liveness
    }

    fn forward(&self, _request: Request<Body>) -> ForwardFuture<'_> {
        Box::pin(async move {
            self.forwarded.fetch_add(1, Ordering::SeqCst);
            if self.time_out.load(Ordering::SeqCst) {
                return Err(ForwardError::Timeout(std::time::Duration::from_millis(1)));
            }
            Ok(Response::builder()
                .status(StatusCode::OK)
                .body(Body::from(self.address.clone()))?)
        })
    }
}
