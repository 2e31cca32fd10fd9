//! Load balancer error types.

use std::time::Duration;
use thiserror::Error;

/// Errors raised while building backends and the pool at startup.
///
/// Always fatal: the proxy refuses to start with a malformed pool.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Backend address is not a valid absolute URI.
    #[error("invalid backend address '{address}': {source}")]
    InvalidAddress {
        address: String,
        #[source]
        source: url::ParseError,
    },

    /// Only plain `http` targets can be forwarded to.
    #[error("unsupported scheme '{scheme}' in backend address '{address}'")]
    UnsupportedScheme { address: String, scheme: String },

    /// Address parsed but carries no usable host.
    #[error("backend address '{0}' has no host")]
    MissingHost(String),

    /// Health check path is not a valid origin-form URI.
    #[error("invalid health check path '{0}'")]
    InvalidHealthPath(String),

    /// A pool needs at least one backend.
    #[error("backend pool must contain at least one backend")]
    EmptyPool,
}

/// Every backend was probed during one selection and none was alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no live backend among {probed} probed")]
pub struct NoLiveBackend {
    /// Number of backends examined before giving up.
    pub probed: usize,
}

/// Transport-level failure while forwarding to a selected backend.
///
/// A non-2xx upstream response is not a forward error.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// The rewritten upstream request could not be assembled.
    #[error("invalid upstream request: {0}")]
    Request(#[from] axum::http::Error),

    /// Connection or protocol failure talking to the backend.
    #[error("upstream transport error: {0}")]
    Transport(#[from] hyper_util::client::legacy::Error),

    /// The backend did not answer within the upstream deadline.
    #[error("upstream timed out after {0:?}")]
    Timeout(Duration),
}
