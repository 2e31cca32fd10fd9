//! Backend pool and round-robin selection.
//!
//! # Responsibilities
//! - Hold the ordered, fixed set of backends
//! - Select the next live backend in cyclic order under concurrent calls
//! - Fail explicitly when every backend is dead
//!
//! # Selection
//! ```text
//! cursor c, pool size n
//!     probe backends[(c + 0) % n], backends[(c + 1) % n], ... (at most n probes)
//!     first alive at offset k → CAS cursor c → c + k + 1, return it
//!     none alive → NoLiveBackend, cursor untouched
//!     CAS lost → retry from the cursor value that won
//! ```
//!
//! Each successful selection claims a distinct cursor value, so concurrent
//! callers never share a slot of the cycle and no advance is lost.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{BackendConfig, TimeoutConfig};
use crate::load_balancer::backend::{Backend, LivenessState};
use crate::load_balancer::error::{BuildError, NoLiveBackend};
use crate::load_balancer::forward::{HttpBackend, UpstreamClient};
use crate::observability::metrics;

/// Ordered backend collection with a shared round-robin cursor.
#[derive(Debug)]
pub struct BackendPool {
    backends: Vec<Arc<dyn Backend>>,
    cursor: AtomicUsize,
}

impl BackendPool {
    /// Create a pool over `backends`, starting the cycle at index 0.
    pub fn new(backends: Vec<Arc<dyn Backend>>) -> Result<Self, BuildError> {
        Self::with_cursor(backends, 0)
    }

    /// Create a pool whose first selection starts probing at `cursor % len`.
    pub fn with_cursor(backends: Vec<Arc<dyn Backend>>, cursor: usize) -> Result<Self, BuildError> {
        if backends.is_empty() {
            return Err(BuildError::EmptyPool);
        }
        for backend in &backends {
            metrics::record_backend_alive(backend.address(), backend.is_alive());
        }
        Ok(Self {
            backends,
            cursor: AtomicUsize::new(cursor),
        })
    }

    /// Build HTTP backends from configuration. Any malformed address is fatal.
    pub fn from_config(
        configs: &[BackendConfig],
        client: &UpstreamClient,
        timeouts: &TimeoutConfig,
    ) -> Result<Self, BuildError> {
        let upstream_timeout = Duration::from_secs(timeouts.upstream_secs);
        let backends = configs
            .iter()
            .map(|config| {
                let backend = HttpBackend::new(config, client.clone(), upstream_timeout)?;
                tracing::info!(address = %config.address, name = ?config.name, "Backend registered");
                Ok(Arc::new(backend) as Arc<dyn Backend>)
            })
            .collect::<Result<Vec<_>, BuildError>>()?;

        Self::new(backends)
    }

    /// Select the next live backend in round-robin order.
    ///
    /// Probes at most `len()` backends per attempt. The cursor advances past
    /// every skipped backend plus the selected one, in a single atomic step.
    pub fn next_live(&self) -> Result<Arc<dyn Backend>, NoLiveBackend> {
        let len = self.backends.len();
        let mut current = self.cursor.load(Ordering::Acquire);

        loop {
            let offset = (0..len)
                .find(|probe| self.backends[current.wrapping_add(*probe) % len].is_alive())
                .ok_or(NoLiveBackend { probed: len })?;

            match self.cursor.compare_exchange_weak(
                current,
                current.wrapping_add(offset + 1),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    let backend = &self.backends[current.wrapping_add(offset) % len];
                    if offset > 0 {
                        tracing::debug!(
                            skipped = offset,
                            address = %backend.address(),
                            "Skipped dead backends"
                        );
                    }
                    metrics::record_selection(backend.address());
                    return Ok(backend.clone());
                }
                Err(observed) => current = observed,
            }
        }
    }

    /// All backends in pool order.
    pub fn backends(&self) -> &[Arc<dyn Backend>] {
        &self.backends
    }

    /// Backend at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&Arc<dyn Backend>> {
        self.backends.get(index)
    }

    /// Overwrite the liveness of the backend at `index`, returning the
    /// previous state, or `None` when the index is out of range.
    pub fn set_alive(&self, index: usize, alive: bool) -> Option<LivenessState> {
        let backend = self.backends.get(index)?;
        let previous = backend.liveness().set(alive);
        metrics::record_backend_alive(backend.address(), alive);
        Some(previous)
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    /// Always false; an empty pool cannot be constructed.
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// Number of backends currently alive.
    pub fn live_count(&self) -> usize {
        self.backends.iter().filter(|b| b.is_alive()).count()
    }

    /// Raw cursor value (monotonic modulo wrap-around).
    pub fn cursor(&self) -> usize {
        self.cursor.load(Ordering::Acquire)
    }
}
