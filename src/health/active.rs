//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe every backend in the pool
//! - Feed outcomes through a per-backend [`HealthTracker`]
//! - Write the backend liveness flag on a state transition

use axum::body::Body;
use axum::http::{header, Request};
use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time;

use crate::config::HealthCheckConfig;
use crate::health::state::HealthTracker;
use crate::load_balancer::{health_uri, BackendPool, LivenessState, UpstreamClient};
use crate::observability::metrics;

pub struct HealthMonitor {
    pool: Arc<BackendPool>,
    config: HealthCheckConfig,
    client: UpstreamClient,
    trackers: Vec<HealthTracker>,
}

impl HealthMonitor {
    pub fn new(pool: Arc<BackendPool>, config: HealthCheckConfig, client: UpstreamClient) -> Self {
        let trackers = (0..pool.len())
            .map(|_| HealthTracker::new(config.healthy_threshold, config.unhealthy_threshold))
            .collect();

        Self {
            pool,
            config,
            client,
            trackers,
        }
    }

    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval = self.config.interval_secs,
            path = %self.config.path,
            "Health monitor starting"
        );

        let mut ticker = time::interval(Duration::from_secs(self.config.interval_secs));
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.check_all().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Probe every backend once and apply any resulting transitions.
    pub async fn check_all(&mut self) {
        let probes = self
            .pool
            .backends()
            .iter()
            .map(|backend| self.probe(backend.address()));
        let outcomes = join_all(probes).await;

        for ((backend, tracker), healthy) in self
            .pool
            .backends()
            .iter()
            .zip(self.trackers.iter_mut())
            .zip(outcomes)
        {
            let current = backend.liveness().state();
            if let Some(next) = tracker.record(current, healthy) {
                backend.liveness().set(next == LivenessState::Alive);
                match next {
                    LivenessState::Alive => {
                        tracing::info!(address = %backend.address(), "Backend is alive again")
                    }
                    LivenessState::Dead => {
                        tracing::warn!(address = %backend.address(), "Backend marked dead")
                    }
                }
            }
            metrics::record_backend_alive(backend.address(), backend.is_alive());
        }
    }

    async fn probe(&self, address: &str) -> bool {
        let uri = match health_uri(address, &self.config.path) {
            Ok(uri) => uri,
            Err(e) => {
                tracing::error!(address = %address, error = %e, "Cannot build health check URI");
                return false;
            }
        };

        let request = match Request::builder()
            .method("GET")
            .uri(uri)
            .header(header::USER_AGENT, "rr-proxy-health-check")
            .body(Body::empty())
        {
            Ok(req) => req,
            Err(e) => {
                tracing::error!("Failed to build health check request: {}", e);
                return false;
            }
        };

        let timeout = Duration::from_secs(self.config.timeout_secs);
        match time::timeout(timeout, self.client.request(request)).await {
            Ok(Ok(response)) => {
                let status = response.status();
                let success = status.is_success() || status.is_redirection();
                if !success {
                    tracing::debug!(address = %address, status = %status, "Health check failed: non-success status");
                }
                success
            }
            Ok(Err(e)) => {
                tracing::debug!(address = %address, error = %e, "Health check failed: connection error");
                false
            }
            Err(_) => {
                tracing::debug!(address = %address, "Health check failed: timeout");
                false
            }
        }
    }
}
