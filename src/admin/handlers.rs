use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::admin::AdminState;
use crate::load_balancer::Backend;

#[derive(Debug, Serialize, Deserialize)]
pub struct SystemStatus {
    pub version: String,
    pub status: String,
    pub backends: usize,
    pub live_backends: usize,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BackendStatus {
    pub index: usize,
    pub name: Option<String>,
    pub address: String,
    pub alive: bool,
}

impl BackendStatus {
    fn of(index: usize, backend: &dyn Backend) -> Self {
        Self {
            index,
            name: backend.name().map(str::to_string),
            address: backend.address().to_string(),
            alive: backend.is_alive(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LivenessUpdate {
    pub alive: bool,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    let backends = state.pool.len();
    let live_backends = state.pool.live_count();
    let status = match live_backends {
        0 => "unavailable",
        n if n < backends => "degraded",
        _ => "operational",
    };

    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: status.to_string(),
        backends,
        live_backends,
    })
}

pub async fn get_backends(State(state): State<AdminState>) -> Json<Vec<BackendStatus>> {
    let statuses = state
        .pool
        .backends()
        .iter()
        .enumerate()
        .map(|(i, b)| BackendStatus::of(i, b.as_ref()))
        .collect();

    Json(statuses)
}

/// Manual liveness toggle for one backend.
pub async fn set_liveness(
    State(state): State<AdminState>,
    Path(index): Path<usize>,
    Json(update): Json<LivenessUpdate>,
) -> Result<Json<BackendStatus>, StatusCode> {
    let previous = state
        .pool
        .set_alive(index, update.alive)
        .ok_or(StatusCode::NOT_FOUND)?;
    let backend = state.pool.get(index).ok_or(StatusCode::NOT_FOUND)?;

    tracing::info!(
        address = %backend.address(),
        from = %previous,
        to = %backend.liveness().state(),
        "Backend liveness changed by admin"
    );

    Ok(Json(BackendStatus::of(index, backend.as_ref())))
}
