//! Backend abstraction.
//!
//! # Responsibilities
//! - Define the capability set every upstream target offers
//! - Hold the liveness flag shared between selectors and health collaborators
//!
//! # Design Decisions
//! - Selection only reads liveness; writes go through [`Liveness::set`]
//! - A failed forward never touches liveness
//! - Implementations are chosen at construction (HTTP or test doubles)

use axum::body::Body;
use axum::http::{Request, Response};
use futures_util::future::BoxFuture;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::load_balancer::error::ForwardError;

/// Future returned by [`Backend::forward`].
pub type ForwardFuture<'a> = BoxFuture<'a, Result<Response<Body>, ForwardError>>;

/// Liveness of a single backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LivenessState {
    Alive,
    Dead,
}

impl fmt::Display for LivenessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LivenessState::Alive => f.write_str("alive"),
            LivenessState::Dead => f.write_str("dead"),
        }
    }
}

/// Atomic liveness flag. Starts alive.
#[derive(Debug)]
pub struct Liveness(AtomicBool);

impl Liveness {
    pub fn new() -> Self {
        Self(AtomicBool::new(true))
    }

    /// Current state, visible across threads.
    pub fn is_alive(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn state(&self) -> LivenessState {
        if self.is_alive() {
            LivenessState::Alive
        } else {
            LivenessState::Dead
        }
    }

    /// Store a new state. Returns the previous one so callers can log transitions.
    pub fn set(&self, alive: bool) -> LivenessState {
        if self.0.swap(alive, Ordering::AcqRel) {
            LivenessState::Alive
        } else {
            LivenessState::Dead
        }
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}

/// An upstream target the pool can select and forward to.
pub trait Backend: Send + Sync + fmt::Debug {
    /// Immutable target identifier, as configured.
    fn address(&self) -> &str;

    /// Optional display name.
    fn name(&self) -> Option<&str> {
        None
    }

    /// The shared liveness flag of this backend.
    fn liveness(&self) -> &Liveness;

    /// Atomic read of the liveness flag.
    fn is_alive(&self) -> bool {
        self.liveness().is_alive()
    }

    /// Relay `request` to this backend and return its response.
    fn forward(&self, request: Request<Body>) -> ForwardFuture<'_>;
}
