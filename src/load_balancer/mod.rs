//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     BackendConfig[] → forward.rs (parse target, bind client)
//!     → pool.rs (fixed ordered pool, cursor at 0)
//!
//! Per request:
//!     pool.rs next_live() (round robin, skip dead, bounded scan)
//!     → backend.rs Backend::forward()
//!     → forward.rs (rewrite, send upstream, stream response back)
//! ```
//!
//! # Design Decisions
//! - Pool composition is fixed after construction
//! - Cursor is private and advanced with compare-and-swap only
//! - Liveness is read here and written by health and admin collaborators
//! - Selection holds no lock while forwarding

pub mod backend;
pub mod error;
pub mod forward;
pub mod pool;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::{Backend, ForwardFuture, Liveness, LivenessState};
pub use error::{BuildError, ForwardError, NoLiveBackend};
pub use forward::{build_client, health_uri, HttpBackend, UpstreamClient};
pub use pool::BackendPool;
