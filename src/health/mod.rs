//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (active.rs):
//!     Periodic timer
//!     → Probe each backend
//!     → state.rs decides on a transition
//!     → Backend liveness flag written
//! ```
//!
//! # Design Decisions
//! - Selection never computes health; it only reads the flag
//! - Request forwarding failures do not feed health state
//! - State transitions require consecutive successes/failures

pub mod active;
pub mod state;

pub use active::HealthMonitor;
pub use state::HealthTracker;
