//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request
//!     → router.rs (Router::handle)
//!     → load_balancer pool: next live backend
//!     → Backend::forward
//!     → Response, or ProxyError (503 / 502 / 504)
//! ```
//!
//! # Design Decisions
//! - Every request is eligible for every backend (no content-based routing)
//! - Errors are values; the HTTP layer maps them to status codes

pub mod router;

pub use router::{ProxyError, Router};
