//! Backend health state machine.
//!
//! # States
//! - Alive: backend is eligible for selection
//! - Dead: backend is skipped by the pool
//!
//! # State Transitions
//! ```text
//! Alive → Dead: consecutive failures >= unhealthy_threshold
//! Dead → Alive: consecutive successes >= healthy_threshold
//! ```
//!
//! # Design Decisions
//! - Hysteresis prevents flapping
//! - The tracker only decides; the monitor writes the liveness flag
//! - Counters reset on state transition

use crate::load_balancer::LivenessState;

/// Consecutive probe outcomes for one backend.
#[derive(Debug, Clone)]
pub struct HealthTracker {
    healthy_threshold: u32,
    unhealthy_threshold: u32,
    consecutive_successes: u32,
    consecutive_failures: u32,
}

impl HealthTracker {
    pub fn new(healthy_threshold: u32, unhealthy_threshold: u32) -> Self {
        Self {
            healthy_threshold: healthy_threshold.max(1),
            unhealthy_threshold: unhealthy_threshold.max(1),
            consecutive_successes: 0,
            consecutive_failures: 0,
        }
    }

    /// Record a probe outcome for a backend currently in `current`.
    ///
    /// Returns the new state when a threshold is crossed.
    pub fn record(&mut self, current: LivenessState, success: bool) -> Option<LivenessState> {
        if success {
            self.consecutive_failures = 0;
            if current == LivenessState::Alive {
                self.consecutive_successes = 0;
                return None;
            }
            self.consecutive_successes += 1;
            if self.consecutive_successes >= self.healthy_threshold {
                self.consecutive_successes = 0;
                return Some(LivenessState::Alive);
            }
        } else {
            self.consecutive_successes = 0;
            if current == LivenessState::Dead {
                self.consecutive_failures = 0;
                return None;
            }
            self.consecutive_failures += 1;
            if self.consecutive_failures >= self.unhealthy_threshold {
                self.consecutive_failures = 0;
                return Some(LivenessState::Dead);
            }
        }
        None
    }
}
