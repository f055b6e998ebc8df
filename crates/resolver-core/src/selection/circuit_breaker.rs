//! Circuit breaker guarding one provider instance.
//!
//! States:
//! - Closed: normal operation, attempts pass through
//! - Open: provider bypassed, selection skips it
//! - Half-Open: one probe attempt allowed through
//!
//! State transitions:
//! ```text
//! Closed → Open:      consecutive failures reach the threshold
//! Open → Half-Open:   cooldown elapsed, checked lazily on query
//! Half-Open → Closed: probe succeeds
//! Half-Open → Open:   probe fails
//! ```
//!
//! Half-open probing recovers from a provider outage automatically, without
//! operator action and without a retry storm against a service that is still
//! down.

use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tracing::{debug, warn};

const DEFAULT_FAILURE_THRESHOLD: u32 = 5;
const DEFAULT_COOLDOWN: Duration = Duration::from_secs(60);

/// Observable breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CircuitState {
    Closed = 0,
    Open = 1,
    HalfOpen = 2,
}

impl CircuitState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Open,
            2 => Self::HalfOpen,
            _ => Self::Closed,
        }
    }
}

/// Per-provider fault-tolerance state machine.
///
/// All transitions use compare-and-set on the state word, so concurrent
/// failures racing past the threshold record exactly one open transition.
pub struct CircuitBreaker {
    state: AtomicU8,
    consecutive_failures: AtomicU32,
    opened_at: RwLock<Option<Instant>>,
    failure_threshold: u32,
    cooldown: Duration,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new()
    }
}

impl CircuitBreaker {
    pub fn new() -> Self {
        Self::with_policy(DEFAULT_FAILURE_THRESHOLD, DEFAULT_COOLDOWN)
    }

    /// Breaker with custom policy knobs (threshold / cooldown).
    pub fn with_policy(failure_threshold: u32, cooldown: Duration) -> Self {
        Self {
            state: AtomicU8::new(CircuitState::Closed as u8),
            consecutive_failures: AtomicU32::new(0),
            opened_at: RwLock::new(None),
            failure_threshold,
            cooldown,
        }
    }

    /// Record a successful call: zero the failure streak and force Closed,
    /// whatever the current state.
    pub fn record_success(&self) {
        self.consecutive_failures.store(0, Ordering::Relaxed);
        self.state.store(CircuitState::Closed as u8, Ordering::Release);
    }

    /// Record a failed call. Once the streak reaches the threshold the
    /// circuit opens (from Closed or Half-Open) and the open time is stamped
    /// by whichever thread wins the transition.
    pub fn record_failure(&self) {
        let failures = self.consecutive_failures.fetch_add(1, Ordering::AcqRel) + 1;
        if failures < self.failure_threshold {
            return;
        }
        let opened = self.transition(CircuitState::Closed, CircuitState::Open)
            || self.transition(CircuitState::HalfOpen, CircuitState::Open);
        if opened {
            *self.opened_at.write() = Some(Instant::now());
            warn!(failures, "Circuit breaker opened");
        }
    }

    /// Whether the provider should currently be skipped.
    ///
    /// Side-effecting read: an Open circuit whose cooldown has elapsed
    /// transitions to Half-Open here (allowing one probe call through) and
    /// reports not-open.
    pub fn is_open(&self) -> bool {
        match self.current_state() {
            CircuitState::Closed => false,
            CircuitState::Open => {
                let cooled_down = self
                    .opened_at
                    .read()
                    .map(|at| at.elapsed() >= self.cooldown)
                    .unwrap_or(true);
                if cooled_down {
                    if self.transition(CircuitState::Open, CircuitState::HalfOpen) {
                        debug!("Circuit breaker half-open, probing");
                    }
                    return false;
                }
                true
            }
            // One trial call is allowed through.
            CircuitState::HalfOpen => false,
        }
    }

    pub fn current_state(&self) -> CircuitState {
        CircuitState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures.load(Ordering::Relaxed)
    }

    /// Force the breaker back to its initial state.
    pub fn reset(&self) {
        self.state.store(CircuitState::Closed as u8, Ordering::Release);
        self.consecutive_failures.store(0, Ordering::Relaxed);
        *self.opened_at.write() = None;
    }

    fn transition(&self, from: CircuitState, to: CircuitState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}
