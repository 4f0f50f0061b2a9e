// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-target circuit breaker.

use fleet_core::{Clock, CircuitState};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

struct BreakerEntry {
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
}

impl Default for BreakerEntry {
    fn default() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            opened_at: None,
        }
    }
}

/// Isolates repeatedly-failing targets without a keyed entry ever
/// affecting another key's state. Keys are caller-chosen strings (an
/// operation name, `agent_<node>`, etc).
pub struct CircuitBreakerRegistry {
    max_failures: u32,
    reset_timeout: Duration,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, BreakerEntry>>,
}

impl CircuitBreakerRegistry {
    pub fn new(max_failures: u32, reset_timeout: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            max_failures,
            reset_timeout,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Current state of `key`, applying the OPEN -> HALF_OPEN transition
    /// if `reset_timeout` has elapsed since the breaker opened.
    pub fn state(&self, key: &str) -> CircuitState {
        let mut entries = self.entries.lock();
        let entry = entries.entry(key.to_string()).or_default();
        self.maybe_half_open(entry);
        entry.state
    }

    fn maybe_half_open(&self, entry: &mut BreakerEntry) {
        if entry.state == CircuitState::Open {
            if let Some(opened_at) = entry.opened_at {
                if self.clock.monotonic().duration_since(opened_at) >= self.reset_timeout {
                    entry.state = CircuitState::HalfOpen;
                }
            }
        }
    }

    /// Whether a call keyed on `key` should be admitted right now.
    pub fn allow(&self, key: &str) -> bool {
        !matches!(self.state(key), CircuitState::Open)
    }

    /// Record a successful call: in HALF_OPEN this closes the breaker and
    /// resets the failure counter; in CLOSED it just resets the counter.
    pub fn record_success(&self, key: &str) {
        let mut entries = self.entries.lock();
        let entry = entries.entry(key.to_string()).or_default();
        entry.state = CircuitState::Closed;
        entry.consecutive_failures = 0;
        entry.opened_at = None;
    }

    /// Record a failed call. Opens the breaker once `consecutive_failures`
    /// reaches `max_failures`; a failure while HALF_OPEN immediately
    /// reopens it.
    pub fn record_failure(&self, key: &str) {
        let mut entries = self.entries.lock();
        let entry = entries.entry(key.to_string()).or_default();
        match entry.state {
            CircuitState::HalfOpen => {
                entry.state = CircuitState::Open;
                entry.opened_at = Some(self.clock.monotonic());
            }
            CircuitState::Closed | CircuitState::Open => {
                entry.consecutive_failures += 1;
                if entry.consecutive_failures >= self.max_failures {
                    entry.state = CircuitState::Open;
                    entry.opened_at = Some(self.clock.monotonic());
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "breaker_tests.rs"]
mod tests;
