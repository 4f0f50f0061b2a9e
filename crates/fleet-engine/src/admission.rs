// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fleet-wide concurrency admission gate.

use fleet_core::FleetError;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

/// Default number of concurrent outbound agent operations the fleet allows.
pub const DEFAULT_CAPACITY: usize = 100;

/// A bounded counting semaphore every outbound agent call acquires a
/// permit from before starting transport. Shutdown-aware: once the given
/// cancellation token fires, acquisition fails immediately rather than
/// queuing behind already-admitted callers.
#[derive(Clone)]
pub struct AdmissionGate {
    semaphore: Arc<Semaphore>,
    shutdown: CancellationToken,
}

/// Held permit; releases its slot on drop.
pub struct Admission {
    _permit: tokio::sync::OwnedSemaphorePermit,
}

impl AdmissionGate {
    pub fn new(capacity: usize, shutdown: CancellationToken) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            shutdown,
        }
    }

    pub fn with_default_capacity(shutdown: CancellationToken) -> Self {
        Self::new(DEFAULT_CAPACITY, shutdown)
    }

    /// Acquire one permit, or fail immediately with `FleetError::Shutdown`
    /// if the fleet has begun shutting down.
    pub async fn acquire(&self) -> Result<Admission, FleetError> {
        if self.shutdown.is_cancelled() {
            return Err(FleetError::Shutdown);
        }
        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => Err(FleetError::Shutdown),
            permit = self.semaphore.clone().acquire_owned() => {
                let permit = permit.map_err(|_| FleetError::Internal("admission gate closed".into()))?;
                Ok(Admission { _permit: permit })
            }
        }
    }

    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }
}

#[cfg(test)]
#[path = "admission_tests.rs"]
mod tests;
