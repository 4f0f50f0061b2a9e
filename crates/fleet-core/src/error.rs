// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The fleet-wide error taxonomy.

use thiserror::Error;

/// Every fallible public operation in the fleet core returns this type (or
/// a lower-level error that converts into it at the crate boundary).
#[derive(Debug, Error)]
pub enum FleetError {
    #[error("node not found: {0}")]
    NotFound(String),

    #[error("node already exists: {0}")]
    Conflict(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("agent fault {code}: {message}")]
    Fault { code: i64, message: String },

    #[error("circuit open for {0}")]
    CircuitOpen(String),

    #[error("fleet is shutting down")]
    Shutdown,

    #[error("validation error: {0}")]
    Validation(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl FleetError {
    /// Whether the `TimeoutGovernor`'s retry loop should attempt this
    /// operation again. Decided centrally here rather than at each call
    /// site, so retry policy cannot drift between callers.
    pub fn retryable(&self) -> bool {
        match self {
            FleetError::Connection(_) | FleetError::Timeout(_) => true,
            FleetError::Fault { code, .. } => {
                // BAD_NAME/ALREADY_STARTED/NOT_RUNNING are not transient.
                !matches!(code, 10 | 60 | 70)
            }
            FleetError::NotFound(_)
            | FleetError::Conflict(_)
            | FleetError::Unauthorized(_)
            | FleetError::CircuitOpen(_)
            | FleetError::Shutdown
            | FleetError::Validation(_)
            | FleetError::Internal(_) => false,
        }
    }

    /// True for the two idempotent agent faults the wire client must
    /// swallow before they ever reach the retry classifier.
    pub fn is_idempotent_fault(&self, needle: &str) -> bool {
        matches!(self, FleetError::Fault { message, .. } if message.contains(needle))
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
