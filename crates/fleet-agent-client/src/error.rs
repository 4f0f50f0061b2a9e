// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire-level errors, upstream of the fleet-wide [`fleet_core::FleetError`].

use fleet_core::FleetError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("http error: {0}")]
    Http(String),

    #[error("request timed out")]
    Timeout,

    #[error("unexpected status {0}")]
    BadStatus(u16),

    #[error("malformed xml-rpc response: {0}")]
    Xml(String),

    #[error("agent fault {code}: {message}")]
    Fault { code: i64, message: String },
}

impl From<TransportError> for FleetError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Http(msg) => FleetError::Connection(msg),
            TransportError::Timeout => FleetError::Timeout(std::time::Duration::default()),
            TransportError::BadStatus(code) => {
                FleetError::Connection(format!("unexpected HTTP status {code}"))
            }
            TransportError::Xml(msg) => FleetError::Connection(format!("xml-rpc: {msg}")),
            TransportError::Fault { code, message } => FleetError::Fault { code, message },
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
