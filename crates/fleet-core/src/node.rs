// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Node configuration and runtime snapshot.

use crate::process::Process;
use serde::{Deserialize, Serialize};

/// A configured agent endpoint, as it appears in `config/nodelist.toml` or
/// the legacy `[[nodes]]` block of the main config file. No runtime state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeListEntry {
    pub name: String,
    #[serde(default)]
    pub environment: String,
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl NodeListEntry {
    /// Field-level validation; does not touch the network. `name` and
    /// `host` must be non-empty and `port` must be in `[1, 65535]` (always
    /// true for a `u16` other than zero).
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("node name must not be empty".to_string());
        }
        if self.host.trim().is_empty() {
            return Err(format!("node {}: host must not be empty", self.name));
        }
        if self.port == 0 {
            return Err(format!("node {}: port must be in 1..=65535", self.name));
        }
        Ok(())
    }
}

/// Read-only view of a node's exported fields. Credentials are never
/// included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub name: String,
    pub environment: String,
    pub host: String,
    pub port: u16,
    pub is_connected: bool,
    pub last_ping_epoch_ms: u64,
    pub processes: Vec<Process>,
}

impl NodeSnapshot {
    pub fn process_count(&self) -> usize {
        self.processes.len()
    }
}

#[cfg(test)]
#[path = "node_tests.rs"]
mod tests;
