// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On-disk configuration shapes.

use fleet_core::NodeListEntry;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    9100
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: default_port() }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AdminCredentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PerformanceConfig {
    #[serde(default = "default_max_concurrent_connections")]
    pub max_concurrent_connections: usize,
}

fn default_max_concurrent_connections() -> usize {
    100
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            max_concurrent_connections: default_max_concurrent_connections(),
        }
    }
}

/// Shape of the required system config file: server, admin, performance,
/// plus an optional legacy `[[nodes]]` block.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SystemConfigFile {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub admin: AdminCredentials,
    #[serde(default)]
    pub performance: PerformanceConfig,
    #[serde(default)]
    pub database_path: Option<String>,
    #[serde(default, rename = "nodes")]
    pub nodes: Vec<NodeListEntry>,
}

/// Shape of the optional node-list file: only `[[nodes]]`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NodeListFile {
    #[serde(default, rename = "nodes")]
    pub nodes: Vec<NodeListEntry>,
}

/// The fully merged, validated, environment-expanded configuration.
#[derive(Debug, Clone)]
pub struct FleetConfig {
    pub server: ServerConfig,
    pub admin: AdminCredentials,
    pub performance: PerformanceConfig,
    pub database_path: Option<String>,
    pub nodes: Vec<NodeListEntry>,
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;
