// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ConfigLoader`: reads, expands, merges, and validates the two
//! configuration files the fleet is built from.

use crate::env_expand;
use crate::error::ConfigError;
use crate::model::{FleetConfig, NodeListFile, SystemConfigFile};
use fleet_core::NodeListEntry;
use std::collections::{HashMap, HashSet};
use std::path::Path;

pub struct LoadResult {
    pub config: FleetConfig,
    pub warnings: Vec<String>,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load and merge the system config (required) and node-list
    /// (optional) files. A missing node-list path means zero extra nodes,
    /// not an error; a missing system config path is fatal.
    pub fn load(system_path: &Path, node_list_path: Option<&Path>) -> Result<LoadResult, ConfigError> {
        let mut warnings = Vec::new();

        let system_text =
            std::fs::read_to_string(system_path).map_err(|source| ConfigError::Read {
                path: system_path.to_path_buf(),
                source,
            })?;
        let system_expanded = env_expand::expand(&system_text, &mut warnings);
        let system: SystemConfigFile = toml::from_str(&system_expanded).map_err(|e| ConfigError::Parse {
            path: system_path.to_path_buf(),
            message: e.to_string(),
        })?;

        let node_list_nodes = match node_list_path {
            Some(path) if path.exists() => {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                let expanded = env_expand::expand(&text, &mut warnings);
                let file: NodeListFile = toml::from_str(&expanded).map_err(|e| ConfigError::ParseNodeList {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                file.nodes
            }
            _ => Vec::new(),
        };

        let node_list_display = node_list_path.unwrap_or_else(|| Path::new("<no node-list configured>"));
        let (valid_node_list, mut node_list_warnings) = Self::validate_nodes(node_list_display, node_list_nodes);
        let (valid_system_nodes, mut system_warnings) = Self::validate_nodes(system_path, system.nodes.clone());
        warnings.append(&mut node_list_warnings);
        warnings.append(&mut system_warnings);

        let nodes = Self::merge(valid_node_list, valid_system_nodes, &mut warnings);

        Ok(LoadResult {
            config: FleetConfig {
                server: system.server,
                admin: system.admin,
                performance: system.performance,
                database_path: system.database_path,
                nodes,
            },
            warnings,
        })
    }

    /// Drop entries that fail field validation or repeat a name already
    /// seen within the same file, recording a warning for each.
    fn validate_nodes(source_path: &Path, nodes: Vec<NodeListEntry>) -> (Vec<NodeListEntry>, Vec<String>) {
        let mut valid = Vec::new();
        let mut warnings = Vec::new();
        let mut seen = HashSet::new();
        for node in nodes {
            if !seen.insert(node.name.clone()) {
                warnings.push(format!(
                    "{}: duplicate node name {} — first occurrence wins",
                    source_path.display(),
                    node.name
                ));
                continue;
            }
            match node.validate() {
                Ok(()) => valid.push(node),
                Err(message) => warnings.push(format!("{}: {message}", source_path.display())),
            }
        }
        (valid, warnings)
    }

    /// Node-list entries first, then system-config entries whose name is
    /// not already present. On a name collision the node-list entry wins.
    fn merge(node_list: Vec<NodeListEntry>, system_nodes: Vec<NodeListEntry>, warnings: &mut Vec<String>) -> Vec<NodeListEntry> {
        let mut order = Vec::new();
        let mut by_name: HashMap<String, NodeListEntry> = HashMap::new();
        for node in node_list {
            order.push(node.name.clone());
            by_name.insert(node.name.clone(), node);
        }
        for node in system_nodes {
            if by_name.contains_key(&node.name) {
                warnings.push(format!(
                    "node {} present in both node-list and system config — node-list entry wins",
                    node.name
                ));
                continue;
            }
            order.push(node.name.clone());
            by_name.insert(node.name.clone(), node);
        }
        order.into_iter().filter_map(|name| by_name.remove(&name)).collect()
    }
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
