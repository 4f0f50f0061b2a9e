// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bridges `fleet-config`'s hot-reload notifications to `FleetService`'s
//! node map.

use crate::facade::FleetService;
use fleet_config::NodeListObserver;
use fleet_core::NodeListEntry;
use std::sync::Arc;
use tracing::{info, warn};

/// Applies node-list diffs computed by `HotReloader` to a running
/// `FleetService`. Additions that fail validation or collide with an
/// existing name are logged and skipped rather than aborting the batch;
/// removals of names the service no longer knows about are silently
/// ignored (they may have already been removed by a prior reload).
pub struct FleetReloadObserver {
    service: Arc<FleetService>,
}

impl FleetReloadObserver {
    pub fn new(service: Arc<FleetService>) -> Self {
        Self { service }
    }
}

impl NodeListObserver for FleetReloadObserver {
    fn on_nodes_changed(&self, added: Vec<NodeListEntry>, removed: Vec<NodeListEntry>) {
        for entry in &removed {
            if let Err(err) = self.service.remove_node(&entry.name) {
                warn!(node = %entry.name, error = %err, "reload: failed to remove node");
            } else {
                info!(node = %entry.name, "reload: removed node");
            }
        }
        for entry in &added {
            if let Err(err) = self.service.add_node(entry) {
                warn!(node = %entry.name, error = %err, "reload: failed to add node");
            } else {
                info!(node = %entry.name, "reload: added node");
            }
        }
    }
}

#[cfg(test)]
#[path = "reload_tests.rs"]
mod tests;
