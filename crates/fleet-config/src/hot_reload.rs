// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ties `ConfigLoader` to two independent file watchers, atomically
//! swapping the live configuration and reporting which nodes came and went.

use crate::error::ConfigError;
use crate::loader::ConfigLoader;
use crate::model::FleetConfig;
use crate::watcher::FileWatcher;
use fleet_core::NodeListEntry;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Default interval between polls of the underlying file watchers.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Notified when a reload changes the set of configured nodes.
pub trait NodeListObserver: Send + Sync {
    fn on_nodes_changed(&self, added: Vec<NodeListEntry>, removed: Vec<NodeListEntry>);
}

pub struct HotReloader {
    system_path: PathBuf,
    node_list_path: Option<PathBuf>,
    current: RwLock<Arc<FleetConfig>>,
}

impl HotReloader {
    /// Perform the initial load (fatal errors propagate) and return the
    /// reloader plus any non-fatal warnings from that first load.
    pub fn new(system_path: impl Into<PathBuf>, node_list_path: Option<PathBuf>) -> Result<(Self, Vec<String>), ConfigError> {
        let system_path = system_path.into();
        let initial = ConfigLoader::load(&system_path, node_list_path.as_deref())?;
        Ok((
            Self {
                system_path,
                node_list_path,
                current: RwLock::new(Arc::new(initial.config)),
            },
            initial.warnings,
        ))
    }

    pub fn current(&self) -> Arc<FleetConfig> {
        self.current.read().clone()
    }

    /// Spawn the background poll loop. Exits on `shutdown`.
    pub fn start(
        self: Arc<Self>,
        observer: Arc<dyn NodeListObserver>,
        poll_interval: Duration,
        shutdown: CancellationToken,
    ) -> Result<(), ConfigError> {
        let system_watcher = FileWatcher::new(&self.system_path)?;
        let node_list_watcher = self.node_list_path.as_ref().map(FileWatcher::new).transpose()?;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        let system_changed = system_watcher.poll_changed();
                        let node_list_changed = node_list_watcher
                            .as_ref()
                            .map(FileWatcher::poll_changed)
                            .unwrap_or(false);
                        if system_changed || node_list_changed {
                            self.reload(&observer);
                        }
                    }
                }
            }
        });
        Ok(())
    }

    /// Reload synchronously; used directly by tests and by the background
    /// loop. A failed reload logs and leaves the current configuration in
    /// place.
    pub fn reload(&self, observer: &Arc<dyn NodeListObserver>) {
        match ConfigLoader::load(&self.system_path, self.node_list_path.as_deref()) {
            Ok(result) => {
                for warning in &result.warnings {
                    tracing::warn!("{warning}");
                }
                let previous = self.current.read().clone();
                let new_names: HashSet<&str> = result.config.nodes.iter().map(|n| n.name.as_str()).collect();
                let old_names: HashSet<&str> = previous.nodes.iter().map(|n| n.name.as_str()).collect();
                let added: Vec<NodeListEntry> = result
                    .config
                    .nodes
                    .iter()
                    .filter(|n| !old_names.contains(n.name.as_str()))
                    .cloned()
                    .collect();
                let removed: Vec<NodeListEntry> = previous
                    .nodes
                    .iter()
                    .filter(|n| !new_names.contains(n.name.as_str()))
                    .cloned()
                    .collect();
                *self.current.write() = Arc::new(result.config);
                if !added.is_empty() || !removed.is_empty() {
                    observer.on_nodes_changed(added, removed);
                }
            }
            Err(err) => {
                tracing::error!(error = %err, "config reload failed, keeping current configuration");
            }
        }
    }
}

#[cfg(test)]
#[path = "hot_reload_tests.rs"]
mod tests;
