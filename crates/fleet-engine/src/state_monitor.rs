// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `StateMonitor`: periodic node polling and transition classification.

use crate::node_handle::NodeHandle;
use fleet_core::{ActivityEvent, ActivityLevel, ActivityLogSink, ProcessState};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

/// Anything that can hand the monitor a point-in-time list of the node
/// handles it should poll this tick. Implemented by whatever owns the
/// fleet's node map; the monitor never touches that lock itself.
pub trait NodeSource: Send + Sync {
    fn snapshot(&self) -> Vec<Arc<NodeHandle>>;
}

impl NodeSource for parking_lot::RwLock<Vec<Arc<NodeHandle>>> {
    fn snapshot(&self) -> Vec<Arc<NodeHandle>> {
        self.read().clone()
    }
}

#[derive(Debug, Clone)]
pub struct StateMonitorConfig {
    pub interval: Duration,
}

impl Default for StateMonitorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
        }
    }
}

/// Classify a process's old/new state pair into the event it warrants.
fn classify_process_transition(previous: ProcessState, current: ProcessState) -> (ActivityLevel, &'static str) {
    if current == ProcessState::Running {
        (ActivityLevel::Info, "process_started")
    } else if current == ProcessState::Stopped && previous == ProcessState::Running {
        (ActivityLevel::Warning, "process_stopped")
    } else if matches!(current, ProcessState::Exited | ProcessState::Fatal) {
        (ActivityLevel::Error, "process_failed")
    } else {
        (ActivityLevel::Info, "process_state_changed")
    }
}

pub struct StateMonitor {
    config: StateMonitorConfig,
}

impl StateMonitor {
    pub fn new(config: StateMonitorConfig) -> Self {
        Self { config }
    }

    /// Spawn the polling task. Returns a stop handle independent of the
    /// global `shutdown` token — dropping or firing either ends the loop.
    pub fn start(
        &self,
        source: Arc<dyn NodeSource>,
        sink: Arc<dyn ActivityLogSink>,
        shutdown: CancellationToken,
    ) -> oneshot::Sender<()> {
        let (stop_tx, mut stop_rx) = oneshot::channel();
        let interval = self.config.interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            let mut connected: HashMap<String, bool> = HashMap::new();
            let mut process_states: HashMap<(String, String), ProcessState> = HashMap::new();
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => break,
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        Self::tick_once(&source, &sink, &shutdown, &mut connected, &mut process_states).await;
                    }
                }
            }
        });
        stop_tx
    }

    /// One poll of every node currently in `source`. Exposed separately
    /// from `start` so tests can drive it deterministically instead of
    /// racing a real ticker.
    pub async fn tick_once(
        source: &Arc<dyn NodeSource>,
        sink: &Arc<dyn ActivityLogSink>,
        shutdown: &CancellationToken,
        connected: &mut HashMap<String, bool>,
        process_states: &mut HashMap<(String, String), ProcessState>,
    ) {
        for handle in source.snapshot() {
            let was_connected = connected.get(handle.name()).copied().unwrap_or(false);
            let result = if handle.is_connected() {
                handle.refresh_processes(shutdown).await
            } else {
                handle.connect(shutdown).await
            };
            let now_connected = result.is_ok();
            if now_connected && !was_connected {
                sink.record(ActivityEvent::new(
                    ActivityLevel::Info,
                    "node_connected",
                    "node",
                    handle.name(),
                    format!("node {} connected", handle.name()),
                ));
            } else if !now_connected && was_connected {
                sink.record(ActivityEvent::new(
                    ActivityLevel::Warning,
                    "node_disconnected",
                    "node",
                    handle.name(),
                    format!("node {} disconnected", handle.name()),
                ));
            }
            connected.insert(handle.name().to_string(), now_connected);

            if !now_connected {
                continue;
            }
            for process in handle.snapshot().processes {
                let key = (handle.name().to_string(), process.name.clone());
                match process_states.get(&key).copied() {
                    None => {
                        process_states.insert(key, process.state);
                    }
                    Some(previous) if previous != process.state => {
                        let (level, action) = classify_process_transition(previous, process.state);
                        sink.record(
                            ActivityEvent::new(
                                level,
                                action,
                                "process",
                                format!("{}/{}", handle.name(), process.name),
                                format!("{} transitioned {} -> {}", process.name, previous, process.state),
                            )
                            .with_extra("node", handle.name())
                            .with_extra("process", &process.name),
                        );
                        process_states.insert(key, process.state);
                    }
                    Some(_) => {}
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "state_monitor_tests.rs"]
mod tests;
