// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `NodeHandle`: owns the mutable state of one configured agent endpoint.

use crate::governor::TimeoutGovernor;
use fleet_agent_client::AgentClient;
use fleet_core::{Clock, FleetError, LogSource, NodeSnapshot, Process};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

struct MutableState {
    is_connected: bool,
    last_ping_epoch_ms: u64,
    processes: Vec<Process>,
}

/// One NodeHandle per configured node. Connection state, last-ping time,
/// and the cached process list are guarded by a single reader/writer
/// lock; the network call that produces a new value is never made while
/// holding it.
pub struct NodeHandle {
    name: String,
    environment: String,
    host: String,
    port: u16,
    client: AgentClient,
    governor: Arc<TimeoutGovernor>,
    clock: Arc<dyn Clock>,
    state: RwLock<MutableState>,
}

impl NodeHandle {
    pub fn new(
        name: impl Into<String>,
        environment: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        client: AgentClient,
        governor: Arc<TimeoutGovernor>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            name: name.into(),
            environment: environment.into(),
            host: host.into(),
            port,
            client,
            governor,
            clock,
            state: RwLock::new(MutableState {
                is_connected: false,
                last_ping_epoch_ms: 0,
                processes: Vec::new(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn is_connected(&self) -> bool {
        self.state.read().is_connected
    }

    fn breaker_key(&self, verb: &str) -> String {
        format!("{verb}_{}", self.name)
    }

    /// Probe the agent via `GetAllProcessInfo`; on success marks the node
    /// connected and seeds the process cache, on failure marks it
    /// disconnected.
    pub async fn connect(&self, shutdown: &CancellationToken) -> Result<(), FleetError> {
        let client = self.client.clone();
        let timeout = self.governor.config().connect;
        let op = self.breaker_key("agent");
        let result = self
            .governor
            .call(&op, timeout, shutdown, move || {
                let client = client.clone();
                async move { client.get_all_process_info().await }
            })
            .await;
        let mut state = self.state.write();
        match result {
            Ok(processes) => {
                state.is_connected = true;
                state.last_ping_epoch_ms = self.clock.epoch_ms();
                state.processes = processes;
                Ok(())
            }
            Err(err) => {
                state.is_connected = false;
                Err(err)
            }
        }
    }

    /// Refetch and replace the cached process list. Refuses unless the
    /// node is currently marked connected.
    pub async fn refresh_processes(&self, shutdown: &CancellationToken) -> Result<(), FleetError> {
        if !self.is_connected() {
            return Err(FleetError::Connection(format!("{} is not connected", self.name)));
        }
        let client = self.client.clone();
        let timeout = self.governor.config().single_op;
        let op = self.breaker_key("refresh");
        let result = self
            .governor
            .call(&op, timeout, shutdown, move || {
                let client = client.clone();
                async move { client.get_all_process_info().await }
            })
            .await;
        match result {
            Ok(processes) => {
                let mut state = self.state.write();
                state.processes = processes;
                state.last_ping_epoch_ms = self.clock.epoch_ms();
                Ok(())
            }
            Err(err) => {
                self.state.write().is_connected = false;
                Err(err)
            }
        }
    }

    pub async fn start_process(
        &self,
        process: &str,
        shutdown: &CancellationToken,
    ) -> Result<(), FleetError> {
        let client = self.client.clone();
        let timeout = self.governor.config().single_op;
        let op = self.breaker_key(&format!("start_process_{process}"));
        let process = process.to_string();
        self.governor
            .call(&op, timeout, shutdown, move || {
                let client = client.clone();
                let process = process.clone();
                async move { client.start_process(&process).await }
            })
            .await
    }

    pub async fn stop_process(
        &self,
        process: &str,
        shutdown: &CancellationToken,
    ) -> Result<(), FleetError> {
        let client = self.client.clone();
        let timeout = self.governor.config().single_op;
        let op = self.breaker_key(&format!("stop_process_{process}"));
        let process = process.to_string();
        self.governor
            .call(&op, timeout, shutdown, move || {
                let client = client.clone();
                let process = process.clone();
                async move { client.stop_process(&process).await }
            })
            .await
    }

    /// Stop, pause for `restart_pause` (cooperatively, honoring
    /// shutdown), then start.
    pub async fn restart_process(
        &self,
        process: &str,
        shutdown: &CancellationToken,
    ) -> Result<(), FleetError> {
        self.stop_process(process, shutdown).await?;
        let pause = self.governor.config().restart_pause;
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => return Err(FleetError::Shutdown),
            _ = tokio::time::sleep(pause) => {}
        }
        self.start_process(process, shutdown).await
    }

    pub async fn get_process_log_tail(
        &self,
        process: &str,
        offset: i64,
        max_bytes: i64,
        source: LogSource,
        shutdown: &CancellationToken,
    ) -> Result<(Vec<u8>, i64, bool), FleetError> {
        let client = self.client.clone();
        let timeout = self.governor.config().single_op;
        let op = self.breaker_key(&format!("tail_{process}"));
        let process = process.to_string();
        self.governor
            .call(&op, timeout, shutdown, move || {
                let client = client.clone();
                let process = process.clone();
                async move {
                    match source {
                        LogSource::Stdout => client.tail_process_stdout_log(&process, offset, max_bytes).await,
                        LogSource::Stderr => client.tail_process_stderr_log(&process, offset, max_bytes).await,
                    }
                }
            })
            .await
    }

    /// Read-only view of the node's exported fields. Never exposes
    /// credentials (this type never holds them).
    pub fn snapshot(&self) -> NodeSnapshot {
        let state = self.state.read();
        NodeSnapshot {
            name: self.name.clone(),
            environment: self.environment.clone(),
            host: self.host.clone(),
            port: self.port,
            is_connected: state.is_connected,
            last_ping_epoch_ms: state.last_ping_epoch_ms,
            processes: state.processes.clone(),
        }
    }
}

#[cfg(test)]
#[path = "node_handle_tests.rs"]
mod tests;
