// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `FleetService`: the façade the enclosing application drives — node
//! lifecycle, bulk/group process operations, log tailing, health, and
//! coordinated shutdown.

use fleet_agent_client::{AgentClient, AgentTransport};
use fleet_core::{
    ActivityLogSink, Clock, FleetError, LogSource, NodeListEntry, NodeSnapshot, Process, SubscriberId,
};
use fleet_engine::{
    AdmissionGate, GovernorConfig, LogEntry, LogTailHub, LogTailHubConfig, NodeHandle, NodeSource, StateMonitor,
    StateMonitorConfig, TimeoutGovernor,
};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct FleetServiceConfig {
    pub governor: GovernorConfig,
    pub admission_capacity: usize,
    pub state_monitor: StateMonitorConfig,
    pub log_tail_hub: LogTailHubConfig,
    /// How long `stop` waits for background tasks to notice cancellation
    /// before proceeding with cleanup regardless.
    pub shutdown_grace: Duration,
}

impl Default for FleetServiceConfig {
    fn default() -> Self {
        Self {
            governor: GovernorConfig::default(),
            admission_capacity: fleet_engine::DEFAULT_CAPACITY,
            state_monitor: StateMonitorConfig::default(),
            log_tail_hub: LogTailHubConfig::default(),
            shutdown_grace: Duration::from_millis(200),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Clone)]
pub struct Health {
    pub status: HealthStatus,
    pub total_nodes: usize,
    pub connected_nodes: usize,
}

/// One process on one node, surfaced by a group-wide query.
#[derive(Debug, Clone)]
pub struct GroupMember {
    pub node: String,
    pub process: Process,
}

/// Wraps the node map so `StateMonitor` can poll it without ever touching
/// the map's lock itself (`NodeSource` is defined in `fleet-engine`; this
/// newtype is what lets us implement it here over a `HashMap`-keyed map).
struct NodeMapSource(Arc<RwLock<HashMap<String, Arc<NodeHandle>>>>);

impl NodeSource for NodeMapSource {
    fn snapshot(&self) -> Vec<Arc<NodeHandle>> {
        self.0.read().values().cloned().collect()
    }
}

pub struct FleetService {
    nodes: Arc<RwLock<HashMap<String, Arc<NodeHandle>>>>,
    transport: Arc<dyn AgentTransport>,
    governor: Arc<TimeoutGovernor>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn ActivityLogSink>,
    log_hub: Arc<LogTailHub>,
    state_monitor: StateMonitor,
    monitor_stop: parking_lot::Mutex<Option<oneshot::Sender<()>>>,
    shutdown: CancellationToken,
    shutdown_grace: Duration,
}

impl FleetService {
    pub fn new(
        config: FleetServiceConfig,
        transport: Arc<dyn AgentTransport>,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn ActivityLogSink>,
    ) -> Self {
        let shutdown = CancellationToken::new();
        let admission = AdmissionGate::new(config.admission_capacity, shutdown.clone());
        let governor = Arc::new(TimeoutGovernor::new(config.governor, admission, clock.clone()));
        Self {
            nodes: Arc::new(RwLock::new(HashMap::new())),
            transport,
            governor,
            clock: clock.clone(),
            sink,
            log_hub: Arc::new(LogTailHub::new(config.log_tail_hub, clock)),
            state_monitor: StateMonitor::new(config.state_monitor),
            monitor_stop: parking_lot::Mutex::new(None),
            shutdown,
            shutdown_grace: config.shutdown_grace,
        }
    }

    fn check_shutdown(&self) -> Result<(), FleetError> {
        if self.shutdown.is_cancelled() {
            return Err(FleetError::Shutdown);
        }
        Ok(())
    }

    /// Register a node from configuration. Does not contact the agent;
    /// `StateMonitor` (or an explicit `connect`) establishes the
    /// connection on its own schedule.
    pub fn add_node(&self, entry: &NodeListEntry) -> Result<(), FleetError> {
        self.check_shutdown()?;
        entry.validate().map_err(FleetError::Validation)?;
        let mut nodes = self.nodes.write();
        if nodes.contains_key(&entry.name) {
            return Err(FleetError::Conflict(entry.name.clone()));
        }
        let client = AgentClient::new(
            &entry.host,
            entry.port,
            entry.username.as_deref(),
            entry.password.as_deref(),
            self.transport.clone(),
        );
        let handle = Arc::new(NodeHandle::new(
            entry.name.clone(),
            entry.environment.clone(),
            entry.host.clone(),
            entry.port,
            client,
            self.governor.clone(),
            self.clock.clone(),
        ));
        nodes.insert(entry.name.clone(), handle);
        Ok(())
    }

    pub fn remove_node(&self, name: &str) -> Result<(), FleetError> {
        self.check_shutdown()?;
        self.nodes
            .write()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| FleetError::NotFound(name.to_string()))
    }

    pub fn get_node(&self, name: &str) -> Result<NodeSnapshot, FleetError> {
        self.check_shutdown()?;
        self.nodes
            .read()
            .get(name)
            .map(|handle| handle.snapshot())
            .ok_or_else(|| FleetError::NotFound(name.to_string()))
    }

    pub fn get_all_nodes(&self) -> Result<Vec<NodeSnapshot>, FleetError> {
        self.check_shutdown()?;
        Ok(self.nodes.read().values().map(|h| h.snapshot()).collect())
    }

    pub fn get_environments(&self) -> Result<Vec<String>, FleetError> {
        self.check_shutdown()?;
        let mut seen = Vec::new();
        for handle in self.nodes.read().values() {
            let env = handle.environment().to_string();
            if !seen.contains(&env) {
                seen.push(env);
            }
        }
        Ok(seen)
    }

    pub fn get_environment_details(&self, environment: &str) -> Result<Vec<NodeSnapshot>, FleetError> {
        self.check_shutdown()?;
        Ok(self
            .nodes
            .read()
            .values()
            .filter(|h| h.environment() == environment)
            .map(|h| h.snapshot())
            .collect())
    }

    pub fn get_groups(&self) -> Result<Vec<String>, FleetError> {
        self.check_shutdown()?;
        let mut seen = Vec::new();
        for handle in self.nodes.read().values() {
            for process in handle.snapshot().processes {
                if !seen.contains(&process.group) {
                    seen.push(process.group);
                }
            }
        }
        Ok(seen)
    }

    pub fn get_group_details(&self, group: &str, environment: Option<&str>) -> Result<Vec<GroupMember>, FleetError> {
        self.check_shutdown()?;
        let mut members = Vec::new();
        for handle in self.nodes.read().values() {
            if environment.is_some_and(|env| handle.environment() != env) {
                continue;
            }
            for process in handle.snapshot().processes {
                if process.group == group {
                    members.push(GroupMember {
                        node: handle.name().to_string(),
                        process,
                    });
                }
            }
        }
        Ok(members)
    }

    fn handle(&self, node: &str) -> Result<Arc<NodeHandle>, FleetError> {
        self.nodes
            .read()
            .get(node)
            .cloned()
            .ok_or_else(|| FleetError::NotFound(node.to_string()))
    }

    pub async fn start_process(&self, node: &str, process: &str) -> Result<(), FleetError> {
        self.check_shutdown()?;
        self.handle(node)?.start_process(process, &self.shutdown).await
    }

    pub async fn stop_process(&self, node: &str, process: &str) -> Result<(), FleetError> {
        self.check_shutdown()?;
        self.handle(node)?.stop_process(process, &self.shutdown).await
    }

    pub async fn restart_process(&self, node: &str, process: &str) -> Result<(), FleetError> {
        self.check_shutdown()?;
        self.handle(node)?.restart_process(process, &self.shutdown).await
    }

    /// `StartAllProcesses`/`StopAllProcesses`/`RestartAllProcesses`:
    /// applies `action` to every process currently cached for `node`,
    /// concurrently, returning one result per process in no particular
    /// order.
    async fn for_each_process_on_node<F, Fut>(
        &self,
        node: &str,
        action: F,
    ) -> Result<Vec<(String, Result<(), FleetError>)>, FleetError>
    where
        F: Fn(Arc<NodeHandle>, String, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<(), FleetError>> + Send + 'static,
    {
        self.check_shutdown()?;
        let handle = self.handle(node)?;
        let processes: Vec<String> = handle.snapshot().processes.into_iter().map(|p| p.name).collect();
        let action = Arc::new(action);
        let mut joins = tokio::task::JoinSet::new();
        for name in processes {
            let handle = handle.clone();
            let action = action.clone();
            let shutdown = self.shutdown.clone();
            let name_for_result = name.clone();
            joins.spawn(async move { (name_for_result, action(handle, name, shutdown).await) });
        }
        let mut results = Vec::new();
        while let Some(joined) = joins.join_next().await {
            if let Ok(pair) = joined {
                results.push(pair);
            }
        }
        Ok(results)
    }

    pub async fn start_all_processes(&self, node: &str) -> Result<Vec<(String, Result<(), FleetError>)>, FleetError> {
        self.for_each_process_on_node(node, |handle, name, shutdown| async move {
            handle.start_process(&name, &shutdown).await
        })
        .await
    }

    pub async fn stop_all_processes(&self, node: &str) -> Result<Vec<(String, Result<(), FleetError>)>, FleetError> {
        self.for_each_process_on_node(node, |handle, name, shutdown| async move {
            handle.stop_process(&name, &shutdown).await
        })
        .await
    }

    pub async fn restart_all_processes(&self, node: &str) -> Result<Vec<(String, Result<(), FleetError>)>, FleetError> {
        self.for_each_process_on_node(node, |handle, name, shutdown| async move {
            handle.restart_process(&name, &shutdown).await
        })
        .await
    }

    /// `Start/Stop/RestartGroupProcesses`: applies `action` to every
    /// `(node, process)` pair whose process belongs to `group`, optionally
    /// narrowed to one environment.
    async fn for_each_in_group<F, Fut>(
        &self,
        group: &str,
        environment: Option<&str>,
        action: F,
    ) -> Result<Vec<(String, String, Result<(), FleetError>)>, FleetError>
    where
        F: Fn(Arc<NodeHandle>, String, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<(), FleetError>> + Send + 'static,
    {
        self.check_shutdown()?;
        let members = self.get_group_details(group, environment)?;
        let action = Arc::new(action);
        let mut joins = tokio::task::JoinSet::new();
        for member in members {
            let handle = self.handle(&member.node)?;
            let action = action.clone();
            let shutdown = self.shutdown.clone();
            let node = member.node.clone();
            let process = member.process.name.clone();
            joins.spawn(async move {
                let result = action(handle, process.clone(), shutdown).await;
                (node, process, result)
            });
        }
        let mut results = Vec::new();
        while let Some(joined) = joins.join_next().await {
            if let Ok(triple) = joined {
                results.push(triple);
            }
        }
        Ok(results)
    }

    pub async fn start_group_processes(
        &self,
        group: &str,
        environment: Option<&str>,
    ) -> Result<Vec<(String, String, Result<(), FleetError>)>, FleetError> {
        self.for_each_in_group(group, environment, |handle, name, shutdown| async move {
            handle.start_process(&name, &shutdown).await
        })
        .await
    }

    pub async fn stop_group_processes(
        &self,
        group: &str,
        environment: Option<&str>,
    ) -> Result<Vec<(String, String, Result<(), FleetError>)>, FleetError> {
        self.for_each_in_group(group, environment, |handle, name, shutdown| async move {
            handle.stop_process(&name, &shutdown).await
        })
        .await
    }

    pub async fn restart_group_processes(
        &self,
        group: &str,
        environment: Option<&str>,
    ) -> Result<Vec<(String, String, Result<(), FleetError>)>, FleetError> {
        self.for_each_in_group(group, environment, |handle, name, shutdown| async move {
            handle.restart_process(&name, &shutdown).await
        })
        .await
    }

    /// One-shot convenience: fetch the log content currently available for
    /// `(node, process)` without keeping a standing subscription. Starts
    /// from the beginning of the file so existing content is returned, not
    /// just lines written after the call starts. Used by the CLI's `tail`
    /// command.
    pub async fn get_process_logs(
        &self,
        node: &str,
        process: &str,
        source: LogSource,
    ) -> Result<Vec<LogEntry>, FleetError> {
        self.check_shutdown()?;
        let handle = self.handle(node)?;
        let subscriber = SubscriberId::new(uuid::Uuid::new_v4().to_string());
        self.log_hub.subscribe(subscriber.clone(), node, process, source, 0);
        let result = self.log_hub.poll_once(&subscriber, node, process, &handle, &self.shutdown).await;
        self.log_hub.unsubscribe(&subscriber, node, process);
        result
    }

    pub fn subscribe(&self, subscriber: SubscriberId, node: &str, process: &str, source: LogSource, offset: i64) -> Result<(), FleetError> {
        self.check_shutdown()?;
        self.handle(node)?;
        self.log_hub.subscribe(subscriber, node, process, source, offset);
        Ok(())
    }

    pub fn unsubscribe(&self, subscriber: &SubscriberId, node: &str, process: &str) {
        self.log_hub.unsubscribe(subscriber, node, process);
    }

    pub async fn poll_log_tail(&self, subscriber: &SubscriberId, node: &str, process: &str) -> Result<Vec<LogEntry>, FleetError> {
        self.check_shutdown()?;
        let handle = self.handle(node)?;
        self.log_hub.poll_once(subscriber, node, process, &handle, &self.shutdown).await
    }

    /// Start background tasks: the state monitor. Idempotent — a second
    /// call replaces the running monitor's stop handle with a new one
    /// rather than running two monitors.
    pub fn start(&self) {
        let source: Arc<dyn NodeSource> = Arc::new(NodeMapSource(self.nodes.clone()));
        let stop = self.state_monitor.start(source, self.sink.clone(), self.shutdown.clone());
        *self.monitor_stop.lock() = Some(stop);
    }

    /// Cooperative, idempotent shutdown. Cancels the global token (further
    /// `add_node`/`get_node`/`get_all_nodes` calls fail with
    /// `FleetError::Shutdown`), waits up to `deadline` for background
    /// tasks to notice, then clears the node map regardless of whether the
    /// deadline was met.
    pub async fn stop(&self, deadline: Duration) {
        self.shutdown.cancel();
        if let Some(stop) = self.monitor_stop.lock().take() {
            let _ = stop.send(());
        }
        let grace = self.shutdown_grace.min(deadline);
        if tokio::time::timeout(deadline, tokio::time::sleep(grace)).await.is_err() {
            warn!("fleet shutdown exceeded its deadline; proceeding with cleanup anyway");
        }
        self.nodes.write().clear();
    }

    pub fn health(&self) -> Health {
        let nodes = self.nodes.read();
        let total = nodes.len();
        let connected = nodes.values().filter(|h| h.is_connected()).count();
        let status = if total == 0 || connected == total {
            HealthStatus::Healthy
        } else if connected == 0 {
            HealthStatus::Unhealthy
        } else {
            HealthStatus::Degraded
        };
        Health {
            status,
            total_nodes: total,
            connected_nodes: connected,
        }
    }
}

#[cfg(test)]
#[path = "facade_tests.rs"]
mod tests;
