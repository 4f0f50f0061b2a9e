// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `AgentClient`: the XML-RPC wire client to one remote agent.

use crate::transport::AgentTransport;
use crate::xmlrpc::{self, RpcResponse, Value};
use fleet_core::{FleetError, Process, ProcessState};
use std::sync::Arc;
use std::time::Duration;

/// Lower bound for any single RPC exchange, regardless of caller-supplied
/// deadlines further up the call chain.
pub const DEFAULT_TRANSPORT_TIMEOUT: Duration = Duration::from_secs(5);

/// One client per node. Cheap to clone; the transport is shared.
#[derive(Clone)]
pub struct AgentClient {
    url: String,
    transport: Arc<dyn AgentTransport>,
    timeout: Duration,
}

impl AgentClient {
    pub fn new(
        host: &str,
        port: u16,
        username: Option<&str>,
        password: Option<&str>,
        transport: Arc<dyn AgentTransport>,
    ) -> Self {
        let url = match (username, password) {
            (Some(u), Some(p)) => format!("http://{u}:{p}@{host}:{port}/RPC2"),
            _ => format!("http://{host}:{port}/RPC2"),
        };
        Self {
            url,
            transport,
            timeout: DEFAULT_TRANSPORT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn call(&self, method: &str, params: &[Value]) -> Result<RpcResponse, FleetError> {
        let body = xmlrpc::encode_call(method, params);
        let response = self
            .transport
            .post(&self.url, body, self.timeout)
            .await
            .map_err(FleetError::from)?;
        xmlrpc::parse_response(&response).map_err(FleetError::from)
    }

    fn process_from_members(members: &std::collections::HashMap<String, String>) -> Process {
        let get = |k: &str| members.get(k).cloned().unwrap_or_default();
        let get_i64 = |k: &str| get(k).parse::<i64>().unwrap_or(0);
        Process::new(
            get("name"),
            get("group"),
            ProcessState::from_code(get_i64("state")),
            get_i64("pid").max(0) as u32,
            get_i64("start").max(0) as u64,
            get_i64("stop").max(0) as u64,
            get_i64("now").max(0) as u64,
            get_i64("exitstatus") as i32,
            get("spawnerr"),
            get("stdout_logfile"),
            get("stderr_logfile"),
        )
    }

    /// `supervisor.getAllProcessInfo`.
    pub async fn get_all_process_info(&self) -> Result<Vec<Process>, FleetError> {
        match self.call("supervisor.getAllProcessInfo", &[]).await? {
            RpcResponse::Success(body) => Ok(xmlrpc::parse_array_of_structs(&body)
                .iter()
                .map(Self::process_from_members)
                .collect()),
            RpcResponse::Fault { code, message } => Err(FleetError::Fault { code, message }),
        }
    }

    /// `supervisor.getProcessInfo`.
    pub async fn get_process_info(&self, name: &str) -> Result<Process, FleetError> {
        match self
            .call("supervisor.getProcessInfo", &[Value::Str(name.to_string())])
            .await?
        {
            RpcResponse::Success(body) => {
                Ok(Self::process_from_members(&xmlrpc::parse_struct_members(&body)))
            }
            RpcResponse::Fault { code, message } => Err(FleetError::Fault { code, message }),
        }
    }

    /// `supervisor.startProcess`. A fault naming `ALREADY_STARTED` is
    /// normalized to success — the caller asked for the process to be
    /// running, and it already is.
    pub async fn start_process(&self, name: &str) -> Result<(), FleetError> {
        match self
            .call("supervisor.startProcess", &[Value::Str(name.to_string())])
            .await?
        {
            RpcResponse::Success(_) => Ok(()),
            RpcResponse::Fault { code, message } if message.contains("ALREADY_STARTED") => {
                tracing::debug!(process = name, "start_process: already started, treating as success");
                let _ = code;
                Ok(())
            }
            RpcResponse::Fault { code, message } => Err(FleetError::Fault { code, message }),
        }
    }

    /// `supervisor.stopProcess`. Skips the call entirely when the process
    /// is already known to be terminal-stopped, and normalizes a
    /// `NOT_RUNNING` fault to success.
    pub async fn stop_process(&self, name: &str) -> Result<(), FleetError> {
        if let Ok(info) = self.get_process_info(name).await {
            if info.state.is_terminal_stopped() {
                tracing::debug!(process = name, state = %info.state, "stop_process: already stopped, skipping call");
                return Ok(());
            }
        }
        match self
            .call("supervisor.stopProcess", &[Value::Str(name.to_string())])
            .await?
        {
            RpcResponse::Success(_) => Ok(()),
            RpcResponse::Fault { code, message } if message.contains("NOT_RUNNING") => {
                tracing::debug!(process = name, "stop_process: not running, treating as success");
                let _ = code;
                Ok(())
            }
            RpcResponse::Fault { code, message } => Err(FleetError::Fault { code, message }),
        }
    }

    async fn tail_log(
        &self,
        method: &str,
        name: &str,
        offset: i64,
        length: i64,
    ) -> Result<(Vec<u8>, i64, bool), FleetError> {
        match self
            .call(
                method,
                &[
                    Value::Str(name.to_string()),
                    Value::Int(offset),
                    Value::Int(length),
                ],
            )
            .await?
        {
            RpcResponse::Success(body) => {
                let (bytes, next_offset, overflow) =
                    xmlrpc::parse_tail_response(&body).map_err(FleetError::from)?;
                Ok((bytes.into_bytes(), next_offset, overflow))
            }
            RpcResponse::Fault { code, message } => Err(FleetError::Fault { code, message }),
        }
    }

    /// `supervisor.tailProcessStdoutLog`.
    pub async fn tail_process_stdout_log(
        &self,
        name: &str,
        offset: i64,
        length: i64,
    ) -> Result<(Vec<u8>, i64, bool), FleetError> {
        self.tail_log("supervisor.tailProcessStdoutLog", name, offset, length)
            .await
    }

    /// `supervisor.tailProcessStderrLog`.
    pub async fn tail_process_stderr_log(
        &self,
        name: &str,
        offset: i64,
        length: i64,
    ) -> Result<(Vec<u8>, i64, bool), FleetError> {
        self.tail_log("supervisor.tailProcessStderrLog", name, offset, length)
            .await
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
