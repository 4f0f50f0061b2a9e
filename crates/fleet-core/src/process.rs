// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process snapshot and its canonical state codes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The seven canonical process state codes an agent reports, plus a
/// catch-all for anything outside that set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessState {
    Stopped,
    Starting,
    Running,
    Backoff,
    Stopping,
    Exited,
    Fatal,
    Unknown,
    /// A state code an agent reported that does not match the canonical
    /// set. Carries the raw code so callers can still log it.
    Other(i64),
}

impl ProcessState {
    /// Decode the numeric state code an agent reports.
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => ProcessState::Stopped,
            10 => ProcessState::Starting,
            20 => ProcessState::Running,
            30 => ProcessState::Backoff,
            40 => ProcessState::Stopping,
            100 => ProcessState::Exited,
            200 => ProcessState::Fatal,
            1000 => ProcessState::Unknown,
            other => ProcessState::Other(other),
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            ProcessState::Stopped => 0,
            ProcessState::Starting => 10,
            ProcessState::Running => 20,
            ProcessState::Backoff => 30,
            ProcessState::Stopping => 40,
            ProcessState::Exited => 100,
            ProcessState::Fatal => 200,
            ProcessState::Unknown => 1000,
            ProcessState::Other(code) => *code,
        }
    }

    pub fn name(&self) -> String {
        match self {
            ProcessState::Stopped => "STOPPED".to_string(),
            ProcessState::Starting => "STARTING".to_string(),
            ProcessState::Running => "RUNNING".to_string(),
            ProcessState::Backoff => "BACKOFF".to_string(),
            ProcessState::Stopping => "STOPPING".to_string(),
            ProcessState::Exited => "EXITED".to_string(),
            ProcessState::Fatal => "FATAL".to_string(),
            ProcessState::Unknown => "UNKNOWN".to_string(),
            ProcessState::Other(code) => format!("STATE_{code}"),
        }
    }

    /// Whether a process in this state legitimately holds a PID.
    pub fn holds_pid(&self) -> bool {
        matches!(self, ProcessState::Running | ProcessState::Starting)
    }

    /// STOPPED, EXITED, and FATAL are all terminal-stopped for the purposes
    /// of skipping a redundant stop call; STOPPING is on its way there but
    /// not there yet.
    pub fn is_terminal_stopped(&self) -> bool {
        matches!(
            self,
            ProcessState::Stopped | ProcessState::Exited | ProcessState::Fatal
        )
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Point-in-time descriptor of one supervised process on a node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Process {
    pub name: String,
    pub group: String,
    pub state: ProcessState,
    /// Valid only when `state.holds_pid()`; zero otherwise. The core
    /// enforces this normalization regardless of what the agent reports.
    pub pid: u32,
    pub start: u64,
    pub stop: u64,
    pub now: u64,
    pub exit_status: i32,
    pub spawn_err: String,
    pub stdout_logfile: String,
    pub stderr_logfile: String,
}

impl Process {
    /// Build a process snapshot from raw agent-reported fields, applying
    /// the PID normalization invariant.
    pub fn new(
        name: impl Into<String>,
        group: impl Into<String>,
        state: ProcessState,
        raw_pid: u32,
        start: u64,
        stop: u64,
        now: u64,
        exit_status: i32,
        spawn_err: impl Into<String>,
        stdout_logfile: impl Into<String>,
        stderr_logfile: impl Into<String>,
    ) -> Self {
        let pid = if state.holds_pid() { raw_pid } else { 0 };
        Self {
            name: name.into(),
            group: group.into(),
            state,
            pid,
            start,
            stop,
            now,
            exit_status,
            spawn_err: spawn_err.into(),
            stdout_logfile: stdout_logfile.into(),
            stderr_logfile: stderr_logfile.into(),
        }
    }

    /// Seconds elapsed since start, or 0 when not running.
    pub fn uptime(&self) -> u64 {
        if self.state == ProcessState::Running {
            self.now.saturating_sub(self.start)
        } else {
            0
        }
    }
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
