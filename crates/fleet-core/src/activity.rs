// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Normalized activity events and the sink interface they are published to.
//!
//! The fleet core never owns an audit log; it only knows how to describe
//! what happened and hand that description to whatever `ActivityLogSink`
//! the enclosing application wired in.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub level: ActivityLevel,
    pub action: String,
    pub resource: String,
    pub target: String,
    pub message: String,
    #[serde(default)]
    pub extras: Vec<(String, String)>,
}

impl ActivityEvent {
    pub fn new(
        level: ActivityLevel,
        action: impl Into<String>,
        resource: impl Into<String>,
        target: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            level,
            action: action.into(),
            resource: resource.into(),
            target: target.into(),
            message: message.into(),
            extras: Vec::new(),
        }
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extras.push((key.into(), value.into()));
        self
    }
}

/// External collaborator every normalized event is handed to. The core
/// ships reference implementations for development, production logging,
/// and tests; the application's real audit store implements this trait
/// itself.
pub trait ActivityLogSink: Send + Sync {
    fn record(&self, event: ActivityEvent);
}

/// Drops every event. Used when no sink has been wired.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpActivityLogSink;

impl ActivityLogSink for NoOpActivityLogSink {
    fn record(&self, _event: ActivityEvent) {}
}

/// Logs every event through `tracing` at the level it carries. The
/// sensible default in production when no richer sink is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingActivityLogSink;

impl ActivityLogSink for TracingActivityLogSink {
    fn record(&self, event: ActivityEvent) {
        match event.level {
            ActivityLevel::Info => {
                tracing::info!(action = %event.action, resource = %event.resource, target = %event.target, "{}", event.message)
            }
            ActivityLevel::Warning => {
                tracing::warn!(action = %event.action, resource = %event.resource, target = %event.target, "{}", event.message)
            }
            ActivityLevel::Error => {
                tracing::error!(action = %event.action, resource = %event.resource, target = %event.target, "{}", event.message)
            }
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeActivityLogSink;

#[cfg(test)]
#[path = "activity_tests.rs"]
mod tests;
