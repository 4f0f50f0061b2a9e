// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake transport for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{AgentTransport, TransportError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

/// A single recorded call.
#[derive(Debug, Clone)]
pub struct TransportCall {
    pub url: String,
    pub body: String,
}

/// One scripted answer for a method, consumed in FIFO order.
#[derive(Clone)]
pub enum ScriptedReply {
    Body(String),
    Error(Arc<dyn Fn() -> TransportError + Send + Sync>),
}

impl ScriptedReply {
    pub fn ok(body: impl Into<String>) -> Self {
        ScriptedReply::Body(body.into())
    }

    pub fn timeout() -> Self {
        ScriptedReply::Error(Arc::new(|| TransportError::Timeout))
    }

    pub fn connection_refused() -> Self {
        ScriptedReply::Error(Arc::new(|| TransportError::Http("connection refused".into())))
    }
}

struct FakeState {
    calls: Vec<TransportCall>,
    scripts: HashMap<String, VecDeque<ScriptedReply>>,
    default: Option<ScriptedReply>,
}

/// Records every call made to it and answers from a scripted queue keyed
/// by XML-RPC method name, falling back to a default reply (or an error
/// when neither is configured).
#[derive(Clone)]
pub struct FakeAgentTransport {
    state: Arc<Mutex<FakeState>>,
}

impl Default for FakeAgentTransport {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState {
                calls: Vec::new(),
                scripts: HashMap::new(),
                default: None,
            })),
        }
    }
}

impl FakeAgentTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for the next call whose body names `method`.
    pub fn push(&self, method: &str, reply: ScriptedReply) {
        self.state
            .lock()
            .scripts
            .entry(method.to_string())
            .or_default()
            .push_back(reply);
    }

    /// Answer every call that has no more scripted replies queued with this.
    pub fn set_default(&self, reply: ScriptedReply) {
        self.state.lock().default = Some(reply);
    }

    pub fn calls(&self) -> Vec<TransportCall> {
        self.state.lock().calls.clone()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| c.body.contains(method))
            .count()
    }
}

fn extract_method(body: &str) -> Option<&str> {
    let start = body.find("<methodName>")? + "<methodName>".len();
    let end = body[start..].find("</methodName>")? + start;
    Some(&body[start..end])
}

#[async_trait]
impl AgentTransport for FakeAgentTransport {
    async fn post(&self, url: &str, body: String, _timeout: Duration) -> Result<String, TransportError> {
        let method = extract_method(&body).unwrap_or("").to_string();
        let reply = {
            let mut state = self.state.lock();
            state.calls.push(TransportCall {
                url: url.to_string(),
                body: body.clone(),
            });
            state
                .scripts
                .get_mut(&method)
                .and_then(VecDeque::pop_front)
                .or_else(|| state.default.clone())
        };
        match reply {
            Some(ScriptedReply::Body(body)) => Ok(body),
            Some(ScriptedReply::Error(make)) => Err(make()),
            None => Err(TransportError::Http(format!("no scripted reply for {method}"))),
        }
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
