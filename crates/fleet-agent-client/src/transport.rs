// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transport adapters

use crate::error::TransportError;
use async_trait::async_trait;
use std::time::Duration;

/// Adapter over the HTTP exchange an `AgentClient` needs: POST an XML-RPC
/// body and get the response body back, under a deadline.
#[async_trait]
pub trait AgentTransport: Send + Sync + 'static {
    async fn post(&self, url: &str, body: String, timeout: Duration) -> Result<String, TransportError>;
}

/// Production transport backed by `reqwest`.
#[derive(Clone)]
pub struct ReqwestAgentTransport {
    client: reqwest::Client,
}

impl ReqwestAgentTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for ReqwestAgentTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AgentTransport for ReqwestAgentTransport {
    async fn post(&self, url: &str, body: String, timeout: Duration) -> Result<String, TransportError> {
        let fut = self
            .client
            .post(url)
            .header("Content-Type", "text/xml")
            .body(body)
            .send();
        let response = tokio::time::timeout(timeout, fut)
            .await
            .map_err(|_elapsed| TransportError::Timeout)?
            .map_err(|e| TransportError::Http(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::BadStatus(status.as_u16()));
        }
        tokio::time::timeout(timeout, response.text())
            .await
            .map_err(|_elapsed| TransportError::Timeout)?
            .map_err(|e| TransportError::Http(e.to_string()))
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeAgentTransport, ScriptedReply, TransportCall};

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;
