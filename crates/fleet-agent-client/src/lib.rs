// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! The XML-RPC wire client to a single remote supervisor agent.

mod client;
mod error;
mod transport;
mod xmlrpc;

pub use client::{AgentClient, DEFAULT_TRANSPORT_TIMEOUT};
pub use error::TransportError;
pub use transport::{AgentTransport, ReqwestAgentTransport};
pub use xmlrpc::{encode_call, parse_response, RpcResponse, Value};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use transport::{FakeAgentTransport, ScriptedReply, TransportCall};
