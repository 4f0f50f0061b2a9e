// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fleet-engine: the supervision runtime — admission control, circuit
//! breaking, governed retries, per-node state, polling, and log tailing.

pub mod admission;
pub mod breaker;
pub mod governor;
pub mod log_tail_hub;
pub mod node_handle;
pub mod state_monitor;
pub mod util;

pub use admission::{Admission, AdmissionGate, DEFAULT_CAPACITY};
pub use breaker::CircuitBreakerRegistry;
pub use governor::{BatchOp, GovernorConfig, TimeoutGovernor};
pub use log_tail_hub::{LogEntry, LogLevel, LogTailHub, LogTailHubConfig};
pub use node_handle::NodeHandle;
pub use state_monitor::{NodeSource, StateMonitor, StateMonitorConfig};
pub use util::parse_duration;
