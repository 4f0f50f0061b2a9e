// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Configuration loading, merging, validation, and hot reload for the
//! supervisor fleet's system config and node-list files.

mod env_expand;
mod error;
mod hot_reload;
mod loader;
mod model;
mod watcher;

pub use error::ConfigError;
pub use hot_reload::{HotReloader, NodeListObserver, DEFAULT_POLL_INTERVAL};
pub use loader::{ConfigLoader, LoadResult};
pub use model::{AdminCredentials, FleetConfig, NodeListFile, PerformanceConfig, ServerConfig, SystemConfigFile};
pub use watcher::FileWatcher;
