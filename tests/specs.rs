//! Cross-crate behavioral specifications for the fleet management plane.
//!
//! Unit tests live beside their module; these cover the invariants and
//! end-to-end scenarios that only make sense across the whole stack.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

#[path = "specs/node.rs"]
mod node;
#[path = "specs/governor.rs"]
mod governor;
#[path = "specs/monitor.rs"]
mod monitor;
#[path = "specs/config.rs"]
mod config;
#[path = "specs/shutdown.rs"]
mod shutdown;
