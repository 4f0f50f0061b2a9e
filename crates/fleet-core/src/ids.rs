// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Newtype identifiers used across the fleet.

crate::define_id! {
    /// Identifies a log-tail subscriber (a websocket session, a CLI
    /// invocation, whatever the enclosing application considers a viewer).
    pub struct SubscriberId;
}

crate::define_id! {
    /// Identifies the logical target a circuit breaker is keyed on, e.g.
    /// `start_process_<node>_<proc>` or `agent_<node>`.
    pub struct BreakerKey;
}

#[cfg(test)]
#[path = "ids_tests.rs"]
mod tests;
