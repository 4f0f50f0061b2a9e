// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake activity sink for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{ActivityEvent, ActivityLogSink};
use parking_lot::Mutex;
use std::sync::Arc;

/// Records every event it receives for later assertion.
#[derive(Clone, Default)]
pub struct FakeActivityLogSink {
    events: Arc<Mutex<Vec<ActivityEvent>>>,
}

impl FakeActivityLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ActivityEvent> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl ActivityLogSink for FakeActivityLogSink {
    fn record(&self, event: ActivityEvent) {
        self.events.lock().push(event);
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
