// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Non-recursive file watcher used to drive hot reload of one
//! configuration file.

use crate::error::ConfigError;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};

/// Watches the parent directory of a single file and reports changes to
/// that specific file. Watching the parent (rather than the file itself)
/// survives editors that replace the file instead of writing in place.
pub struct FileWatcher {
    target: PathBuf,
    rx: Receiver<notify::Result<Event>>,
    _watcher: RecommendedWatcher,
}

impl FileWatcher {
    pub fn new(target: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let target = target.into();
        let parent = target.parent().unwrap_or_else(|| Path::new("."));
        let (tx, rx) = mpsc::channel();
        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            notify::Config::default(),
        )
        .map_err(|e| ConfigError::Watch(e.to_string()))?;
        if parent.exists() {
            watcher
                .watch(parent, RecursiveMode::NonRecursive)
                .map_err(|e| ConfigError::Watch(e.to_string()))?;
        }
        Ok(Self { target, rx, _watcher: watcher })
    }

    /// Non-blocking drain: true if the watched file changed since the
    /// last call. Collapses a burst of events into a single signal.
    pub fn poll_changed(&self) -> bool {
        let mut changed = false;
        while let Ok(Ok(event)) = self.rx.try_recv() {
            if !matches!(
                event.kind,
                EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
            ) {
                continue;
            }
            if event.paths.iter().any(|p| p == &self.target) {
                changed = true;
            }
        }
        changed
    }
}

#[cfg(test)]
#[path = "watcher_tests.rs"]
mod tests;
