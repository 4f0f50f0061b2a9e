// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration loading errors.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("main config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("main config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("node list file {path}: {message}")]
    ParseNodeList { path: PathBuf, message: String },
    #[error("{path}: {message}")]
    Validation { path: PathBuf, message: String },
    #[error("file watch error: {0}")]
    Watch(String),
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
