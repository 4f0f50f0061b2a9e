// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `${VAR}` environment variable expansion for string config fields.

use regex::Regex;
use std::sync::LazyLock;

static VAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("constant regex is valid"));

/// Expand every `${VAR}` reference in `text` against the process
/// environment. A missing variable expands to the empty string; its name
/// is returned in `warnings` so the caller can surface it.
pub fn expand(text: &str, warnings: &mut Vec<String>) -> String {
    VAR_PATTERN
        .replace_all(text, |caps: &regex::Captures| {
            let name = &caps[1];
            std::env::var(name).unwrap_or_else(|_| {
                warnings.push(format!("environment variable {name} is not set, expanding to empty string"));
                String::new()
            })
        })
        .to_string()
}

#[cfg(test)]
#[path = "env_expand_tests.rs"]
mod tests;
