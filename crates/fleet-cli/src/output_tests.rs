// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn format_time_ago_zero_is_dash() {
    assert_eq!(format_time_ago(0), "-");
}

#[test]
fn format_time_ago_seconds() {
    let now_ms = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as u64;
    let out = format_time_ago(now_ms - 5_000);
    assert!(out.ends_with('s'), "expected seconds suffix, got {out}");
}

#[test]
fn format_time_ago_minutes() {
    let now_ms = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as u64;
    let out = format_time_ago(now_ms - 5 * 60_000);
    assert!(out.ends_with('m'), "expected minutes suffix, got {out}");
}

#[test]
fn format_time_ago_hours() {
    let now_ms = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as u64;
    let out = format_time_ago(now_ms - 3 * 3_600_000);
    assert!(out.ends_with('h'), "expected hours suffix, got {out}");
}

#[test]
fn format_time_ago_days() {
    let now_ms = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as u64;
    let out = format_time_ago(now_ms - 2 * 86_400_000);
    assert!(out.ends_with('d'), "expected days suffix, got {out}");
}

#[test]
fn default_output_format_is_text() {
    assert_eq!(OutputFormat::default(), OutputFormat::Text);
}
