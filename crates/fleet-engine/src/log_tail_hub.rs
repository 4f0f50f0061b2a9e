// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `LogTailHub`: per-subscription log tailing, level classification, and
//! timestamp extraction.

use crate::node_handle::NodeHandle;
use fleet_core::{Clock, FleetError, LogSource, SubscriberId, TailCursor};
use parking_lot::Mutex;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, LazyLock};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Fatal,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Best-effort classification from line text. Checked in severity order so
/// a line mentioning multiple tokens is not misclassified as the weakest.
fn classify_level(line: &str) -> LogLevel {
    let upper = line.to_ascii_uppercase();
    if upper.contains("FATAL") {
        LogLevel::Fatal
    } else if upper.contains("ERROR") {
        LogLevel::Error
    } else if upper.contains("WARN") {
        LogLevel::Warn
    } else if upper.contains("DEBUG") {
        LogLevel::Debug
    } else if upper.contains("TRACE") {
        LogLevel::Trace
    } else {
        LogLevel::Info
    }
}

static ISO_TS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})-(\d{2})-(\d{2})[ T](\d{2}):(\d{2}):(\d{2})(?:\.\d{1,6})?\s*")
        .expect("constant regex is valid")
});
static SLASH_TS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})/(\d{2})/(\d{2}) (\d{2}):(\d{2}):(\d{2})\s*").expect("constant regex is valid")
});
static SYSLOG_TS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z]{3})\s+(\d{1,2}) (\d{2}):(\d{2}):(\d{2})\s*").expect("constant regex is valid")
});

fn month_from_abbrev(s: &str) -> Option<u32> {
    const NAMES: [&str; 12] = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];
    NAMES
        .iter()
        .position(|n| n.eq_ignore_ascii_case(s))
        .map(|i| i as u32 + 1)
}

/// Days since 1970-01-01 for a proleptic Gregorian civil date (Howard
/// Hinnant's `days_from_civil`).
fn days_from_civil(y: i64, m: u32, d: u32) -> i64 {
    let y = if m <= 2 { y - 1 } else { y };
    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = y - era * 400;
    let mp = (m as i64 + 9) % 12;
    let doy = (153 * mp + 2) / 5 + d as i64 - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146097 + doe - 719468
}

/// Inverse of `days_from_civil`, used to recover "today's year" for
/// year-less timestamp formats.
fn civil_from_days(epoch_day: i64) -> (i64, u32, u32) {
    let z = epoch_day + 719468;
    let era = if z >= 0 { z } else { z - 146096 } / 146097;
    let doe = z - era * 146097;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365;
    let y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let m = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    (if m <= 2 { y + 1 } else { y }, m, d)
}

fn epoch_ms_from_civil(y: i64, m: u32, d: u32, h: u32, min: u32, sec: u32) -> u64 {
    let days = days_from_civil(y, m, d);
    let secs = days * 86_400 + h as i64 * 3600 + min as i64 * 60 + sec as i64;
    (secs.max(0) as u64) * 1000
}

/// Parse a leading timestamp off `line` against the known formats,
/// returning `(epoch_ms, remainder)`. `now_epoch_ms` supplies the current
/// year for year-less formats.
fn parse_leading_timestamp(line: &str, now_epoch_ms: u64) -> Option<(u64, &str)> {
    if let Some(c) = ISO_TS.captures(line) {
        let y: i64 = c[1].parse().ok()?;
        let m: u32 = c[2].parse().ok()?;
        let d: u32 = c[3].parse().ok()?;
        let h: u32 = c[4].parse().ok()?;
        let min: u32 = c[5].parse().ok()?;
        let s: u32 = c[6].parse().ok()?;
        let whole = c.get(0)?.as_str();
        return Some((epoch_ms_from_civil(y, m, d, h, min, s), &line[whole.len()..]));
    }
    if let Some(c) = SLASH_TS.captures(line) {
        let y: i64 = c[1].parse().ok()?;
        let m: u32 = c[2].parse().ok()?;
        let d: u32 = c[3].parse().ok()?;
        let h: u32 = c[4].parse().ok()?;
        let min: u32 = c[5].parse().ok()?;
        let s: u32 = c[6].parse().ok()?;
        let whole = c.get(0)?.as_str();
        return Some((epoch_ms_from_civil(y, m, d, h, min, s), &line[whole.len()..]));
    }
    if let Some(c) = SYSLOG_TS.captures(line) {
        let m = month_from_abbrev(&c[1])?;
        let d: u32 = c[2].parse().ok()?;
        let h: u32 = c[3].parse().ok()?;
        let min: u32 = c[4].parse().ok()?;
        let s: u32 = c[5].parse().ok()?;
        let (y, _, _) = civil_from_days((now_epoch_ms / 1000 / 86_400) as i64);
        let whole = c.get(0)?.as_str();
        return Some((epoch_ms_from_civil(y, m, d, h, min, s), &line[whole.len()..]));
    }
    None
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub node: String,
    pub process: String,
    pub timestamp_epoch_ms: u64,
    pub level: LogLevel,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct LogTailHubConfig {
    /// Lines requested per poll; translated to a byte budget of
    /// `max_lines * 100`, capped at 1000 lines.
    pub max_lines: usize,
}

impl Default for LogTailHubConfig {
    fn default() -> Self {
        Self { max_lines: 100 }
    }
}

type SubKey = (SubscriberId, String, String);

struct Subscription {
    cursor: TailCursor,
    source: LogSource,
    seen: VecDeque<(u64, String)>,
    buffer: VecDeque<LogEntry>,
}

const MAX_BUFFERED_ENTRIES: usize = 1000;

pub struct LogTailHub {
    config: LogTailHubConfig,
    clock: Arc<dyn Clock>,
    subs: Mutex<HashMap<SubKey, Subscription>>,
}

impl LogTailHub {
    pub fn new(config: LogTailHubConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            subs: Mutex::new(HashMap::new()),
        }
    }

    fn max_bytes(&self) -> i64 {
        (self.config.max_lines.min(MAX_BUFFERED_ENTRIES) * 100) as i64
    }

    /// Begin tailing `(node, process)` for `subscriber`. `offset < 0` means
    /// "start from the end of the file".
    pub fn subscribe(&self, subscriber: SubscriberId, node: &str, process: &str, source: LogSource, offset: i64) {
        let cursor = if offset < 0 {
            TailCursor::pending_from_end()
        } else {
            TailCursor::at_offset(offset as u64)
        };
        self.subs.lock().insert(
            (subscriber, node.to_string(), process.to_string()),
            Subscription {
                cursor,
                source,
                seen: VecDeque::new(),
                buffer: VecDeque::new(),
            },
        );
    }

    pub fn unsubscribe(&self, subscriber: &SubscriberId, node: &str, process: &str) {
        self.subs
            .lock()
            .remove(&(subscriber.clone(), node.to_string(), process.to_string()));
    }

    pub fn buffered_entries(&self, subscriber: &SubscriberId, node: &str, process: &str) -> Vec<LogEntry> {
        self.subs
            .lock()
            .get(&(subscriber.clone(), node.to_string(), process.to_string()))
            .map(|sub| sub.buffer.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Poll once for one subscription: negotiates a starting offset for a
    /// pending "from end" cursor, otherwise fetches, parses, dedupes, and
    /// buffers any new entries. Returns the freshly observed entries.
    pub async fn poll_once(
        &self,
        subscriber: &SubscriberId,
        node: &str,
        process: &str,
        handle: &NodeHandle,
        shutdown: &CancellationToken,
    ) -> Result<Vec<LogEntry>, FleetError> {
        let key = (subscriber.clone(), node.to_string(), process.to_string());
        let (source, is_pending, offset) = {
            let subs = self.subs.lock();
            let sub = subs
                .get(&key)
                .ok_or_else(|| FleetError::NotFound(format!("no log subscription for {process} on {node}")))?;
            (sub.source, sub.cursor.is_pending(), sub.cursor.offset())
        };

        if is_pending {
            let (_, current_length, _) = handle.get_process_log_tail(process, 0, 0, source, shutdown).await?;
            if let Some(sub) = self.subs.lock().get_mut(&key) {
                sub.cursor.resolve(current_length.max(0) as u64);
            }
            return Ok(Vec::new());
        }

        let offset = offset.unwrap_or(0) as i64;
        let (bytes, next_offset, overflow) = handle
            .get_process_log_tail(process, offset, self.max_bytes(), source, shutdown)
            .await?;
        let text = String::from_utf8_lossy(&bytes).into_owned();
        let now = self.clock.epoch_ms();

        let mut parsed = Vec::new();
        for raw_line in text.lines() {
            let line = raw_line.trim();
            if line.is_empty() {
                continue;
            }
            let level = classify_level(line);
            let (timestamp_epoch_ms, message) = match parse_leading_timestamp(line, now) {
                Some((ts, rest)) => (ts, rest.trim().to_string()),
                None => (now, line.to_string()),
            };
            parsed.push(LogEntry {
                node: node.to_string(),
                process: process.to_string(),
                timestamp_epoch_ms,
                level,
                message,
            });
        }

        let mut subs = self.subs.lock();
        let Some(sub) = subs.get_mut(&key) else {
            return Ok(Vec::new());
        };
        sub.cursor.advance(next_offset.max(0) as u64, overflow);
        let mut fresh = Vec::new();
        for entry in parsed {
            let dedup_key = (entry.timestamp_epoch_ms, entry.message.clone());
            if sub.seen.contains(&dedup_key) {
                continue;
            }
            sub.seen.push_back(dedup_key);
            if sub.seen.len() > MAX_BUFFERED_ENTRIES {
                sub.seen.pop_front();
            }
            sub.buffer.push_back(entry.clone());
            if sub.buffer.len() > MAX_BUFFERED_ENTRIES {
                sub.buffer.pop_front();
            }
            fresh.push(entry);
        }
        Ok(fresh)
    }
}

#[cfg(test)]
#[path = "log_tail_hub_tests.rs"]
mod tests;
