// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use calsearch_core::parse_compact;
use jiff::{Timestamp, tz::TimeZone};

/// The output format for commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
}

/// Parses a timestamp given on the command line.
///
/// Accepts RFC 3339 (`2015-02-01T17:30:00Z`), a civil datetime taken as UTC
/// (`2015-02-01T17:30:00`, `2015-02-01 17:30`), a bare date at midnight UTC, or the compact
/// calendar form (`20150201T173000`).
pub fn parse_timestamp(s: &str) -> Result<Timestamp, String> {
    let s = s.trim();
    if let Ok(ts) = s.parse::<Timestamp>() {
        return Ok(ts);
    }
    if let Some(ts) = parse_compact(s) {
        return Ok(ts);
    }
    if let Ok(dt) = s.parse::<jiff::civil::DateTime>() {
        if let Ok(zoned) = dt.to_zoned(TimeZone::UTC) {
            return Ok(zoned.timestamp());
        }
    }
    Err(format!(
        "invalid timestamp '{s}', expected RFC 3339 such as 2015-02-01T17:30:00Z"
    ))
}

/// Pads `s` on the right to `width` display columns.
pub fn pad_right(s: &str, width: usize) -> String {
    use unicode_width::UnicodeWidthStr;

    let len = s.width();
    if len >= width {
        s.to_string()
    } else {
        format!("{s}{}", " ".repeat(width - len))
    }
}

/// Pads `s` on the left to `width` display columns.
pub fn pad_left(s: &str, width: usize) -> String {
    use unicode_width::UnicodeWidthStr;

    let len = s.width();
    if len >= width {
        s.to_string()
    } else {
        format!("{}{s}", " ".repeat(width - len))
    }
}

/// Sets the global color override, holding a lock until the guard is dropped.
#[cfg(test)]
pub(crate) fn color_override(enabled: bool) -> std::sync::MutexGuard<'static, ()> {
    use std::sync::Mutex;

    static COLOR_LOCK: Mutex<()> = Mutex::new(());
    let guard = COLOR_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    colored::control::set_override(enabled);
    guard
}
