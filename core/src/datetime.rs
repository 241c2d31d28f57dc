// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use jiff::Timestamp;
use jiff::civil::DateTime;
use jiff::tz::TimeZone;

/// Parses the compact iCalendar date-time form `YYYYMMDDTHHMMSS`.
///
/// The value carries no offset and is read as UTC. Anything else, including the `Z`-suffixed
/// and dashed forms, is rejected.
pub fn parse_compact(s: &str) -> Option<Timestamp> {
    let (date, time) = s.split_once('T')?;
    if date.len() != 8 || time.len() != 6 {
        return None;
    }
    if !date.bytes().chain(time.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }

    let year = date.get(0..4)?.parse().ok()?;
    let month = date.get(4..6)?.parse().ok()?;
    let day = date.get(6..8)?.parse().ok()?;
    let hour = time.get(0..2)?.parse().ok()?;
    let minute = time.get(2..4)?.parse().ok()?;
    let second = time.get(4..6)?.parse().ok()?;

    DateTime::new(year, month, day, hour, minute, second, 0)
        .and_then(|dt| dt.to_zoned(TimeZone::UTC))
        .map(|zoned| zoned.timestamp())
        .ok()
}
