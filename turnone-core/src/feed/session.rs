// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Session Views
//!
//! Read-only helpers over an applied snapshot for the rendering layer.

use std::cmp::Reverse;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

use super::notify::{RACE_CONTROL_MESSAGES, RACE_CONTROL_SECTION};
use super::snapshot::Snapshot;

/// Whether the feed currently describes a live session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// No `Heartbeat` section: nothing is running upstream.
    NoLiveSession,
    /// A session is live.
    Live,
}

impl SessionStatus {
    /// Classifies a snapshot.
    pub fn of(snapshot: &Snapshot) -> Self {
        if snapshot.has_section("Heartbeat") {
            SessionStatus::Live
        } else {
            SessionStatus::NoLiveSession
        }
    }
}

/// Current and total laps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LapCount {
    pub current: u32,
    pub total: u32,
}

/// Reads `LapCount`.
pub fn lap_count(snapshot: &Snapshot) -> Option<LapCount> {
    let section = snapshot.section("LapCount")?;
    let lap = |key: &str| section.get(key)?.as_u64().and_then(|n| u32::try_from(n).ok());
    Some(LapCount {
        current: lap("CurrentLap")?,
        total: lap("TotalLaps")?,
    })
}

/// `"<circuit>: <session>"`, e.g. `"Monza: Race"`.
pub fn session_title(snapshot: &Snapshot) -> Option<String> {
    let info = snapshot.section("SessionInfo")?;
    let circuit = info
        .get("Meeting")?
        .get("Circuit")?
        .get("ShortName")?
        .as_str()?;
    let name = info.get("Name")?.as_str()?;
    Some(format!("{}: {}", circuit, name))
}

/// Parses a feed timestamp. The feed omits the offset at times; such values
/// are UTC.
pub fn parse_feed_time(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Parses an `H:MM:SS[.fff]` clock value.
pub fn parse_clock(value: &str) -> Option<Duration> {
    let mut parts = value.trim().splitn(3, ':');
    let hours: u64 = parts.next()?.parse().ok()?;
    let minutes: u64 = parts.next()?.parse().ok()?;
    let seconds: f64 = parts.next()?.parse().ok()?;
    if minutes >= 60 || !(0.0..60.0).contains(&seconds) {
        return None;
    }
    Some(Duration::from_secs(hours * 3600 + minutes * 60) + Duration::from_secs_f64(seconds))
}

/// Formats a duration as `HH:MM:SS`.
pub fn format_clock(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}

/// Session time remaining according to `ExtrapolatedClock`.
///
/// While the clock is extrapolating, the time elapsed since its `Utc`
/// stamp is subtracted and the broadcast `delay` added back, because the
/// snapshot being shown is `delay` old. Never negative.
pub fn extrapolated_remaining(
    snapshot: &Snapshot,
    now: DateTime<Utc>,
    delay: Duration,
) -> Option<Duration> {
    let clock = snapshot.section("ExtrapolatedClock")?;
    let stamp = parse_feed_time(clock.get("Utc")?.as_str()?)?;
    let remaining = parse_clock(clock.get("Remaining")?.as_str()?)?;

    let extrapolating = clock
        .get("Extrapolating")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if !extrapolating {
        return Some(remaining);
    }

    let elapsed_ms = (now - stamp).num_milliseconds();
    let remaining_ms = i64::try_from(remaining.as_millis()).unwrap_or(i64::MAX);
    let delay_ms = i64::try_from(delay.as_millis()).unwrap_or(i64::MAX);
    let left = remaining_ms
        .saturating_sub(elapsed_ms)
        .saturating_add(delay_ms)
        .max(0);
    Some(Duration::from_millis(left.unsigned_abs()))
}

fn entries(value: Option<&Value>) -> Vec<&Value> {
    match value {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(Value::Object(items)) => items.values().collect(),
        _ => Vec::new(),
    }
}

/// Race-control messages and session status changes, newest first.
///
/// Entries without a readable `Utc` stamp sort last.
pub fn race_control_feed(snapshot: &Snapshot) -> Vec<&Value> {
    let messages = snapshot
        .section(RACE_CONTROL_SECTION)
        .and_then(|s| s.get(RACE_CONTROL_MESSAGES));
    let status_series = snapshot
        .section("SessionData")
        .and_then(|s| s.get("StatusSeries"));

    let mut feed: Vec<&Value> = entries(messages);
    feed.extend(entries(status_series));
    feed.sort_by_key(|entry| {
        Reverse(
            entry
                .get("Utc")
                .and_then(Value::as_str)
                .and_then(parse_feed_time),
        )
    });
    feed
}
