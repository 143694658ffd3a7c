//! Display Helpers
//!
//! Terminal output formatting and styling.

use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use console::style;
use serde_json::Value;
use turnone_core::feed::{
    extrapolated_remaining, format_clock, lap_count, race_control_feed, session_title,
    SessionStatus,
};
use turnone_core::{ConnectionState, Snapshot, SnapshotView};

/// Prints a success message.
pub fn success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

/// Prints an error message.
pub fn error(msg: &str) {
    eprintln!("{} {}", style("✗").red().bold(), msg);
}

/// Prints a warning message.
pub fn warning(msg: &str) {
    println!("{} {}", style("⚠").yellow().bold(), msg);
}

/// Prints an info message.
pub fn info(msg: &str) {
    println!("{} {}", style("ℹ").blue().bold(), msg);
}

/// Prints a connection state change.
pub fn connection(state: ConnectionState) {
    match state {
        ConnectionState::Connected => success("Connected"),
        ConnectionState::Connecting => info("Connecting..."),
        ConnectionState::Disconnected => warning("Disconnected"),
    }
}

/// Prints the syncing countdown.
pub fn countdown(remaining_ms: Option<u64>) {
    match remaining_ms {
        Some(ms) => println!(
            "  {} {}",
            style("Syncing").yellow(),
            style(format!("{:.1}s", ms as f64 / 1000.0)).dim()
        ),
        None => success("In sync"),
    }
}

/// One-line session summary, `None` before the first snapshot.
pub fn summary(view: &SnapshotView, now: DateTime<Utc>, delay: Duration) -> Option<String> {
    let snapshot = view.snapshot()?;
    if SessionStatus::of(snapshot) == SessionStatus::NoLiveSession {
        return Some("No live session".to_string());
    }

    let mut parts = vec![session_title(snapshot).unwrap_or_else(|| "Live session".into())];
    if let Some(laps) = lap_count(snapshot) {
        parts.push(format!("Lap {}/{}", laps.current, laps.total));
    }
    if let Some(remaining) = extrapolated_remaining(snapshot, now, delay) {
        parts.push(format_clock(remaining));
    }
    parts.push(format!("{} sections", snapshot.len()));
    Some(parts.join(" | "))
}

/// Prints a summary line, stamped with the local time of the update.
pub fn summary_line(line: &str, updated_at: Option<DateTime<Utc>>) {
    let stamp = updated_at
        .map(|at| at.with_timezone(&Local).format("%H:%M:%S").to_string())
        .unwrap_or_default();
    println!("{} {}", style(stamp).dim(), line);
}

fn entry_text(entry: &Value) -> Option<&str> {
    entry
        .get("Message")
        .or_else(|| entry.get("SessionStatus"))
        .and_then(Value::as_str)
}

/// Prints the latest race-control entries.
pub fn race_control(snapshot: &Snapshot, limit: usize) {
    let feed = race_control_feed(snapshot);
    if feed.is_empty() {
        println!("  {}", style("(no race control messages)").dim());
        return;
    }
    for entry in feed.into_iter().take(limit) {
        let utc = entry.get("Utc").and_then(Value::as_str).unwrap_or("");
        if let Some(text) = entry_text(entry) {
            println!("  {}  {}", style(utc).dim(), text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    fn view(value: Value) -> SnapshotView {
        SnapshotView::Ready {
            snapshot: Arc::new(Snapshot::decode(value.to_string().as_bytes()).unwrap()),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_summary_before_first_snapshot() {
        assert_eq!(
            summary(&SnapshotView::NoDataYet, Utc::now(), Duration::ZERO),
            None
        );
    }

    #[test]
    fn test_summary_without_session() {
        let line = summary(&view(json!({})), Utc::now(), Duration::ZERO);
        assert_eq!(line.as_deref(), Some("No live session"));
    }

    #[test]
    fn test_summary_of_live_session() {
        let line = summary(
            &view(json!({
                "Heartbeat": {},
                "SessionInfo": { "Name": "Race", "Meeting": { "Circuit": { "ShortName": "Spa" } } },
                "LapCount": { "CurrentLap": 4, "TotalLaps": 44 },
                "ExtrapolatedClock": { "Utc": "2024-07-28T13:00:00Z", "Remaining": "1:30:00", "Extrapolating": false }
            })),
            Utc::now(),
            Duration::ZERO,
        );
        assert_eq!(
            line.as_deref(),
            Some("Spa: Race | Lap 4/44 | 01:30:00 | 4 sections")
        );
    }
}
