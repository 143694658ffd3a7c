// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Notification Trigger
//!
//! Fires an audible alert when a new race-control message or team radio
//! capture shows up.

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use super::snapshot::Snapshot;

/// Section carrying race-control messages.
pub const RACE_CONTROL_SECTION: &str = "RaceControlMessages";
/// Field of [`RACE_CONTROL_SECTION`] listing the messages.
pub const RACE_CONTROL_MESSAGES: &str = "Messages";
/// Section carrying team radio captures.
pub const TEAM_RADIO_SECTION: &str = "TeamRadio";
/// Field of [`TEAM_RADIO_SECTION`] listing the captures.
pub const TEAM_RADIO_CAPTURES: &str = "Captures";

/// Playing the notification clip failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("notification playback failed: {0}")]
pub struct NotificationError(pub String);

/// Fire-and-forget output for the notification clip.
pub trait NotificationSink: Send {
    /// Plays the clip once.
    fn play(&self) -> Result<(), NotificationError>;
}

/// Sink that plays nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentSink;

impl NotificationSink for SilentSink {
    fn play(&self) -> Result<(), NotificationError> {
        Ok(())
    }
}

fn entry_count(value: Option<&Value>) -> usize {
    match value {
        Some(Value::Array(items)) => items.len(),
        Some(Value::Object(items)) => items.len(),
        _ => 0,
    }
}

/// Number of race-control messages plus team radio captures.
///
/// Lists may arrive as arrays or as index-keyed objects; missing sections
/// count as zero.
pub fn alert_count(snapshot: &Snapshot) -> usize {
    let messages = snapshot
        .section(RACE_CONTROL_SECTION)
        .and_then(|s| s.get(RACE_CONTROL_MESSAGES));
    let captures = snapshot
        .section(TEAM_RADIO_SECTION)
        .and_then(|s| s.get(TEAM_RADIO_CAPTURES));
    entry_count(messages) + entry_count(captures)
}

/// True iff `current` carries strictly more alerts than `previous`.
pub fn should_notify(previous: &Snapshot, current: &Snapshot) -> bool {
    alert_count(current) > alert_count(previous)
}

/// Edge-triggered alert on top of a [`NotificationSink`].
pub struct NotificationTrigger<S: NotificationSink> {
    sink: S,
}

impl<S: NotificationSink> NotificationTrigger<S> {
    /// Creates a trigger playing through `sink`.
    pub fn new(sink: S) -> Self {
        NotificationTrigger { sink }
    }

    /// Plays the clip if the alert count went up. Playback errors are
    /// swallowed.
    ///
    /// Returns whether an alert was raised.
    pub fn observe(&self, previous: &Snapshot, current: &Snapshot) -> bool {
        if !should_notify(previous, current) {
            return false;
        }
        if let Err(e) = self.sink.play() {
            debug!("{}", e);
        }
        true
    }

    /// Returns a reference to the sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }
}
