// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Resync Coordinator
//!
//! State machine behind every broadcast-delay change:
//!
//! ```text
//! Idle --set_delay--> Blocking --settle--> Syncing --deadline--> Idle
//!          ^              |                   |
//!          +--set_delay---+-------------------+   (newest request wins)
//! ```
//!
//! While `Blocking` the old connection is torn down. `Syncing` starts with a
//! fresh connection and lasts until `armed_at + delay`, so the first data
//! shown after the resync is already delayed by the full amount.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info};

/// Wait between the forced close and the fresh connection attempt.
pub const SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Refresh period of the countdown signal while syncing.
pub const COUNTDOWN_TICK: Duration = Duration::from_millis(250);

/// Resync state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResyncState {
    /// No resync in progress.
    #[default]
    Idle,
    /// Old connection is being torn down.
    Blocking,
    /// Fresh connection is warming up until the resync deadline.
    Syncing,
}

/// A broadcast-delay request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayConfig {
    /// Requested delay in milliseconds.
    pub delay_ms: u64,
    /// Wall-clock time the request was made, in Unix milliseconds.
    pub armed_at_epoch_ms: i64,
}

impl DelayConfig {
    /// Creates a delay config armed at `armed_at`.
    pub fn new(delay_ms: u64, armed_at: DateTime<Utc>) -> Self {
        DelayConfig {
            delay_ms,
            armed_at_epoch_ms: armed_at.timestamp_millis(),
        }
    }

    /// The delay as a duration.
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Wall-clock resync deadline, in Unix milliseconds.
    pub fn resync_deadline_epoch_ms(&self) -> i64 {
        let delay = i64::try_from(self.delay_ms).unwrap_or(i64::MAX);
        self.armed_at_epoch_ms.saturating_add(delay)
    }
}

/// Something the coordinator needs its owner to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResyncAction {
    /// Open a fresh connection.
    Reconnect,
}

/// Drives the resync state machine and publishes the countdown signal.
///
/// Timers are deadlines polled through [`ResyncCoordinator::poll`];
/// replacing a request clears them, which is how in-flight ticks and
/// deadlines are cancelled.
#[derive(Debug)]
pub struct ResyncCoordinator {
    state: ResyncState,
    config: DelayConfig,
    armed_at: Option<Instant>,
    settle_at: Option<Instant>,
    next_tick: Option<Instant>,
    deadline: Option<Instant>,
    settle_delay: Duration,
    tick: Duration,
    countdown: watch::Sender<Option<u64>>,
}

impl ResyncCoordinator {
    /// Creates an idle coordinator with `initial` as the effective delay.
    pub fn new(initial: DelayConfig, settle_delay: Duration, tick: Duration) -> Self {
        let (countdown, _) = watch::channel(None);
        ResyncCoordinator {
            state: ResyncState::Idle,
            config: initial,
            armed_at: None,
            settle_at: None,
            next_tick: None,
            deadline: None,
            settle_delay,
            tick,
            countdown,
        }
    }

    /// Starts a resync for a new delay, replacing any resync in progress.
    ///
    /// The caller must clear accumulated state and force-close the
    /// connection right after this returns.
    pub fn request(&mut self, delay_ms: u64, now: Instant, wall: DateTime<Utc>) -> DelayConfig {
        if self.state != ResyncState::Idle {
            debug!("resync to {}ms replaces resync in progress", delay_ms);
        }
        info!("broadcast delay set to {}ms, resyncing", delay_ms);

        self.config = DelayConfig::new(delay_ms, wall);
        self.state = ResyncState::Blocking;
        self.armed_at = Some(now);
        self.settle_at = Some(now + self.settle_delay);
        self.next_tick = None;
        self.deadline = None;
        self.publish((delay_ms > 0).then_some(delay_ms));
        self.config
    }

    /// Advances the state machine to `now`.
    pub fn poll(&mut self, now: Instant) -> Option<ResyncAction> {
        let mut action = None;

        if self.state == ResyncState::Blocking && self.settle_at.is_some_and(|at| at <= now) {
            let armed_at = self.armed_at.unwrap_or(now);
            self.settle_at = None;
            self.state = ResyncState::Syncing;
            self.deadline = Some(armed_at + self.config.delay());
            self.next_tick = Some(now + self.tick);
            debug!("teardown settled, syncing");
            action = Some(ResyncAction::Reconnect);
            self.publish_remaining(now);
        }

        if self.state == ResyncState::Syncing {
            if self.deadline.map_or(true, |at| at <= now) {
                self.finish();
            } else if self.next_tick.is_some_and(|at| at <= now) {
                self.next_tick = Some(now + self.tick);
                self.publish_remaining(now);
            }
        }

        action
    }

    fn finish(&mut self) {
        info!("resync complete");
        self.state = ResyncState::Idle;
        self.armed_at = None;
        self.next_tick = None;
        self.deadline = None;
        self.publish(None);
    }

    /// Earliest pending timer.
    pub fn next_deadline(&self) -> Option<Instant> {
        [self.settle_at, self.next_tick, self.deadline]
            .into_iter()
            .flatten()
            .min()
    }

    /// Returns the current state.
    pub fn state(&self) -> ResyncState {
        self.state
    }

    /// Returns the effective delay configuration.
    pub fn delay_config(&self) -> DelayConfig {
        self.config
    }

    /// Returns the last published countdown.
    pub fn countdown_ms(&self) -> Option<u64> {
        *self.countdown.borrow()
    }

    /// Subscribes to the countdown signal.
    pub fn subscribe(&self) -> watch::Receiver<Option<u64>> {
        self.countdown.subscribe()
    }

    fn publish_remaining(&mut self, now: Instant) {
        if let Some(deadline) = self.deadline {
            let remaining = deadline.saturating_duration_since(now).as_millis();
            self.publish(Some(u64::try_from(remaining).unwrap_or(u64::MAX)));
        }
    }

    fn publish(&self, value: Option<u64>) {
        self.countdown.send_if_modified(|current| {
            let changed = *current != value;
            *current = value;
            changed
        });
    }
}
