// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Feed Layer
//!
//! Everything between the socket and the rendering layer: delaying inbound
//! snapshots, holding the current one, coordinating resyncs when the delay
//! changes, and deriving alerts and session views.

pub mod delay;
pub mod events;
pub mod notify;
pub mod resync;
pub mod session;
pub mod snapshot;

pub use delay::{Applied, DelayScheduler, Scheduled};
pub use events::{handler_fn, EventDispatcher, EventHandler, FeedEvent};
pub use notify::{
    alert_count, should_notify, NotificationError, NotificationSink, NotificationTrigger,
    SilentSink,
};
pub use resync::{
    DelayConfig, ResyncAction, ResyncCoordinator, ResyncState, COUNTDOWN_TICK, SETTLE_DELAY,
};
pub use session::{
    extrapolated_remaining, format_clock, lap_count, race_control_feed, session_title, LapCount,
    SessionStatus,
};
pub use snapshot::{DecodeError, Snapshot, SnapshotStore, SnapshotView};
