// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Turn One Core Library
//!
//! Live feed synchronization client: keeps one WebSocket to the telemetry
//! feed, holds every snapshot back by a configurable broadcast delay, and
//! resyncs the connection whenever that delay changes.

pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod feed;
pub mod network;

pub use client::{LiveFeedBuilder, LiveFeedClient};
pub use config::FeedConfig;
pub use context::{FeedContext, FeedSignals};
pub use error::{FeedError, FeedResult};
pub use feed::{
    handler_fn, should_notify, DecodeError, DelayConfig, EventDispatcher, EventHandler,
    FeedEvent, NotificationError, NotificationSink, ResyncState, SilentSink, Snapshot,
    SnapshotView,
};
pub use network::{
    feed_url, ConnectionState, Connector, MockConnector, NetworkError, SocketEvent,
    WebSocketConnector,
};
