// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Event System
//!
//! Callbacks for discrete feed events. Continuous state (connection,
//! countdown, snapshot) is better observed through the client's signals.

use std::sync::Arc;

use super::resync::{DelayConfig, ResyncState};
use super::snapshot::DecodeError;
use crate::network::ConnectionState;

/// Events emitted by the live feed client.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// Connection state changed.
    ConnectionStateChanged {
        /// The new connection state.
        state: ConnectionState,
    },

    /// Resync state changed.
    ResyncStateChanged {
        /// The new resync state.
        state: ResyncState,
    },

    /// A new broadcast delay was requested.
    DelayChanged {
        /// The request.
        config: DelayConfig,
    },

    /// A snapshot reached the store.
    SnapshotApplied {
        /// Number of sections in the snapshot.
        sections: usize,
    },

    /// An inbound frame was dropped.
    DecodeFailed {
        /// Why decoding failed.
        error: DecodeError,
    },

    /// New race-control messages or radio captures arrived.
    Alert {
        /// Total alert count in the current snapshot.
        count: usize,
    },
}

/// Receives feed events.
///
/// Handlers run on the driver task, in registration order, and must return
/// quickly. Any `Fn(&FeedEvent)` closure is a handler.
pub trait EventHandler: Send + Sync {
    fn on_event(&self, event: &FeedEvent);
}

impl<F> EventHandler for F
where
    F: Fn(&FeedEvent) + Send + Sync,
{
    fn on_event(&self, event: &FeedEvent) {
        self(event)
    }
}

/// Wraps a closure as a shareable handler.
///
/// ```
/// use turnone_core::feed::{handler_fn, FeedEvent};
///
/// let handler = handler_fn(|event: &FeedEvent| {
///     if let FeedEvent::Alert { count } = event {
///         println!("{} messages", count);
///     }
/// });
/// # let _ = handler;
/// ```
pub fn handler_fn<F>(f: F) -> Arc<dyn EventHandler>
where
    F: Fn(&FeedEvent) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Fans each event out to the registered handlers.
#[derive(Default)]
pub struct EventDispatcher {
    handlers: Vec<Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` after the existing ones.
    pub fn add_handler(&mut self, handler: Arc<dyn EventHandler>) {
        self.handlers.push(handler);
    }

    /// Delivers `event` to every handler.
    pub fn dispatch(&self, event: FeedEvent) {
        for handler in &self.handlers {
            handler.on_event(&event);
        }
    }
}
