// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Connection Manager
//!
//! Owns the feed socket and recovers from connection loss with a flat
//! backoff.

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

use super::transport::{
    ConnectionState, Connector, SocketEvent, SocketEventSink, SocketHandle, SocketId,
};

/// Default wait before reopening a socket that closed on its own.
pub const RECONNECT_BACKOFF: Duration = Duration::from_millis(1000);

struct ActiveSocket {
    id: SocketId,
    handle: Box<dyn SocketHandle>,
}

/// Connection manager with flat-backoff reconnection.
///
/// Keeps at most one *current* socket. A socket that was force-closed moves
/// to a closing set: its messages are dropped and its final `Close` only
/// matters if nothing newer has been opened since.
///
/// The manager never sleeps. Reconnects are armed as a deadline that the
/// owner polls with [`ConnectionManager::poll`].
///
/// # Example
///
/// ```ignore
/// use turnone_core::network::{ConnectionManager, MockConnector, feed_url};
///
/// let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
/// let url = feed_url("http://localhost:3000")?;
/// let mut conn = ConnectionManager::new(MockConnector::new(), url, RECONNECT_BACKOFF, tx);
/// conn.connect();
/// ```
pub struct ConnectionManager<C: Connector> {
    connector: C,
    url: Url,
    backoff: Duration,
    current: Option<ActiveSocket>,
    closing: Vec<ActiveSocket>,
    next_id: SocketId,
    reconnect_at: Option<Instant>,
    state: watch::Sender<ConnectionState>,
    events: mpsc::UnboundedSender<(SocketId, SocketEvent)>,
}

impl<C: Connector> ConnectionManager<C> {
    /// Creates a new connection manager. Sockets report into `events`.
    pub fn new(
        connector: C,
        url: Url,
        backoff: Duration,
        events: mpsc::UnboundedSender<(SocketId, SocketEvent)>,
    ) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        ConnectionManager {
            connector,
            url,
            backoff,
            current: None,
            closing: Vec::new(),
            next_id: 1,
            reconnect_at: None,
            state,
            events,
        }
    }

    /// Ensures exactly one socket is open or opening.
    ///
    /// No-op while a current socket exists. Clears any pending reconnect.
    pub fn connect(&mut self) {
        if self.current.is_some() {
            return;
        }
        self.reconnect_at = None;

        let id = self.next_id;
        self.next_id += 1;
        debug!("opening socket {} to {}", id, self.url);

        let sink = SocketEventSink::new(id, self.events.clone());
        let handle = self.connector.open(&self.url, sink);
        self.current = Some(ActiveSocket { id, handle });
        self.set_state(ConnectionState::Connecting);
    }

    /// Closes the current socket, if any, and cancels a pending reconnect.
    ///
    /// Does not schedule a reconnect.
    pub fn force_close(&mut self) {
        self.reconnect_at = None;
        if let Some(mut socket) = self.current.take() {
            debug!("force-closing socket {}", socket.id);
            socket.handle.close();
            self.closing.push(socket);
        }
    }

    /// Closes the current socket and forgets every socket.
    ///
    /// Sockets in the closing set were already asked to close and are not
    /// asked again.
    pub fn shutdown(&mut self) {
        self.reconnect_at = None;
        if let Some(mut socket) = self.current.take() {
            debug!("closing socket {} on shutdown", socket.id);
            socket.handle.close();
        }
        self.closing.clear();
        self.set_state(ConnectionState::Disconnected);
    }

    /// Applies a socket lifecycle event.
    ///
    /// Returns the payload of a `Message` from the current socket.
    /// `reconnect_allowed` is false while a resync teardown is in progress.
    pub fn handle_event(
        &mut self,
        id: SocketId,
        event: SocketEvent,
        reconnect_allowed: bool,
        now: Instant,
    ) -> Option<Vec<u8>> {
        let is_current = self.current.as_ref().is_some_and(|s| s.id == id);
        if !is_current {
            self.handle_stale_event(id, event);
            return None;
        }

        match event {
            SocketEvent::Open => {
                info!("connected to {}", self.url);
                self.set_state(ConnectionState::Connected);
                None
            }
            SocketEvent::Message(payload) => Some(payload),
            SocketEvent::Error(reason) => {
                warn!("socket {} error: {}", id, reason);
                if let Some(socket) = self.current.as_mut() {
                    socket.handle.close();
                }
                None
            }
            SocketEvent::Close => {
                self.current = None;
                self.set_state(ConnectionState::Disconnected);
                if self.reconnect_at.is_none() && reconnect_allowed {
                    debug!("socket {} closed, reconnecting in {:?}", id, self.backoff);
                    self.reconnect_at = Some(now + self.backoff);
                } else {
                    debug!("socket {} closed", id);
                }
                None
            }
        }
    }

    fn handle_stale_event(&mut self, id: SocketId, event: SocketEvent) {
        let Some(pos) = self.closing.iter().position(|s| s.id == id) else {
            return;
        };
        if event == SocketEvent::Close {
            self.closing.remove(pos);
            if self.current.is_none() {
                self.set_state(ConnectionState::Disconnected);
            }
        }
    }

    /// Fires the reconnect if it is due.
    pub fn poll(&mut self, now: Instant) {
        if self.reconnect_at.is_some_and(|at| at <= now) {
            self.reconnect_at = None;
            self.connect();
        }
    }

    /// Deadline of the pending reconnect, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.reconnect_at
    }

    /// Returns true if a reconnect is pending.
    pub fn reconnect_pending(&self) -> bool {
        self.reconnect_at.is_some()
    }

    /// Returns the current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Returns true if connected and ready.
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Id of the current socket.
    pub fn current_socket(&self) -> Option<SocketId> {
        self.current.as_ref().map(|s| s.id)
    }

    /// Subscribes to connection state changes.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Returns the feed endpoint.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Returns a reference to the underlying connector.
    pub fn connector(&self) -> &C {
        &self.connector
    }

    fn set_state(&mut self, state: ConnectionState) {
        self.state.send_if_modified(|current| {
            let changed = *current != state;
            *current = state;
            changed
        });
    }
}
