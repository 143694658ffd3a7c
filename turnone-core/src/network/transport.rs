// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Transport Seam
//!
//! Platform-agnostic abstraction over the feed socket. A [`Connector`] opens
//! sockets; each socket reports its lifecycle asynchronously through a
//! [`SocketEventSink`] and is closed through its [`SocketHandle`].

use tokio::sync::mpsc;
use url::Url;

/// Identifies one socket for the lifetime of a client.
pub type SocketId = u64;

/// Connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No socket is open or opening.
    #[default]
    Disconnected,
    /// A socket has been requested and is not open yet.
    Connecting,
    /// The socket is open and may deliver messages.
    Connected,
}

impl ConnectionState {
    /// Returns true for `Connecting` and `Connected`.
    pub fn is_live(self) -> bool {
        !matches!(self, ConnectionState::Disconnected)
    }
}

/// Lifecycle event reported by a socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    /// Handshake completed.
    Open,
    /// One complete inbound frame.
    Message(Vec<u8>),
    /// Socket-level failure. Always followed by `Close` once the socket is down.
    Error(String),
    /// The socket is down. Emitted exactly once per socket.
    Close,
}

/// Sender half used by a socket to report its events, tagged with its id.
#[derive(Debug, Clone)]
pub struct SocketEventSink {
    id: SocketId,
    tx: mpsc::UnboundedSender<(SocketId, SocketEvent)>,
}

impl SocketEventSink {
    /// Creates a sink for socket `id`.
    pub fn new(id: SocketId, tx: mpsc::UnboundedSender<(SocketId, SocketEvent)>) -> Self {
        SocketEventSink { id, tx }
    }

    /// The socket this sink reports for.
    pub fn id(&self) -> SocketId {
        self.id
    }

    /// Reports an event. Events sent after the client is torn down are dropped.
    pub fn emit(&self, event: SocketEvent) {
        let _ = self.tx.send((self.id, event));
    }
}

/// Handle to an open or opening socket.
pub trait SocketHandle: Send {
    /// Requests the socket to close.
    ///
    /// Completion is reported as [`SocketEvent::Close`]. Safe to call more
    /// than once.
    fn close(&mut self);
}

/// Opens sockets to the feed endpoint.
///
/// Opening never fails synchronously: failures are reported through the sink
/// as `Error` followed by `Close`, exactly like a socket that dies later.
pub trait Connector: Send {
    /// Starts opening a socket to `url`.
    fn open(&mut self, url: &Url, sink: SocketEventSink) -> Box<dyn SocketHandle>;
}
