// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Mock Connector
//!
//! In-memory [`Connector`] for tests. Records every socket it is asked to
//! open and every close request, and lets the test play the server side by
//! emitting socket events by hand.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use url::Url;

use super::transport::{Connector, SocketEvent, SocketEventSink, SocketHandle, SocketId};

#[derive(Debug)]
struct MockSocket {
    url: Url,
    sink: SocketEventSink,
    close_requests: usize,
}

#[derive(Debug, Default)]
struct MockState {
    sockets: Vec<MockSocket>,
}

/// Mock connector for testing.
///
/// Clones share state, so a test can keep one clone while the client owns
/// another.
#[derive(Debug, Clone, Default)]
pub struct MockConnector {
    state: Arc<Mutex<MockState>>,
}

impl MockConnector {
    /// Creates a new mock connector.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of sockets opened so far.
    pub fn opened_count(&self) -> usize {
        self.lock().sockets.len()
    }

    /// Id of the most recently opened socket.
    pub fn last_socket(&self) -> Option<SocketId> {
        self.lock().sockets.last().map(|s| s.sink.id())
    }

    /// URL the given socket was opened with.
    pub fn url_of(&self, id: SocketId) -> Option<Url> {
        self.lock()
            .sockets
            .iter()
            .find(|s| s.sink.id() == id)
            .map(|s| s.url.clone())
    }

    /// Number of times `close` was requested on the given socket.
    pub fn close_requests(&self, id: SocketId) -> usize {
        self.lock()
            .sockets
            .iter()
            .find(|s| s.sink.id() == id)
            .map_or(0, |s| s.close_requests)
    }

    /// Emits an event as if the given socket had produced it.
    ///
    /// Returns false if no such socket was opened.
    pub fn emit(&self, id: SocketId, event: SocketEvent) -> bool {
        let state = self.lock();
        match state.sockets.iter().find(|s| s.sink.id() == id) {
            Some(socket) => {
                socket.sink.emit(event);
                true
            }
            None => false,
        }
    }
}

impl Connector for MockConnector {
    fn open(&mut self, url: &Url, sink: SocketEventSink) -> Box<dyn SocketHandle> {
        let id = sink.id();
        self.lock().sockets.push(MockSocket {
            url: url.clone(),
            sink,
            close_requests: 0,
        });
        Box::new(MockHandle {
            id,
            state: Arc::clone(&self.state),
        })
    }
}

struct MockHandle {
    id: SocketId,
    state: Arc<Mutex<MockState>>,
}

impl SocketHandle for MockHandle {
    fn close(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(socket) = state.sockets.iter_mut().find(|s| s.sink.id() == self.id) {
            socket.close_requests += 1;
        }
    }
}
