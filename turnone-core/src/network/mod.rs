// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Network + Transport Layer
//!
//! Owns the persistent connection to the live feed.
//!
//! # Architecture
//!
//! - **Transport seam**: [`Connector`] opens sockets, [`SocketHandle`] closes
//!   them, and every socket reports [`SocketEvent`]s through a
//!   [`SocketEventSink`]
//! - **WebSocket transport**: [`WebSocketConnector`] for production,
//!   [`MockConnector`] for tests
//! - **Connection manager**: one current socket, flat-backoff reconnect

mod connection;
mod error;
mod mock;
mod transport;
mod websocket;

// Error types
pub use error::NetworkError;

// Transport abstraction
pub use transport::{
    ConnectionState, Connector, SocketEvent, SocketEventSink, SocketHandle, SocketId,
};

// Mock connector for testing
pub use mock::MockConnector;

// WebSocket transport for production
pub use websocket::{feed_url, WebSocketConnector, FEED_PATH};

// Connection management
pub use connection::{ConnectionManager, RECONNECT_BACKOFF};
