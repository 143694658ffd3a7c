// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Network Errors

use thiserror::Error;

/// Errors raised by the transport layer.
///
/// None of these are fatal to a running client: socket-level failures are
/// recovered by reconnecting and only ever surface as
/// [`ConnectionState::Disconnected`](super::ConnectionState::Disconnected).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    /// The origin could not be turned into a feed endpoint.
    #[error("Invalid origin: {0}")]
    InvalidOrigin(String),

    /// The origin uses a scheme that has no WebSocket counterpart.
    #[error("Unsupported scheme: {0}")]
    UnsupportedScheme(String),

    /// Opening the socket failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The socket reported an error while open.
    #[error("Socket error: {0}")]
    Socket(String),

    /// The socket is closed.
    #[error("Connection closed")]
    ConnectionClosed,
}
