// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Error Types
//!
//! Unified error type for the live feed client.

use thiserror::Error;

use crate::feed::{DecodeError, NotificationError};
use crate::network::NetworkError;

/// Unified error type for feed operations.
#[derive(Error, Debug)]
pub enum FeedError {
    /// Network operation failed.
    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    /// Inbound frame could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Notification playback failed.
    #[error("notification error: {0}")]
    Notification(#[from] NotificationError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The client has been torn down.
    #[error("client is shut down")]
    ClientClosed,

    /// The driver task ended abnormally.
    #[error("driver task failed: {0}")]
    Driver(String),
}

/// Result type for feed operations.
pub type FeedResult<T> = Result<T, FeedError>;
