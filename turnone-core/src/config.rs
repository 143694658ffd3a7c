// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Client Configuration

use std::time::Duration;

use url::Url;

use crate::error::{FeedError, FeedResult};
use crate::feed::{COUNTDOWN_TICK, SETTLE_DELAY};
use crate::network::{feed_url, RECONNECT_BACKOFF};

/// Origin used when none is configured.
pub const DEFAULT_ORIGIN: &str = "http://localhost:3000";

/// Environment variable holding the origin.
pub const ENV_ORIGIN: &str = "TURNONE_ORIGIN";

/// Environment variable holding the initial broadcast delay in milliseconds.
pub const ENV_DELAY_MS: &str = "TURNONE_DELAY_MS";

/// Configuration for the live feed client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    /// Origin hosting the feed (e.g., "https://turnone.example.com").
    /// The socket connects to its `/ws` endpoint.
    pub origin: String,

    /// Broadcast delay in effect at start-up. Applied without a resync.
    pub initial_delay_ms: u64,

    /// Wait before reopening a socket that closed on its own.
    pub reconnect_backoff: Duration,

    /// Wait between a forced close and the fresh connection of a resync.
    pub settle_delay: Duration,

    /// Refresh period of the syncing countdown.
    pub countdown_tick: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        FeedConfig {
            origin: DEFAULT_ORIGIN.to_string(),
            initial_delay_ms: 0,
            reconnect_backoff: RECONNECT_BACKOFF,
            settle_delay: SETTLE_DELAY,
            countdown_tick: COUNTDOWN_TICK,
        }
    }
}

impl FeedConfig {
    /// Creates a config for `origin` with default timings.
    pub fn new(origin: impl Into<String>) -> Self {
        FeedConfig {
            origin: origin.into(),
            ..Default::default()
        }
    }

    /// Sets the start-up broadcast delay.
    pub fn with_delay_ms(mut self, delay_ms: u64) -> Self {
        self.initial_delay_ms = delay_ms;
        self
    }

    /// Sets the reconnect backoff.
    pub fn with_reconnect_backoff(mut self, backoff: Duration) -> Self {
        self.reconnect_backoff = backoff;
        self
    }

    /// Loads the config from `TURNONE_ORIGIN` and `TURNONE_DELAY_MS`.
    ///
    /// Unset variables fall back to the defaults.
    pub fn from_env() -> FeedResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads the config through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> FeedResult<Self> {
        let mut config = FeedConfig::default();

        if let Some(origin) = lookup(ENV_ORIGIN).filter(|v| !v.trim().is_empty()) {
            config.origin = origin.trim().to_string();
        }

        if let Some(delay) = lookup(ENV_DELAY_MS) {
            config.initial_delay_ms = delay.trim().parse().map_err(|_| {
                FeedError::Configuration(format!(
                    "{} must be a non-negative integer, got {:?}",
                    ENV_DELAY_MS, delay
                ))
            })?;
        }

        Ok(config)
    }

    /// Resolves the WebSocket endpoint for the configured origin.
    pub fn feed_url(&self) -> FeedResult<Url> {
        Ok(feed_url(&self.origin)?)
    }
}
