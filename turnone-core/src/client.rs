// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Live Feed Client
//!
//! Public entry point. Spawns one driver task that owns a [`FeedContext`]
//! and serializes commands, socket events and timers onto it.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info};

use crate::config::FeedConfig;
use crate::context::{FeedContext, FeedSignals};
use crate::error::{FeedError, FeedResult};
use crate::feed::{EventDispatcher, EventHandler, NotificationSink, SilentSink, SnapshotView};
use crate::network::{ConnectionState, Connector, WebSocketConnector};

#[derive(Debug)]
enum Command {
    SetDelay(u64),
    Shutdown,
}

/// Handle to a running live feed client.
///
/// # Example
///
/// ```ignore
/// use turnone_core::{FeedConfig, LiveFeedClient};
///
/// let client = LiveFeedClient::init(FeedConfig::new("https://turnone.example.com"))?;
/// let mut snapshots = client.signals().snapshot;
/// client.set_delay(5_000)?;
/// snapshots.changed().await?;
/// client.teardown().await?;
/// ```
pub struct LiveFeedClient {
    commands: mpsc::UnboundedSender<Command>,
    signals: FeedSignals,
    task: Option<JoinHandle<()>>,
}

impl LiveFeedClient {
    /// Starts a client on the WebSocket transport with no audio.
    ///
    /// Must be called from within a tokio runtime.
    pub fn init(config: FeedConfig) -> FeedResult<Self> {
        Self::builder(config).start()
    }

    /// Returns a builder for a customized client.
    pub fn builder(config: FeedConfig) -> LiveFeedBuilder {
        LiveFeedBuilder::new(config)
    }

    /// Changes the broadcast delay, forcing a resync.
    pub fn set_delay(&self, delay_ms: u64) -> FeedResult<()> {
        self.commands
            .send(Command::SetDelay(delay_ms))
            .map_err(|_| FeedError::ClientClosed)
    }

    /// Receivers for the consumer-facing signals.
    pub fn signals(&self) -> FeedSignals {
        self.signals.clone()
    }

    /// Latest connection state.
    pub fn connection_state(&self) -> ConnectionState {
        self.signals.connection_state()
    }

    /// Latest syncing countdown.
    pub fn sync_countdown_ms(&self) -> Option<u64> {
        self.signals.sync_countdown_ms()
    }

    /// Latest snapshot.
    pub fn snapshot(&self) -> SnapshotView {
        self.signals.snapshot()
    }

    /// Stops the driver and closes the connection.
    pub async fn teardown(mut self) -> FeedResult<()> {
        let _ = self.commands.send(Command::Shutdown);
        match self.task.take() {
            Some(task) => task.await.map_err(|e| FeedError::Driver(e.to_string())),
            None => Ok(()),
        }
    }
}

impl Drop for LiveFeedClient {
    fn drop(&mut self) {
        if self.task.is_some() {
            let _ = self.commands.send(Command::Shutdown);
        }
    }
}

/// Builder for [`LiveFeedClient`].
pub struct LiveFeedBuilder<C = WebSocketConnector, S = SilentSink> {
    config: FeedConfig,
    connector: C,
    sink: S,
    events: EventDispatcher,
}

impl LiveFeedBuilder {
    /// Creates a builder with the WebSocket transport and no audio.
    pub fn new(config: FeedConfig) -> Self {
        LiveFeedBuilder {
            config,
            connector: WebSocketConnector::new(),
            sink: SilentSink,
            events: EventDispatcher::new(),
        }
    }
}

impl<C, S> LiveFeedBuilder<C, S>
where
    C: Connector + 'static,
    S: NotificationSink + 'static,
{
    /// Uses a different transport.
    pub fn connector<C2: Connector + 'static>(self, connector: C2) -> LiveFeedBuilder<C2, S> {
        LiveFeedBuilder {
            config: self.config,
            connector,
            sink: self.sink,
            events: self.events,
        }
    }

    /// Plays alerts through `sink`.
    pub fn notification_sink<S2: NotificationSink + 'static>(
        self,
        sink: S2,
    ) -> LiveFeedBuilder<C, S2> {
        LiveFeedBuilder {
            config: self.config,
            connector: self.connector,
            sink,
            events: self.events,
        }
    }

    /// Registers an event handler.
    pub fn event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.events.add_handler(handler);
        self
    }

    /// Spawns the driver task. Must be called from within a tokio runtime.
    pub fn start(self) -> FeedResult<LiveFeedClient> {
        let context = FeedContext::new(
            &self.config,
            self.connector,
            self.sink,
            Arc::new(self.events),
        )?;
        let signals = context.signals();
        let (commands, rx) = mpsc::unbounded_channel();

        info!("starting live feed client for {}", self.config.origin);
        let task = tokio::spawn(drive(context, rx));

        Ok(LiveFeedClient {
            commands,
            signals,
            task: Some(task),
        })
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}

async fn drive<C, S>(mut context: FeedContext<C, S>, mut commands: mpsc::UnboundedReceiver<Command>)
where
    C: Connector,
    S: NotificationSink,
{
    context.start();

    loop {
        let deadline = context.next_deadline();
        tokio::select! {
            biased;
            command = commands.recv() => match command {
                Some(Command::SetDelay(delay_ms)) => context.set_delay(delay_ms, Instant::now()),
                Some(Command::Shutdown) | None => break,
            },
            Some((id, event)) = context.next_socket_event() => {
                context.on_socket_event(id, event, Instant::now());
            }
            _ = sleep_until_deadline(deadline) => {}
        }
        context.poll(Instant::now());
    }

    context.teardown();
    debug!("live feed driver stopped");
}
