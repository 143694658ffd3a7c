// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Feed Context
//!
//! The single owned context holding every component of the client. All
//! state changes go through it on one logical timeline, so nothing in here
//! needs a lock. The async driver in [`crate::client`] feeds it commands,
//! socket events and timer expiries; tests can drive it directly with
//! synthetic instants.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::FeedConfig;
use crate::error::FeedResult;
use crate::feed::{
    alert_count, Applied, DelayConfig, DelayScheduler, EventDispatcher, FeedEvent,
    NotificationSink, NotificationTrigger, ResyncAction, ResyncCoordinator, ResyncState,
    Scheduled, Snapshot, SnapshotStore, SnapshotView,
};
use crate::network::{ConnectionManager, ConnectionState, Connector, SocketEvent, SocketId};

/// Receivers for the three consumer-facing signals.
#[derive(Debug, Clone)]
pub struct FeedSignals {
    /// Connection state.
    pub connection_state: watch::Receiver<ConnectionState>,
    /// Milliseconds until a resync completes; `None` when not resyncing.
    pub sync_countdown_ms: watch::Receiver<Option<u64>>,
    /// Current snapshot.
    pub snapshot: watch::Receiver<SnapshotView>,
}

impl FeedSignals {
    /// Latest connection state.
    pub fn connection_state(&self) -> ConnectionState {
        *self.connection_state.borrow()
    }

    /// Latest countdown.
    pub fn sync_countdown_ms(&self) -> Option<u64> {
        *self.sync_countdown_ms.borrow()
    }

    /// Latest snapshot.
    pub fn snapshot(&self) -> SnapshotView {
        self.snapshot.borrow().clone()
    }
}

/// Owned state of one live feed client.
pub struct FeedContext<C: Connector, S: NotificationSink> {
    connection: ConnectionManager<C>,
    scheduler: DelayScheduler,
    resync: ResyncCoordinator,
    trigger: NotificationTrigger<S>,
    events: Arc<EventDispatcher>,
    delay: Duration,
    socket_events: mpsc::UnboundedReceiver<(SocketId, SocketEvent)>,
}

impl<C: Connector, S: NotificationSink> FeedContext<C, S> {
    /// Builds the context. Nothing is opened until [`FeedContext::start`].
    pub fn new(
        config: &FeedConfig,
        connector: C,
        sink: S,
        events: Arc<EventDispatcher>,
    ) -> FeedResult<Self> {
        let url = config.feed_url()?;
        let (tx, socket_events) = mpsc::unbounded_channel();
        let initial = DelayConfig::new(config.initial_delay_ms, Utc::now());

        Ok(FeedContext {
            connection: ConnectionManager::new(connector, url, config.reconnect_backoff, tx),
            scheduler: DelayScheduler::new(SnapshotStore::new()),
            resync: ResyncCoordinator::new(initial, config.settle_delay, config.countdown_tick),
            trigger: NotificationTrigger::new(sink),
            events,
            delay: initial.delay(),
            socket_events,
        })
    }

    /// Opens the first connection.
    pub fn start(&mut self) {
        self.track_connection(|ctx| ctx.connection.connect());
    }

    /// Changes the broadcast delay and starts a resync.
    pub fn set_delay(&mut self, delay_ms: u64, now: Instant) {
        let before = self.resync.state();
        let config = self.resync.request(delay_ms, now, Utc::now());
        self.delay = config.delay();
        self.scheduler.reset();
        self.track_connection(|ctx| ctx.connection.force_close());

        self.events.dispatch(FeedEvent::DelayChanged { config });
        self.note_resync(before);
    }

    /// Applies one socket event.
    pub fn on_socket_event(&mut self, id: SocketId, event: SocketEvent, now: Instant) {
        // Only the teardown phase suppresses reconnects. A close while
        // Syncing is recovered, otherwise the fresh connection would stay
        // down until the next delay change.
        let reconnect_allowed = self.resync.state() != ResyncState::Blocking;
        let payload = self.track_connection(|ctx| {
            ctx.connection
                .handle_event(id, event, reconnect_allowed, now)
        });

        if let Some(payload) = payload {
            // The delay is captured here, at arrival.
            match self.scheduler.schedule(&payload, self.delay, now) {
                Ok(Scheduled::Applied(applied)) => self.after_apply(applied),
                Ok(Scheduled::Deferred { due }) => {
                    debug!("snapshot held for {:?}", due.saturating_duration_since(now));
                }
                Err(error) => {
                    warn!("{}", error);
                    self.events.dispatch(FeedEvent::DecodeFailed { error });
                }
            }
        }
    }

    /// Applies every socket event already queued.
    pub fn drain_socket_events(&mut self, now: Instant) {
        while let Ok((id, event)) = self.socket_events.try_recv() {
            self.on_socket_event(id, event, now);
        }
    }

    /// Waits for the next socket event.
    pub async fn next_socket_event(&mut self) -> Option<(SocketId, SocketEvent)> {
        self.socket_events.recv().await
    }

    /// Fires every timer due at or before `now`.
    pub fn poll(&mut self, now: Instant) {
        let before = self.resync.state();
        if let Some(ResyncAction::Reconnect) = self.resync.poll(now) {
            self.track_connection(|ctx| ctx.connection.connect());
        }
        self.note_resync(before);

        self.track_connection(|ctx| ctx.connection.poll(now));

        for applied in self.scheduler.poll(now) {
            self.after_apply(applied);
        }
    }

    /// Earliest pending timer across all components.
    pub fn next_deadline(&self) -> Option<Instant> {
        [
            self.connection.next_deadline(),
            self.scheduler.next_deadline(),
            self.resync.next_deadline(),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    /// Closes every socket. The context stays usable for inspection.
    pub fn teardown(&mut self) {
        debug!("tearing down feed context");
        self.track_connection(|ctx| ctx.connection.shutdown());
    }

    /// Receivers for the consumer-facing signals.
    pub fn signals(&self) -> FeedSignals {
        FeedSignals {
            connection_state: self.connection.subscribe(),
            sync_countdown_ms: self.resync.subscribe(),
            snapshot: self.scheduler.store().subscribe(),
        }
    }

    /// Current connection state.
    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Current resync state.
    pub fn resync_state(&self) -> ResyncState {
        self.resync.state()
    }

    /// Current countdown.
    pub fn sync_countdown_ms(&self) -> Option<u64> {
        self.resync.countdown_ms()
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> SnapshotView {
        self.scheduler.store().current()
    }

    /// Effective delay configuration.
    pub fn delay_config(&self) -> DelayConfig {
        self.resync.delay_config()
    }

    /// Number of snapshots waiting for their delay to elapse.
    pub fn pending_count(&self) -> usize {
        self.scheduler.pending_count()
    }

    /// The connection manager.
    pub fn connection(&self) -> &ConnectionManager<C> {
        &self.connection
    }

    fn after_apply(&mut self, applied: Applied) {
        self.events.dispatch(FeedEvent::SnapshotApplied {
            sections: applied.current.len(),
        });

        let empty = Snapshot::empty();
        let previous = applied.previous.as_deref().unwrap_or(&empty);
        if self.trigger.observe(previous, &applied.current) {
            self.events.dispatch(FeedEvent::Alert {
                count: alert_count(&applied.current),
            });
        }
    }

    fn track_connection<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let before = self.connection.state();
        let result = f(self);
        let state = self.connection.state();
        if state != before {
            self.events
                .dispatch(FeedEvent::ConnectionStateChanged { state });
        }
        result
    }

    fn note_resync(&self, before: ResyncState) {
        let state = self.resync.state();
        if state != before {
            self.events.dispatch(FeedEvent::ResyncStateChanged { state });
        }
    }
}
