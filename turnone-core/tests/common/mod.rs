// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use turnone_core::feed::{handler_fn, EventDispatcher, EventHandler, FeedEvent};
use turnone_core::{FeedConfig, FeedContext, MockConnector, NotificationError, NotificationSink};

/// Sink that counts plays and can be told to fail.
#[derive(Clone, Default)]
pub struct CountingSink {
    plays: Arc<AtomicUsize>,
    fail: Arc<AtomicBool>,
}

impl CountingSink {
    pub fn failing() -> Self {
        let sink = Self::default();
        sink.fail.store(true, Ordering::SeqCst);
        sink
    }

    pub fn plays(&self) -> usize {
        self.plays.load(Ordering::SeqCst)
    }
}

impl NotificationSink for CountingSink {
    fn play(&self) -> Result<(), NotificationError> {
        self.plays.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(NotificationError("no audio device".into()));
        }
        Ok(())
    }
}

/// Collects every dispatched event.
#[derive(Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<FeedEvent>>>,
}

impl EventLog {
    pub fn handler(&self) -> Arc<dyn EventHandler> {
        let events = Arc::clone(&self.events);
        handler_fn(move |event| events.lock().unwrap().push(event.clone()))
    }

    pub fn dispatcher(&self) -> EventDispatcher {
        let mut dispatcher = EventDispatcher::new();
        dispatcher.add_handler(self.handler());
        dispatcher
    }

    pub fn events(&self) -> Vec<FeedEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, predicate: impl Fn(&FeedEvent) -> bool) -> usize {
        self.events().iter().filter(|e| predicate(e)).count()
    }
}

pub struct Harness {
    pub ctx: FeedContext<MockConnector, CountingSink>,
    pub mock: MockConnector,
    pub sink: CountingSink,
    pub log: EventLog,
}

pub fn harness(config: FeedConfig) -> Harness {
    harness_with_sink(config, CountingSink::default())
}

pub fn harness_with_sink(config: FeedConfig, sink: CountingSink) -> Harness {
    let mock = MockConnector::new();
    let log = EventLog::default();
    let ctx = FeedContext::new(
        &config,
        mock.clone(),
        sink.clone(),
        Arc::new(log.dispatcher()),
    )
    .unwrap();
    Harness {
        ctx,
        mock,
        sink,
        log,
    }
}

/// A snapshot frame carrying `messages` race-control messages and
/// `captures` radio captures.
pub fn frame_with_alerts(messages: usize, captures: usize) -> Vec<u8> {
    let messages: Vec<_> = (0..messages)
        .map(|i| serde_json::json!({ "Utc": "2024-05-26T13:00:00", "Message": format!("msg {}", i) }))
        .collect();
    let captures: Vec<_> = (0..captures)
        .map(|i| serde_json::json!({ "Utc": "2024-05-26T13:00:00", "Path": format!("clip{}.mp3", i) }))
        .collect();
    serde_json::to_vec(&serde_json::json!({
        "Heartbeat": { "Utc": "2024-05-26T13:00:00Z" },
        "RaceControlMessages": { "Messages": messages },
        "TeamRadio": { "Captures": captures },
    }))
    .unwrap()
}

/// A minimal frame tagged with `n`.
pub fn frame(n: u64) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({ "Heartbeat": { "n": n } })).unwrap()
}

/// Reads the tag written by [`frame`].
pub fn tag(view: &turnone_core::SnapshotView) -> Option<u64> {
    view.snapshot()?.section("Heartbeat")?.get("n")?.as_u64()
}
