// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tests for feed::delay and message flow through the context

mod common;

use std::time::Duration;

use tokio::time::Instant;
use turnone_core::feed::*;
use turnone_core::network::{ConnectionState, SocketEvent};
use turnone_core::FeedConfig;

use common::{frame, harness, tag};

#[test]
fn test_message_not_applied_before_delay() {
    let mut scheduler = DelayScheduler::new(SnapshotStore::new());
    let t0 = Instant::now();
    let delay = Duration::from_millis(3000);

    let scheduled = scheduler.schedule(&frame(1), delay, t0).unwrap();
    assert!(matches!(scheduled, Scheduled::Deferred { due } if due == t0 + delay));

    assert!(scheduler.poll(t0 + Duration::from_millis(2999)).is_empty());
    assert_eq!(scheduler.store().current(), SnapshotView::NoDataYet);
    assert_eq!(scheduler.next_deadline(), Some(t0 + delay));

    let applied = scheduler.poll(t0 + delay);
    assert_eq!(applied.len(), 1);
    assert!(applied[0].previous.is_none());
    assert_eq!(tag(&scheduler.store().current()), Some(1));
}

#[test]
fn test_constant_delay_preserves_arrival_order() {
    let mut scheduler = DelayScheduler::new(SnapshotStore::new());
    let t0 = Instant::now();
    let delay = Duration::from_millis(1000);

    for n in 0..5u64 {
        scheduler
            .schedule(&frame(n), delay, t0 + Duration::from_millis(n * 10))
            .unwrap();
    }

    let applied = scheduler.poll(t0 + Duration::from_secs(10));
    let order: Vec<_> = applied
        .iter()
        .map(|a| a.current.section("Heartbeat").unwrap()["n"].as_u64().unwrap())
        .collect();
    assert_eq!(order, vec![0, 1, 2, 3, 4]);
}

#[test]
fn test_shorter_delay_can_overtake() {
    // Accepted non-guarantee: a delay change between arrivals may reorder.
    let mut scheduler = DelayScheduler::new(SnapshotStore::new());
    let t0 = Instant::now();

    scheduler
        .schedule(&frame(1), Duration::from_millis(5000), t0)
        .unwrap();
    scheduler
        .schedule(&frame(2), Duration::from_millis(100), t0 + Duration::from_millis(10))
        .unwrap();

    let applied = scheduler.poll(t0 + Duration::from_millis(200));
    assert_eq!(applied.len(), 1);
    assert_eq!(tag(&scheduler.store().current()), Some(2));
}

#[test]
fn test_decode_error_leaves_store_untouched() {
    let mut scheduler = DelayScheduler::new(SnapshotStore::new());
    let t0 = Instant::now();
    scheduler.schedule(&frame(7), Duration::ZERO, t0).unwrap();

    let result = scheduler.schedule(b"{not json", Duration::ZERO, t0);
    assert!(matches!(result, Err(DecodeError(_))));

    let result = scheduler.schedule(b"[1, 2, 3]", Duration::ZERO, t0);
    assert!(result.is_err());

    assert_eq!(tag(&scheduler.store().current()), Some(7));
    assert_eq!(scheduler.pending_count(), 0);
}

#[test]
fn test_replace_supersedes_whole_snapshot() {
    let store = SnapshotStore::new();
    store.replace(Snapshot::decode(br#"{"A":1,"B":2}"#).unwrap());
    let previous = store.replace(Snapshot::decode(br#"{"B":3}"#).unwrap());

    assert_eq!(previous.unwrap().len(), 2);
    let current = store.current();
    let snapshot = current.snapshot().unwrap();
    assert!(!snapshot.has_section("A"));
    assert_eq!(snapshot.section("B"), Some(&serde_json::json!(3)));
    assert!(current.updated_at().is_some());
}

#[test]
fn test_store_subscribers_see_updates() {
    let store = SnapshotStore::new();
    let mut rx = store.subscribe();
    assert!(!rx.has_changed().unwrap());

    store.replace(Snapshot::decode(&frame(3)).unwrap());

    assert!(rx.has_changed().unwrap());
    assert_eq!(tag(&rx.borrow_and_update()), Some(3));
}

#[test]
fn test_malformed_frame_scenario() {
    let mut h = harness(FeedConfig::default());
    let now = Instant::now();
    h.ctx.start();
    let id = h.mock.last_socket().unwrap();
    h.ctx.on_socket_event(id, SocketEvent::Open, now);
    h.ctx.on_socket_event(id, SocketEvent::Message(frame(1)), now);
    let before = h.ctx.snapshot();

    h.ctx
        .on_socket_event(id, SocketEvent::Message(b"{\"Heartbeat\":".to_vec()), now);

    assert_eq!(h.ctx.snapshot(), before);
    assert_eq!(h.ctx.connection_state(), ConnectionState::Connected);
    assert!(!h.ctx.connection().reconnect_pending());
    assert_eq!(
        h.log
            .count(|e| matches!(e, FeedEvent::DecodeFailed { .. })),
        1
    );
}

#[test]
fn test_delay_captured_at_arrival() {
    let mut h = harness(FeedConfig::default().with_delay_ms(2000));
    let t0 = Instant::now();
    h.ctx.start();
    let id = h.mock.last_socket().unwrap();
    h.ctx.on_socket_event(id, SocketEvent::Open, t0);

    h.ctx.on_socket_event(id, SocketEvent::Message(frame(1)), t0);
    assert_eq!(h.ctx.pending_count(), 1);
    assert_eq!(h.ctx.snapshot(), SnapshotView::NoDataYet);

    h.ctx.poll(t0 + Duration::from_millis(1999));
    assert_eq!(h.ctx.snapshot(), SnapshotView::NoDataYet);

    h.ctx.poll(t0 + Duration::from_millis(2000));
    assert_eq!(tag(&h.ctx.snapshot()), Some(1));
    assert_eq!(
        h.log
            .count(|e| matches!(e, FeedEvent::SnapshotApplied { sections: 1 })),
        1
    );
}
