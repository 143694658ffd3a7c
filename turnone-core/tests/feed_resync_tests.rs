// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tests for feed::resync, driven through the feed context

mod common;

use std::time::Duration;

use tokio::time::Instant;
use turnone_core::feed::*;
use turnone_core::network::{ConnectionState, SocketEvent};
use turnone_core::FeedConfig;

use common::{frame, harness, tag, Harness};

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

/// Starts a context and brings its first socket to `Connected` at `t0`.
fn connected(t0: Instant) -> Harness {
    let mut h = harness(FeedConfig::default());
    h.ctx.start();
    let id = h.mock.last_socket().unwrap();
    h.ctx.on_socket_event(id, SocketEvent::Open, t0);
    h.ctx.on_socket_event(id, SocketEvent::Message(frame(1)), t0);
    h
}

#[test]
fn test_delay_change_scenario() {
    let t0 = Instant::now();
    let mut h = connected(t0);
    let first = h.mock.last_socket().unwrap();
    assert_eq!(tag(&h.ctx.snapshot()), Some(1));

    h.ctx.set_delay(5000, t0);

    // Immediate teardown.
    assert_eq!(h.ctx.resync_state(), ResyncState::Blocking);
    assert_eq!(h.mock.close_requests(first), 1);
    assert!(h.ctx.snapshot().snapshot().unwrap().is_empty());
    assert_eq!(h.ctx.delay_config().delay_ms, 5000);
    assert_eq!(h.ctx.sync_countdown_ms(), Some(5000));

    h.ctx.on_socket_event(first, SocketEvent::Close, t0 + ms(20));
    assert_eq!(h.ctx.connection_state(), ConnectionState::Disconnected);
    assert!(!h.ctx.connection().reconnect_pending());

    // Settle: fresh connection, syncing.
    h.ctx.poll(t0 + ms(99));
    assert_eq!(h.mock.opened_count(), 1);
    h.ctx.poll(t0 + ms(100));
    assert_eq!(h.ctx.resync_state(), ResyncState::Syncing);
    assert_eq!(h.mock.opened_count(), 2);
    assert_eq!(h.ctx.connection_state(), ConnectionState::Connecting);
    assert_eq!(h.ctx.sync_countdown_ms(), Some(4900));

    // Ticks count down.
    h.ctx.poll(t0 + ms(350));
    assert_eq!(h.ctx.sync_countdown_ms(), Some(4650));

    h.ctx.poll(t0 + ms(4999));
    assert_eq!(h.ctx.resync_state(), ResyncState::Syncing);

    h.ctx.poll(t0 + ms(5000));
    assert_eq!(h.ctx.resync_state(), ResyncState::Idle);
    assert_eq!(h.ctx.sync_countdown_ms(), None);
    assert_eq!(h.ctx.next_deadline(), None);

    let states: Vec<_> = h
        .log
        .events()
        .into_iter()
        .filter_map(|e| match e {
            FeedEvent::ResyncStateChanged { state } => Some(state),
            _ => None,
        })
        .collect();
    assert_eq!(
        states,
        vec![ResyncState::Blocking, ResyncState::Syncing, ResyncState::Idle]
    );
}

#[test]
fn test_store_warms_up_while_syncing() {
    let t0 = Instant::now();
    let mut h = connected(t0);
    h.ctx.set_delay(1000, t0);
    h.ctx.poll(t0 + ms(100));

    let fresh = h.mock.last_socket().unwrap();
    h.ctx.on_socket_event(fresh, SocketEvent::Open, t0 + ms(120));
    h.ctx
        .on_socket_event(fresh, SocketEvent::Message(frame(2)), t0 + ms(150));

    h.ctx.poll(t0 + ms(1000));
    assert_eq!(h.ctx.resync_state(), ResyncState::Idle);
    assert!(h.ctx.snapshot().snapshot().unwrap().is_empty());

    h.ctx.poll(t0 + ms(1150));
    assert_eq!(tag(&h.ctx.snapshot()), Some(2));
}

#[test]
fn test_pending_snapshots_discarded_on_resync() {
    let t0 = Instant::now();
    let mut h = harness(FeedConfig::default().with_delay_ms(3000));
    h.ctx.start();
    let id = h.mock.last_socket().unwrap();
    h.ctx.on_socket_event(id, SocketEvent::Open, t0);
    h.ctx.on_socket_event(id, SocketEvent::Message(frame(1)), t0);
    assert_eq!(h.ctx.pending_count(), 1);

    h.ctx.set_delay(0, t0 + ms(10));
    assert_eq!(h.ctx.pending_count(), 0);

    h.ctx.poll(t0 + ms(3000));
    assert!(h.ctx.snapshot().snapshot().unwrap().is_empty());
}

#[test]
fn test_messages_from_closed_socket_are_dropped() {
    let t0 = Instant::now();
    let mut h = connected(t0);
    let first = h.mock.last_socket().unwrap();
    h.ctx.set_delay(0, t0);

    h.ctx
        .on_socket_event(first, SocketEvent::Message(frame(9)), t0 + ms(5));

    assert!(h.ctx.snapshot().snapshot().unwrap().is_empty());
}

#[test]
fn test_zero_delay_resync_completes_at_settle() {
    let t0 = Instant::now();
    let mut h = connected(t0);

    h.ctx.set_delay(0, t0);
    assert_eq!(h.ctx.sync_countdown_ms(), None);

    h.ctx.poll(t0 + ms(100));
    assert_eq!(h.ctx.resync_state(), ResyncState::Idle);
    assert_eq!(h.mock.opened_count(), 2);
}

#[test]
fn test_second_request_wins() {
    let t0 = Instant::now();
    let mut h = connected(t0);

    h.ctx.set_delay(5000, t0);
    h.ctx.poll(t0 + ms(100));
    h.ctx.poll(t0 + ms(350));
    assert_eq!(h.ctx.resync_state(), ResyncState::Syncing);
    let second = h.mock.last_socket().unwrap();

    let t1 = t0 + ms(400);
    h.ctx.set_delay(2000, t1);
    assert_eq!(h.ctx.resync_state(), ResyncState::Blocking);
    assert_eq!(h.mock.close_requests(second), 1);
    assert_eq!(h.ctx.sync_countdown_ms(), Some(2000));
    assert_eq!(h.ctx.next_deadline(), Some(t1 + ms(100)));

    h.ctx.poll(t1 + ms(100));
    assert_eq!(h.ctx.sync_countdown_ms(), Some(1900));
    assert_eq!(h.mock.opened_count(), 3);

    // The old 5000 ms deadline no longer applies.
    h.ctx.poll(t1 + ms(1999));
    assert_eq!(h.ctx.resync_state(), ResyncState::Syncing);
    h.ctx.poll(t1 + ms(2000));
    assert_eq!(h.ctx.resync_state(), ResyncState::Idle);
}

#[test]
fn test_request_while_blocking_restarts_settle() {
    let t0 = Instant::now();
    let mut h = connected(t0);

    h.ctx.set_delay(3000, t0);
    h.ctx.set_delay(4000, t0 + ms(50));
    h.ctx.poll(t0 + ms(100));

    assert_eq!(h.ctx.resync_state(), ResyncState::Blocking);
    assert_eq!(h.mock.opened_count(), 1);

    h.ctx.poll(t0 + ms(150));
    assert_eq!(h.ctx.resync_state(), ResyncState::Syncing);
    assert_eq!(h.ctx.sync_countdown_ms(), Some(3900));
}

#[test]
fn test_unexpected_close_while_syncing_recovers() {
    let t0 = Instant::now();
    let mut h = connected(t0);
    h.ctx.set_delay(10_000, t0);
    h.ctx.poll(t0 + ms(100));
    let fresh = h.mock.last_socket().unwrap();
    h.ctx.on_socket_event(fresh, SocketEvent::Open, t0 + ms(120));

    h.ctx.on_socket_event(fresh, SocketEvent::Close, t0 + ms(500));

    assert_eq!(h.ctx.connection_state(), ConnectionState::Disconnected);
    h.ctx.poll(t0 + ms(1500));
    assert_eq!(h.mock.opened_count(), 3);
}

#[test]
fn test_old_close_after_fresh_open_is_ignored() {
    let t0 = Instant::now();
    let mut h = connected(t0);
    let first = h.mock.last_socket().unwrap();
    h.ctx.set_delay(1000, t0);
    h.ctx.poll(t0 + ms(100));
    let fresh = h.mock.last_socket().unwrap();
    h.ctx.on_socket_event(fresh, SocketEvent::Open, t0 + ms(110));

    h.ctx.on_socket_event(first, SocketEvent::Close, t0 + ms(120));

    assert_eq!(h.ctx.connection_state(), ConnectionState::Connected);
    assert!(!h.ctx.connection().reconnect_pending());
}
