// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Delay Scheduler
//!
//! Holds every decoded message back for the broadcast delay that was in
//! effect when it arrived, then applies it to the [`SnapshotStore`].

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use super::snapshot::{DecodeError, Snapshot, SnapshotStore};

/// A snapshot that has just been written to the store.
#[derive(Debug, Clone)]
pub struct Applied {
    /// What the store held before, `None` if nothing had been applied yet.
    pub previous: Option<Arc<Snapshot>>,
    /// What the store holds now.
    pub current: Arc<Snapshot>,
}

/// Outcome of [`DelayScheduler::schedule`].
#[derive(Debug, Clone)]
pub enum Scheduled {
    /// Zero delay: applied on the spot.
    Applied(Applied),
    /// Held back until `due`.
    Deferred { due: Instant },
}

/// Per-message delay queue in front of the snapshot store.
///
/// Pending applications are keyed by due instant and arrival sequence, so
/// they fire first-due-first-applied and messages due at the same instant
/// keep their arrival order.
#[derive(Debug)]
pub struct DelayScheduler {
    store: SnapshotStore,
    pending: BTreeMap<(Instant, u64), Snapshot>,
    next_seq: u64,
}

impl DelayScheduler {
    /// Creates a scheduler writing into `store`.
    pub fn new(store: SnapshotStore) -> Self {
        DelayScheduler {
            store,
            pending: BTreeMap::new(),
            next_seq: 0,
        }
    }

    /// Decodes `raw` and schedules it `delay` after `now`.
    ///
    /// Undecodable frames are rejected without touching the store.
    pub fn schedule(
        &mut self,
        raw: &[u8],
        delay: Duration,
        now: Instant,
    ) -> Result<Scheduled, DecodeError> {
        let snapshot = Snapshot::decode(raw)?;

        if delay.is_zero() {
            return Ok(Scheduled::Applied(self.apply(snapshot)));
        }

        let due = now + delay;
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.insert((due, seq), snapshot);
        Ok(Scheduled::Deferred { due })
    }

    /// Applies every pending snapshot due at or before `now`, in order.
    pub fn poll(&mut self, now: Instant) -> Vec<Applied> {
        let mut applied = Vec::new();
        while let Some(entry) = self.pending.first_entry() {
            if entry.key().0 > now {
                break;
            }
            let snapshot = entry.remove();
            applied.push(self.apply(snapshot));
        }
        applied
    }

    /// Due instant of the next pending application.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.keys().next().map(|(due, _)| *due)
    }

    /// Number of applications still pending.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Drops every pending application and empties the store.
    pub fn reset(&mut self) {
        if !self.pending.is_empty() {
            debug!("discarding {} pending snapshots", self.pending.len());
        }
        self.pending.clear();
        self.store.clear();
    }

    /// The store this scheduler writes to.
    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    fn apply(&mut self, snapshot: Snapshot) -> Applied {
        let current = Arc::new(snapshot);
        let previous = self.store.replace(Arc::clone(&current));
        Applied { previous, current }
    }
}
