// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Snapshot Store
//!
//! Holds the most recently applied feed snapshot.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::watch;

/// An inbound frame could not be decoded into a snapshot.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("could not process message: {0}")]
pub struct DecodeError(pub String);

/// One complete feed state, keyed by section name (`Heartbeat`,
/// `SessionInfo`, `TimingData`, ...).
///
/// Section payloads belong to the upstream feed and are kept as raw JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(Map<String, Value>);

impl Snapshot {
    /// An empty snapshot.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Decodes a frame. The frame must be a JSON object.
    pub fn decode(raw: &[u8]) -> Result<Self, DecodeError> {
        serde_json::from_slice::<Map<String, Value>>(raw)
            .map(Snapshot)
            .map_err(|e| DecodeError(e.to_string()))
    }

    /// Returns a section payload.
    pub fn section(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Returns true if the snapshot carries the given section.
    pub fn has_section(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Iterates over section names.
    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Number of sections.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the snapshot has no sections.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for Snapshot {
    fn from(map: Map<String, Value>) -> Self {
        Snapshot(map)
    }
}

/// What the store currently holds.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SnapshotView {
    /// Nothing has been applied yet.
    #[default]
    NoDataYet,
    /// The last applied snapshot.
    Ready {
        snapshot: Arc<Snapshot>,
        updated_at: DateTime<Utc>,
    },
}

impl SnapshotView {
    /// Returns the snapshot, if any.
    pub fn snapshot(&self) -> Option<&Arc<Snapshot>> {
        match self {
            SnapshotView::NoDataYet => None,
            SnapshotView::Ready { snapshot, .. } => Some(snapshot),
        }
    }

    /// Returns the time of the last update, if any.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        match self {
            SnapshotView::NoDataYet => None,
            SnapshotView::Ready { updated_at, .. } => Some(*updated_at),
        }
    }
}

/// Single-writer, many-reader holder of the current snapshot.
///
/// Readers either call [`SnapshotStore::current`] or keep a receiver from
/// [`SnapshotStore::subscribe`].
#[derive(Debug)]
pub struct SnapshotStore {
    tx: watch::Sender<SnapshotView>,
}

impl SnapshotStore {
    /// Creates an uninitialized store.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(SnapshotView::NoDataYet);
        SnapshotStore { tx }
    }

    /// Swaps in a new snapshot and returns the previous one.
    pub fn replace(&self, snapshot: impl Into<Arc<Snapshot>>) -> Option<Arc<Snapshot>> {
        let previous = self.tx.send_replace(SnapshotView::Ready {
            snapshot: snapshot.into(),
            updated_at: Utc::now(),
        });
        match previous {
            SnapshotView::NoDataYet => None,
            SnapshotView::Ready { snapshot, .. } => Some(snapshot),
        }
    }

    /// Empties the store. Readers see an empty snapshot, not `NoDataYet`.
    pub fn clear(&self) {
        self.replace(Snapshot::empty());
    }

    /// Returns what the store currently holds.
    pub fn current(&self) -> SnapshotView {
        self.tx.borrow().clone()
    }

    /// Subscribes to changes.
    pub fn subscribe(&self) -> watch::Receiver<SnapshotView> {
        self.tx.subscribe()
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}
