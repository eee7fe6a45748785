//! Bounded history of layout snapshots.

use crate::layout::LayoutConfiguration;
use crate::model::{ElementId, Rect, ViewportDimensions};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

/// One saved layout.
///
/// The configuration is shared and immutable; everything else is owned, so a
/// clone handed to a caller is fully detached from the stored copy.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutSnapshot {
    /// When the snapshot was saved.
    pub timestamp: DateTime<Utc>,
    /// Viewport the layout was computed for.
    pub viewport: ViewportDimensions,
    /// Applied configuration.
    pub configuration: Arc<LayoutConfiguration>,
    /// Measured element rectangles at save time.
    pub element_dimensions: BTreeMap<ElementId, Rect>,
    /// Whether the layout is usable as a recovery target.
    pub is_valid: bool,
}

impl LayoutSnapshot {
    /// Valid snapshot stamped with the current wall-clock time.
    pub fn new(
        configuration: Arc<LayoutConfiguration>,
        element_dimensions: BTreeMap<ElementId, Rect>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            viewport: configuration.viewport(),
            configuration,
            element_dimensions,
            is_valid: true,
        }
    }

    /// Same snapshot with the validity flag replaced.
    pub fn with_validity(mut self, is_valid: bool) -> Self {
        self.is_valid = is_valid;
        self
    }
}

/// FIFO of snapshots, oldest evicted first.
#[derive(Debug, Clone)]
pub struct StateHistory {
    entries: VecDeque<LayoutSnapshot>,
    capacity: usize,
}

impl StateHistory {
    /// Empty history. A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Maximum retained snapshots.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append, evicting the oldest entries beyond capacity.
    pub fn push(&mut self, snapshot: LayoutSnapshot) {
        self.entries.push_back(snapshot);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Newest snapshot.
    pub fn latest(&self) -> Option<&LayoutSnapshot> {
        self.entries.back()
    }

    /// Newest snapshot, mutably.
    pub(crate) fn latest_mut(&mut self) -> Option<&mut LayoutSnapshot> {
        self.entries.back_mut()
    }

    /// Most recent snapshot with `is_valid == true`.
    pub fn latest_valid(&self) -> Option<&LayoutSnapshot> {
        self.entries.iter().rev().find(|snapshot| snapshot.is_valid)
    }

    /// Snapshots oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &LayoutSnapshot> {
        self.entries.iter()
    }

    /// Snapshots held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// No snapshot saved yet (or all cleared).
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every snapshot.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
