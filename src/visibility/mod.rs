//! Viewport visibility classification for tracked elements.
//!
//! Records are kept in memory only. Change notification is an explicit
//! subscriber list dispatched synchronously at the end of every
//! [`VisibilityDetector::refresh`], and only for elements whose visibility
//! actually flipped.

use crate::model::{ElementId, Rect};
use crate::surface::RenderSurface;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Why an element is (in)visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum VisibilityReason {
    /// Entirely inside the viewport.
    WithinBounds,
    /// Intersects the viewport but crosses an edge.
    PartialOverlap,
    /// No intersection (or the host no longer has the element).
    FullyOutside,
    /// Hidden by the host regardless of geometry.
    ExplicitlyHidden,
}

/// Visibility record of one element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VisibilityStatus {
    /// Whether any part of the element is on screen.
    pub visible: bool,
    /// Classification detail.
    pub reason: VisibilityReason,
}

/// Read-only snapshot of all visibility records.
pub type VisibilityMap = BTreeMap<ElementId, VisibilityStatus>;

/// Classify a rectangle against a `viewport_width x viewport_height` viewport.
///
/// An element intersects the viewport iff
/// `x < width && x + w > 0 && y < height && y + h > 0`. Zero-sized elements
/// follow the same rule. `None` (element gone from the host) is fully outside.
pub fn classify(
    rect: Option<Rect>,
    hidden: bool,
    viewport_width: f64,
    viewport_height: f64,
) -> VisibilityStatus {
    if hidden {
        return VisibilityStatus {
            visible: false,
            reason: VisibilityReason::ExplicitlyHidden,
        };
    }
    let Some(rect) = rect else {
        return VisibilityStatus {
            visible: false,
            reason: VisibilityReason::FullyOutside,
        };
    };

    let intersects = rect.x < viewport_width
        && rect.right() > 0.0
        && rect.y < viewport_height
        && rect.bottom() > 0.0;
    if !intersects {
        return VisibilityStatus {
            visible: false,
            reason: VisibilityReason::FullyOutside,
        };
    }

    let within = rect.x >= 0.0
        && rect.y >= 0.0
        && rect.right() <= viewport_width
        && rect.bottom() <= viewport_height;
    VisibilityStatus {
        visible: true,
        reason: if within {
            VisibilityReason::WithinBounds
        } else {
            VisibilityReason::PartialOverlap
        },
    }
}

/// Handle returned by [`VisibilityDetector::on_visibility_change`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Callback invoked with `(element, new_status)` when visibility flips.
pub type VisibilityCallback = Box<dyn FnMut(&ElementId, VisibilityStatus)>;

/// Outcome of one refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshReport {
    /// Elements whose visibility flipped.
    pub changed: usize,
    /// Time spent classifying and dispatching.
    pub elapsed: Duration,
    /// Whether `elapsed` stayed within the latency budget.
    pub within_budget: bool,
}

/// Tracks visibility of observed elements.
pub struct VisibilityDetector {
    records: VisibilityMap,
    subscribers: Vec<(SubscriptionId, VisibilityCallback)>,
    next_subscription: u64,
    budget: Duration,
}

impl fmt::Debug for VisibilityDetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisibilityDetector")
            .field("records", &self.records)
            .field("subscribers", &self.subscribers.len())
            .field("budget", &self.budget)
            .finish()
    }
}

impl Default for VisibilityDetector {
    fn default() -> Self {
        Self::new(Duration::from_millis(100))
    }
}

impl VisibilityDetector {
    /// Detector whose refreshes should finish within `budget`.
    pub fn new(budget: Duration) -> Self {
        Self {
            records: VisibilityMap::new(),
            subscribers: Vec::new(),
            next_subscription: 0,
            budget,
        }
    }

    /// Begin tracking an element; its record is created immediately.
    ///
    /// Observing an already tracked element re-classifies it without notifying.
    pub fn observe(&mut self, surface: &dyn RenderSurface, id: ElementId) -> VisibilityStatus {
        let (width, height) = surface.viewport_size();
        let status = classify(surface.element_rect(&id), surface.is_hidden(&id), width, height);
        debug!(element = %id, visible = status.visible, "Observing element");
        self.records.insert(id, status);
        status
    }

    /// Stop tracking an element and drop its record.
    ///
    /// Returns `false` if the element was not observed.
    pub fn unobserve(&mut self, id: &ElementId) -> bool {
        self.records.remove(id).is_some()
    }

    /// Stop tracking everything.
    pub fn unobserve_all(&mut self) {
        self.records.clear();
    }

    /// Re-classify every tracked element, then notify subscribers of flips.
    ///
    /// Idempotent: refreshing again without geometry changes yields the same
    /// records and no notifications.
    pub fn refresh(&mut self, surface: &dyn RenderSurface) -> RefreshReport {
        let started = Instant::now();
        let (width, height) = surface.viewport_size();

        let mut flipped: Vec<(ElementId, VisibilityStatus)> = Vec::new();
        for (id, record) in self.records.iter_mut() {
            let status = classify(surface.element_rect(id), surface.is_hidden(id), width, height);
            if status.visible != record.visible {
                flipped.push((id.clone(), status));
            }
            *record = status;
        }

        for (id, status) in &flipped {
            for (_, callback) in self.subscribers.iter_mut() {
                callback(id, *status);
            }
        }

        let elapsed = started.elapsed();
        let within_budget = elapsed <= self.budget;
        if !within_budget {
            warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                budget_ms = self.budget.as_millis() as u64,
                tracked = self.records.len(),
                "Visibility refresh exceeded latency budget"
            );
        }
        debug!(
            tracked = self.records.len(),
            changed = flipped.len(),
            "Visibility refreshed"
        );

        RefreshReport {
            changed: flipped.len(),
            elapsed,
            within_budget,
        }
    }

    /// Snapshot of all records.
    pub fn visibility_map(&self) -> VisibilityMap {
        self.records.clone()
    }

    /// Record of one element.
    pub fn status(&self, id: &ElementId) -> Option<VisibilityStatus> {
        self.records.get(id).copied()
    }

    /// Tracked elements currently classified invisible.
    pub fn invisible_elements(&self) -> Vec<ElementId> {
        self.records
            .iter()
            .filter(|(_, status)| !status.visible)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Number of tracked elements.
    pub fn tracked(&self) -> usize {
        self.records.len()
    }

    /// Register a callback for visibility flips.
    pub fn on_visibility_change(&mut self, callback: VisibilityCallback) -> SubscriptionId {
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        self.subscribers.push((id, callback));
        id
    }

    /// Remove a callback. Returns `false` for unknown handles.
    pub fn unsubscribe(&mut self, subscription: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(id, _)| *id != subscription);
        self.subscribers.len() != before
    }

    /// Remove every callback.
    pub fn clear_subscribers(&mut self) {
        self.subscribers.clear();
    }
}
