//! Trailing-edge debounce of viewport signals.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingResize {
    width: f64,
    height: f64,
    deadline: Instant,
    forced: bool,
}

/// What [`ResizeDebouncer::poll`] found.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DebounceState {
    /// No signal pending.
    Idle,
    /// A signal is pending but the window has not elapsed.
    Waiting,
    /// The window elapsed; run an analysis for these dimensions.
    Ready {
        /// Viewport width from the last signal.
        width: f64,
        /// Viewport height from the last signal.
        height: f64,
        /// Skip the minimum-delta check (orientation change).
        forced: bool,
    },
}

/// Collapses bursts of resize signals into one analysis.
///
/// Every signal restarts the window; only the last dimensions survive.
#[derive(Debug, Clone)]
pub struct ResizeDebouncer {
    window: Duration,
    pending: Option<PendingResize>,
}

impl ResizeDebouncer {
    /// Debouncer that waits `window` after the last signal.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    /// Record a resize signal.
    pub fn signal(&mut self, width: f64, height: f64, now: Instant) {
        let forced = self.pending.is_some_and(|pending| pending.forced);
        self.schedule(width, height, now, forced);
    }

    /// Record a signal that must produce an analysis regardless of delta.
    pub fn force(&mut self, width: f64, height: f64, now: Instant) {
        self.schedule(width, height, now, true);
    }

    fn schedule(&mut self, width: f64, height: f64, now: Instant, forced: bool) {
        self.pending = Some(PendingResize {
            width,
            height,
            deadline: now + self.window,
            forced,
        });
    }

    /// Take the pending signal once its window has elapsed.
    pub fn poll(&mut self, now: Instant) -> DebounceState {
        match self.pending {
            None => DebounceState::Idle,
            Some(pending) if now < pending.deadline => DebounceState::Waiting,
            Some(pending) => {
                self.pending = None;
                DebounceState::Ready {
                    width: pending.width,
                    height: pending.height,
                    forced: pending.forced,
                }
            }
        }
    }

    /// A signal is waiting for its window to elapse.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Forget the pending signal.
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}
