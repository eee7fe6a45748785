//! Applies layout configurations to the render surface.
//!
//! Every request is validated in full before the first write, written in one
//! batch with a single frame request, and rolled back if the host rejects a
//! write halfway. Only [`Geometry`] crosses the boundary, so styling and
//! accessibility properties of the elements are never touched.
//!
//! A request that arrives while a transition is running is queued and runs
//! after it, in arrival order, from [`DomUpdater::tick`].

mod queue;

pub use queue::{ElementUpdate, UpdateQueue, UpdateRequest};

use crate::layout::LayoutConfiguration;
use crate::model::{ElementId, SurfaceError};
use crate::surface::{Geometry, RenderSurface};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Result of an apply call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Written to the surface.
    Applied {
        /// Elements written.
        written: usize,
    },
    /// Waiting behind the active transition.
    Queued {
        /// 1-based queue position.
        position: usize,
    },
}

/// An element whose realized geometry differs from the request.
#[derive(Debug, Clone, PartialEq)]
pub struct Drift {
    /// Element that drifted.
    pub id: ElementId,
    /// Geometry that was written, rounded to whole pixels.
    pub requested: Geometry,
    /// `None` if the element is gone from the surface.
    pub realized: Option<Geometry>,
}

/// Writes geometry to the surface and sequences transitions.
#[derive(Debug)]
pub struct DomUpdater {
    board: Option<ElementId>,
    board_z_index: i32,
    transition: Duration,
    tolerance: f64,
    queue: UpdateQueue,
    active_until: Option<Instant>,
    applied: u64,
}

impl DomUpdater {
    /// Updater writing the board to `board` (if any).
    ///
    /// `transition` is how long each applied update animates; zero disables
    /// queuing. `tolerance` is the per-component pixel slack used by
    /// [`Self::verify`].
    pub fn new(
        board: Option<ElementId>,
        board_z_index: i32,
        transition: Duration,
        tolerance: f64,
    ) -> Self {
        Self {
            board,
            board_z_index,
            transition,
            tolerance,
            queue: UpdateQueue::default(),
            active_until: None,
            applied: 0,
        }
    }

    /// Commit a configuration, or queue it behind the active transition.
    ///
    /// # Errors
    /// `SurfaceError` if an element is unknown, a target is not a finite
    /// positive rectangle, or the host rejects a write. Nothing is committed
    /// in any of these cases.
    pub fn apply_configuration(
        &mut self,
        surface: &mut dyn RenderSurface,
        config: Arc<LayoutConfiguration>,
        now: Instant,
    ) -> Result<UpdateOutcome, SurfaceError> {
        self.submit(surface, UpdateRequest::Configuration(config), now)
    }

    /// Commit individual writes, or queue them behind the active transition.
    ///
    /// # Errors
    /// As for [`Self::apply_configuration`].
    pub fn apply_batch(
        &mut self,
        surface: &mut dyn RenderSurface,
        updates: Vec<ElementUpdate>,
        now: Instant,
    ) -> Result<UpdateOutcome, SurfaceError> {
        self.submit(surface, UpdateRequest::Batch(updates), now)
    }

    fn submit(
        &mut self,
        surface: &mut dyn RenderSurface,
        request: UpdateRequest,
        now: Instant,
    ) -> Result<UpdateOutcome, SurfaceError> {
        self.tick(surface, now)?;
        if self.is_transitioning(now) || !self.queue.is_empty() {
            let position = self.queue.push(request);
            debug!(position, "Transition active, update queued");
            return Ok(UpdateOutcome::Queued { position });
        }
        let written = self.commit(surface, &request, now)?;
        Ok(UpdateOutcome::Applied { written })
    }

    /// Finish elapsed transitions and run queued requests in arrival order.
    ///
    /// Returns how many queued requests were applied. A queued request that
    /// fails is dropped and its error returned; later requests stay queued.
    pub fn tick(
        &mut self,
        surface: &mut dyn RenderSurface,
        now: Instant,
    ) -> Result<usize, SurfaceError> {
        let mut drained = 0;
        while !self.is_transitioning(now) {
            self.active_until = None;
            let Some(request) = self.queue.pop() else {
                break;
            };
            if let Err(err) = self.commit(surface, &request, now) {
                warn!(error = %err, pending = self.queue.len(), "Dropping queued update");
                return Err(err);
            }
            drained += 1;
        }
        Ok(drained)
    }

    /// Commit a configuration now, ignoring any running transition.
    ///
    /// Puts a known-good layout back after a later stage of a pass failed.
    /// Queued requests are left alone.
    ///
    /// # Errors
    /// As for [`Self::apply_configuration`].
    pub fn restore(
        &mut self,
        surface: &mut dyn RenderSurface,
        config: Arc<LayoutConfiguration>,
        now: Instant,
    ) -> Result<usize, SurfaceError> {
        self.commit(surface, &UpdateRequest::Configuration(config), now)
    }

    /// A transition started by an earlier update is still running.
    pub fn is_transitioning(&self, now: Instant) -> bool {
        self.active_until.is_some_and(|until| now < until)
    }

    /// Requests waiting in the queue.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Updates committed so far.
    pub fn applied(&self) -> u64 {
        self.applied
    }

    /// Drop queued requests and forget the active transition.
    pub fn reset(&mut self) {
        self.queue.clear();
        self.active_until = None;
    }

    /// Elements of `config` whose realized geometry is off by more than the
    /// tolerance on any component, or whose z-index differs at all.
    pub fn verify(&self, surface: &dyn RenderSurface, config: &LayoutConfiguration) -> Vec<Drift> {
        self.writes_for(config)
            .into_iter()
            .filter_map(|update| {
                let requested = Geometry {
                    rect: update.geometry.rect.rounded(),
                    z_index: update.geometry.z_index,
                };
                let realized = surface
                    .element_rect(&update.id)
                    .zip(surface.element_z_index(&update.id))
                    .map(|(rect, z_index)| Geometry { rect, z_index });
                let within = realized.is_some_and(|realized| {
                    realized.z_index == requested.z_index
                        && realized.rect.max_deviation(&requested.rect) <= self.tolerance
                });
                (!within).then_some(Drift {
                    id: update.id,
                    requested,
                    realized,
                })
            })
            .collect()
    }

    fn writes_for(&self, config: &LayoutConfiguration) -> Vec<ElementUpdate> {
        let board = self.board.iter().map(|board| {
            ElementUpdate::new(
                board.clone(),
                Geometry {
                    rect: config.board(),
                    z_index: self.board_z_index,
                },
            )
        });
        let elements = config.placements().iter().map(|placement| {
            ElementUpdate::new(
                placement.id.clone(),
                Geometry {
                    rect: placement.rect,
                    z_index: placement.z_index,
                },
            )
        });
        board.chain(elements).collect()
    }

    fn commit(
        &mut self,
        surface: &mut dyn RenderSurface,
        request: &UpdateRequest,
        now: Instant,
    ) -> Result<usize, SurfaceError> {
        let updates = match request {
            UpdateRequest::Configuration(config) => self.writes_for(config),
            UpdateRequest::Batch(updates) => updates.clone(),
        };

        // Validate and capture the rollback image before writing anything.
        let mut planned = Vec::with_capacity(updates.len());
        for update in &updates {
            let rect = update.geometry.rect.rounded();
            if !rect.is_finite() || rect.width <= 0.0 || rect.height <= 0.0 {
                return Err(SurfaceError::Rejected {
                    element: update.id.clone(),
                    reason: format!(
                        "target {}x{} at ({}, {}) is not a positive finite rectangle",
                        rect.width, rect.height, rect.x, rect.y
                    ),
                });
            }
            let previous = surface
                .element_rect(&update.id)
                .zip(surface.element_z_index(&update.id))
                .map(|(rect, z_index)| Geometry { rect, z_index })
                .ok_or_else(|| SurfaceError::UnknownElement(update.id.clone()))?;
            planned.push((
                &update.id,
                Geometry {
                    rect,
                    z_index: update.geometry.z_index,
                },
                previous,
            ));
        }

        for (index, (id, geometry, _)) in planned.iter().enumerate() {
            if let Err(err) = surface.write_geometry(id, *geometry) {
                warn!(element = %id, error = %err, "Write rejected, rolling back batch");
                for (id, _, previous) in planned[..index].iter().rev() {
                    if let Err(rollback) = surface.write_geometry(id, *previous) {
                        warn!(element = %id, error = %rollback, "Rollback write failed");
                    }
                }
                return Err(err);
            }
        }
        surface.request_frame();

        self.applied += 1;
        if !self.transition.is_zero() {
            self.active_until = Some(now + self.transition);
        }
        debug!(
            written = planned.len(),
            transition_ms = self.transition.as_millis() as u64,
            "Applied geometry batch"
        );
        Ok(planned.len())
    }
}

#[cfg(test)]
#[path = "update_tests.rs"]
mod tests;
