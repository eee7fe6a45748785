//! Overflow-to-scroll conversion.
//!
//! [`OverflowHandler`] turns groups of elements that exceed their available
//! space into scroll containers on the render surface and tears them down the
//! moment the content fits again. Teardown is idempotent and never touches the
//! contained elements themselves.

mod container;

pub use container::ScrollContainer;

use crate::layout::{LayoutConfiguration, LayoutRegion, ScrollBounds};
use crate::model::{ContainerId, ElementId, Rect, SurfaceError};
use crate::surface::{InteractionKind, RenderSurface, ScrollAxis, ScrollRegion};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// What [`OverflowHandler::reconcile`] changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Containers created for regions that started overflowing.
    pub created: Vec<ContainerId>,
    /// Region containers whose bounds and members were refreshed.
    pub updated: Vec<ContainerId>,
    /// Containers torn down because their content fits again.
    pub removed: Vec<ContainerId>,
}

/// Tracks live scroll containers.
#[derive(Debug, Default)]
pub struct OverflowHandler {
    containers: BTreeMap<ContainerId, ScrollContainer>,
    next_id: u64,
}

/// Bounding box of the given rectangles, `None` when empty.
fn bounding_box(rects: impl IntoIterator<Item = Rect>) -> Option<Rect> {
    rects.into_iter().reduce(|acc, rect| acc.union(&rect))
}

fn measure_content(surface: &dyn RenderSurface, elements: &[ElementId]) -> Option<Rect> {
    bounding_box(elements.iter().filter_map(|id| surface.element_rect(id)))
}

impl OverflowHandler {
    /// Handler with no containers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap `elements` in a scroll container limited to `bounds`.
    ///
    /// Content is measured from the surface. Indicators are drawn on the
    /// overflowing edges and every [`InteractionKind`] gets a handler.
    ///
    /// # Errors
    /// Propagates the surface error if the scroll region cannot be set (for
    /// example an unknown element); nothing is tracked in that case.
    pub fn create_scroll_container(
        &mut self,
        surface: &mut dyn RenderSurface,
        elements: &[ElementId],
        bounds: ScrollBounds,
    ) -> Result<ContainerId, SurfaceError> {
        let content = measure_content(surface, elements)
            .unwrap_or_else(|| Rect::new(bounds.x, bounds.y, 0.0, 0.0));
        self.create_with_content(surface, None, elements.to_vec(), bounds, content)
    }

    fn create_with_content(
        &mut self,
        surface: &mut dyn RenderSurface,
        region: Option<LayoutRegion>,
        elements: Vec<ElementId>,
        bounds: ScrollBounds,
        content: Rect,
    ) -> Result<ContainerId, SurfaceError> {
        self.next_id += 1;
        let id = ContainerId::new(self.next_id);
        let axis = axis_for(&bounds, &content);

        surface.set_scroll_region(
            id,
            &elements,
            ScrollRegion {
                viewport: bounds.window(),
                content,
                axis,
            },
        )?;

        let indicators = axis
            .indicator_edges()
            .iter()
            .map(|edge| surface.add_indicator(id, *edge))
            .collect();
        let handlers = InteractionKind::ALL
            .iter()
            .map(|kind| surface.attach_handler(id, *kind))
            .collect();

        info!(
            container = %id,
            elements = elements.len(),
            max_width = bounds.max_width,
            max_height = bounds.max_height,
            content_height = content.height,
            "Created scroll container"
        );

        self.containers.insert(
            id,
            ScrollContainer {
                id,
                region,
                elements,
                bounds,
                content,
                axis,
                indicators,
                handlers,
                offset: (0.0, 0.0),
            },
        );
        Ok(id)
    }

    /// Remove all decoration and handlers of a container and stop tracking it.
    ///
    /// Idempotent: unknown or already removed containers are a no-op that
    /// returns `false`. Contained elements are left untouched.
    pub fn remove_scrolling(&mut self, surface: &mut dyn RenderSurface, id: ContainerId) -> bool {
        let Some(container) = self.containers.remove(&id) else {
            return false;
        };
        for indicator in container.indicators {
            surface.remove_indicator(indicator);
        }
        for handler in container.handlers {
            surface.detach_handler(handler);
        }
        surface.clear_scroll_region(id);
        info!(container = %id, elements = container.elements.len(), "Removed scroll container");
        true
    }

    /// Remove every container.
    pub fn remove_all(&mut self, surface: &mut dyn RenderSurface) -> usize {
        let ids: Vec<ContainerId> = self.containers.keys().copied().collect();
        ids.into_iter()
            .filter(|id| self.remove_scrolling(surface, *id))
            .count()
    }

    /// Re-measure a container's content and report whether it still overflows.
    ///
    /// Unknown containers never need scrolling.
    pub fn needs_scrolling(&mut self, surface: &dyn RenderSurface, id: ContainerId) -> bool {
        let Some(container) = self.containers.get_mut(&id) else {
            return false;
        };
        if let Some(content) = measure_content(surface, &container.elements) {
            container.content = content;
        }
        container.overflows()
    }

    /// Replace the available space of a container.
    ///
    /// Returns `false` for unknown containers.
    pub fn update_bounds(&mut self, id: ContainerId, bounds: ScrollBounds) -> bool {
        match self.containers.get_mut(&id) {
            Some(container) => {
                container.bounds = bounds;
                container.offset = clamp_offset(container, container.offset);
                true
            }
            None => false,
        }
    }

    /// Scroll a container by `(dx, dy)`, clamped to its content.
    ///
    /// Only enabled axes move. Returns the new offset, or `None` for unknown
    /// containers.
    pub fn scroll_by(
        &mut self,
        surface: &mut dyn RenderSurface,
        id: ContainerId,
        dx: f64,
        dy: f64,
    ) -> Option<(f64, f64)> {
        let container = self.containers.get_mut(&id)?;
        let (dx, dy) = match container.axis {
            ScrollAxis::Vertical => (0.0, dy),
            ScrollAxis::Horizontal => (dx, 0.0),
            ScrollAxis::Both => (dx, dy),
        };
        let requested = (container.offset.0 + dx, container.offset.1 + dy);
        container.offset = clamp_offset(container, requested);
        surface.set_scroll_offset(id, container.offset.0, container.offset.1);
        Some(container.offset)
    }

    /// Bring the tracked containers in line with a configuration.
    ///
    /// One container per overflowing region is kept (created or updated);
    /// region containers whose region now fits are removed. Containers created
    /// directly through [`Self::create_scroll_container`] are re-measured and
    /// removed once they stop overflowing.
    ///
    /// # Errors
    /// The first surface error aborts the pass. Containers removed before the
    /// error stay removed.
    pub fn reconcile(
        &mut self,
        surface: &mut dyn RenderSurface,
        config: &LayoutConfiguration,
    ) -> Result<ReconcileReport, SurfaceError> {
        let mut report = ReconcileReport::default();
        let requirements: BTreeMap<LayoutRegion, _> = config
            .scroll_requirements()
            .iter()
            .map(|requirement| (requirement.region, requirement))
            .collect();

        let tracked: Vec<(ContainerId, Option<LayoutRegion>)> = self
            .containers
            .values()
            .map(|container| (container.id, container.region))
            .collect();

        let mut covered: Vec<LayoutRegion> = Vec::new();
        for (id, region) in tracked {
            match region {
                Some(region) => match requirements.get(&region) {
                    Some(requirement) if !covered.contains(&region) => {
                        self.refresh_region(
                            surface,
                            id,
                            requirement.elements.clone(),
                            requirement.bounds,
                            requirement.content,
                        )?;
                        covered.push(region);
                        report.updated.push(id);
                    }
                    _ => {
                        if self.remove_scrolling(surface, id) {
                            report.removed.push(id);
                        }
                    }
                },
                None => {
                    if !self.needs_scrolling(surface, id) && self.remove_scrolling(surface, id) {
                        report.removed.push(id);
                    }
                }
            }
        }

        for (region, requirement) in requirements {
            if covered.contains(&region) {
                continue;
            }
            let id = self.create_with_content(
                surface,
                Some(region),
                requirement.elements.clone(),
                requirement.bounds,
                requirement.content,
            )?;
            report.created.push(id);
        }

        debug!(
            created = report.created.len(),
            updated = report.updated.len(),
            removed = report.removed.len(),
            active = self.containers.len(),
            "Reconciled scroll containers"
        );
        Ok(report)
    }

    fn refresh_region(
        &mut self,
        surface: &mut dyn RenderSurface,
        id: ContainerId,
        elements: Vec<ElementId>,
        bounds: ScrollBounds,
        content: Rect,
    ) -> Result<(), SurfaceError> {
        let Some(container) = self.containers.get_mut(&id) else {
            return Ok(());
        };
        let axis = axis_for(&bounds, &content);
        surface.set_scroll_region(
            id,
            &elements,
            ScrollRegion {
                viewport: bounds.window(),
                content,
                axis,
            },
        )?;

        if axis != container.axis {
            for indicator in container.indicators.drain(..) {
                surface.remove_indicator(indicator);
            }
            container.indicators = axis
                .indicator_edges()
                .iter()
                .map(|edge| surface.add_indicator(id, *edge))
                .collect();
            container.axis = axis;
        }
        container.elements = elements;
        container.bounds = bounds;
        container.content = content;
        let offset = clamp_offset(container, container.offset);
        if offset != container.offset {
            container.offset = offset;
            surface.set_scroll_offset(id, offset.0, offset.1);
        }
        Ok(())
    }

    /// Live container by id.
    pub fn container(&self, id: ContainerId) -> Option<&ScrollContainer> {
        self.containers.get(&id)
    }

    /// Live containers in creation order.
    pub fn containers(&self) -> impl Iterator<Item = &ScrollContainer> {
        self.containers.values()
    }

    /// Number of live containers.
    pub fn active_count(&self) -> usize {
        self.containers.len()
    }
}

/// Enabled axis for the given space; content that fits scrolls vertically.
fn axis_for(bounds: &ScrollBounds, content: &Rect) -> ScrollAxis {
    let (horizontal, vertical) = bounds.overflow(content);
    ScrollAxis::from_overflow(horizontal, vertical).unwrap_or(ScrollAxis::Vertical)
}

fn clamp_offset(container: &ScrollContainer, (x, y): (f64, f64)) -> (f64, f64) {
    let (max_x, max_y) = container.max_offset();
    (x.clamp(0.0, max_x), y.clamp(0.0, max_y))
}

#[cfg(test)]
#[path = "overflow_tests.rs"]
mod tests;
