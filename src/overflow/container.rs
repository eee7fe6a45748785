//! Scroll container record.

use crate::layout::{LayoutRegion, ScrollBounds};
use crate::model::{ContainerId, ElementId, Rect};
use crate::surface::{HandlerId, IndicatorId, ScrollAxis};

/// A group of elements made scrollable.
///
/// The container references its elements but never owns them: removing the
/// container leaves every element in place.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollContainer {
    pub(crate) id: ContainerId,
    pub(crate) region: Option<LayoutRegion>,
    pub(crate) elements: Vec<ElementId>,
    pub(crate) bounds: ScrollBounds,
    pub(crate) content: Rect,
    pub(crate) axis: ScrollAxis,
    pub(crate) indicators: Vec<IndicatorId>,
    pub(crate) handlers: Vec<HandlerId>,
    pub(crate) offset: (f64, f64),
}

impl ScrollContainer {
    /// Handle shared with the render surface.
    pub fn id(&self) -> ContainerId {
        self.id
    }

    /// Layout region this container was created for, if any.
    pub fn region(&self) -> Option<LayoutRegion> {
        self.region
    }

    /// Contained elements in stacking order.
    pub fn elements(&self) -> &[ElementId] {
        &self.elements
    }

    /// Available space.
    pub fn bounds(&self) -> ScrollBounds {
        self.bounds
    }

    /// Bounding box of the contained elements.
    pub fn content(&self) -> Rect {
        self.content
    }

    /// Axes that currently scroll.
    pub fn axis(&self) -> ScrollAxis {
        self.axis
    }

    /// Overflow indicators drawn on the surface.
    pub fn indicators(&self) -> &[IndicatorId] {
        &self.indicators
    }

    /// Interaction handlers attached on the surface.
    pub fn handlers(&self) -> &[HandlerId] {
        &self.handlers
    }

    /// Current scroll offset `(x, y)`.
    pub fn offset(&self) -> (f64, f64) {
        self.offset
    }

    /// Content exceeds the available space on some axis.
    pub fn overflows(&self) -> bool {
        let (horizontal, vertical) = self.bounds.overflow(&self.content);
        horizontal || vertical
    }

    /// Largest valid offset on each axis.
    pub fn max_offset(&self) -> (f64, f64) {
        (
            (self.content.width - self.bounds.max_width).max(0.0),
            (self.content.height - self.bounds.max_height).max(0.0),
        )
    }
}
