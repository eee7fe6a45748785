//! Host render surface boundary.
//!
//! The core reads element geometry and the viewport size through
//! [`RenderSurface`] and writes position, size, and z-order back. Nothing else
//! crosses the boundary: theme styling and accessibility metadata are not
//! reachable through this trait, and there is no storage API at all.
//!
//! [`MemorySurface`] is a complete in-memory host used by headless embedders
//! and the test suite.

mod memory;

pub use memory::{ElementNode, MemorySurface};

use crate::model::{ContainerId, ElementId, Rect, SurfaceError};
use serde::Serialize;

/// Geometric properties written to an element. Nothing else is writable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Geometry {
    /// Position and size.
    pub rect: Rect,
    /// Stacking order.
    pub z_index: i32,
}

/// Scroll direction(s) enabled on a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ScrollAxis {
    /// Content scrolls up/down.
    Vertical,
    /// Content scrolls left/right.
    Horizontal,
    /// Content scrolls on both axes.
    Both,
}

impl ScrollAxis {
    /// Axis needed for the given overflow flags, if any.
    pub fn from_overflow(horizontal: bool, vertical: bool) -> Option<Self> {
        match (horizontal, vertical) {
            (true, true) => Some(Self::Both),
            (true, false) => Some(Self::Horizontal),
            (false, true) => Some(Self::Vertical),
            (false, false) => None,
        }
    }

    /// Indicator edges decorating this axis.
    pub fn indicator_edges(&self) -> &'static [IndicatorEdge] {
        match self {
            Self::Vertical => &[IndicatorEdge::Top, IndicatorEdge::Bottom],
            Self::Horizontal => &[IndicatorEdge::Left, IndicatorEdge::Right],
            Self::Both => &[
                IndicatorEdge::Top,
                IndicatorEdge::Bottom,
                IndicatorEdge::Left,
                IndicatorEdge::Right,
            ],
        }
    }
}

/// Edge on which a scroll indicator is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum IndicatorEdge {
    /// More content above.
    Top,
    /// More content below.
    Bottom,
    /// More content to the left.
    Left,
    /// More content to the right.
    Right,
}

/// Interaction attached to a scroll container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum InteractionKind {
    /// Mouse wheel / trackpad.
    Wheel,
    /// Pointer drag.
    PointerDrag,
    /// Touch swipe.
    Touch,
}

impl InteractionKind {
    /// Every interaction a scroll container listens to.
    pub const ALL: [InteractionKind; 3] = [Self::Wheel, Self::PointerDrag, Self::Touch];
}

/// Handle of an indicator decoration owned by the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndicatorId(u64);

impl IndicatorId {
    /// Wrap a host-issued handle.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// Handle of an attached interaction handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

impl HandlerId {
    /// Wrap a host-issued handle.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// Scroll styling applied to a container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScrollRegion {
    /// Visible window of the container.
    pub viewport: Rect,
    /// Bounding box of the contained elements.
    pub content: Rect,
    /// Enabled scroll direction(s).
    pub axis: ScrollAxis,
}

/// The host application's render tree and signal source.
pub trait RenderSurface {
    /// Current viewport `(width, height)`. May be non-finite if the host is broken.
    fn viewport_size(&self) -> (f64, f64);

    /// Bounding rectangle of an element, `None` if the host no longer has it.
    fn element_rect(&self, id: &ElementId) -> Option<Rect>;

    /// Realized stacking order of an element.
    fn element_z_index(&self, id: &ElementId) -> Option<i32>;

    /// Element is explicitly hidden by the host.
    fn is_hidden(&self, id: &ElementId) -> bool;

    /// Write position, size, and z-order of one element.
    fn write_geometry(&mut self, id: &ElementId, geometry: Geometry) -> Result<(), SurfaceError>;

    /// Flush the writes of the current batch into one frame.
    fn request_frame(&mut self);

    /// Turn a set of elements into a scrollable region.
    fn set_scroll_region(
        &mut self,
        container: ContainerId,
        members: &[ElementId],
        region: ScrollRegion,
    ) -> Result<(), SurfaceError>;

    /// Remove scroll styling. Must tolerate unknown containers.
    fn clear_scroll_region(&mut self, container: ContainerId);

    /// Scroll a region's content.
    fn set_scroll_offset(&mut self, container: ContainerId, x: f64, y: f64);

    /// Draw an overflow indicator on a container edge.
    fn add_indicator(&mut self, container: ContainerId, edge: IndicatorEdge) -> IndicatorId;

    /// Remove an indicator. Must tolerate unknown handles.
    fn remove_indicator(&mut self, indicator: IndicatorId);

    /// Attach an interaction handler to a container.
    fn attach_handler(&mut self, container: ContainerId, kind: InteractionKind) -> HandlerId;

    /// Detach a handler. Must tolerate unknown handles.
    fn detach_handler(&mut self, handler: HandlerId);

    /// Start delivering resize/orientation notifications.
    fn subscribe_viewport_signals(&mut self) -> Result<(), SurfaceError>;

    /// Stop delivering resize/orientation notifications.
    fn unsubscribe_viewport_signals(&mut self);
}
