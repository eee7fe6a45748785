//! Tracked UI elements and the optimizer input.

use super::geometry::{Rect, ViewportDimensions};
use super::identifiers::{ElementId, GroupId};
use serde::{Deserialize, Serialize};

/// Registration data for an overlay element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSpec {
    /// Handle of the element on the host surface.
    pub id: ElementId,
    /// Members of one group must stay mutually adjacent.
    pub group: Option<GroupId>,
    /// Relative order within the group (ascending = earlier in the stack).
    pub order: Option<u32>,
}

impl ElementSpec {
    /// Ungrouped element.
    pub fn new(id: ElementId) -> Self {
        Self {
            id,
            group: None,
            order: None,
        }
    }

    /// Grouped element with an order index.
    pub fn grouped(id: ElementId, group: GroupId, order: u32) -> Self {
        Self {
            id,
            group: Some(group),
            order: Some(order),
        }
    }
}

/// An overlay element with its currently observed geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiElement {
    /// Registration data.
    pub spec: ElementSpec,
    /// Geometry as last measured on the surface.
    pub rect: Rect,
    /// Explicitly hidden by the host; hidden elements are not placed.
    pub hidden: bool,
}

impl UiElement {
    /// Visible element at `rect`.
    pub fn new(spec: ElementSpec, rect: Rect) -> Self {
        Self {
            spec,
            rect,
            hidden: false,
        }
    }

    /// Shorthand for the element handle.
    pub fn id(&self) -> &ElementId {
        &self.spec.id
    }
}

/// Input of one optimization pass: viewport plus element geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    /// Viewport the layout must fit.
    pub viewport: ViewportDimensions,
    /// All tracked overlay elements, in registration order.
    pub elements: Vec<UiElement>,
    /// Elements currently classified invisible.
    pub invisible: Vec<ElementId>,
}

impl AnalysisResult {
    /// Input with no invisible elements.
    pub fn new(viewport: ViewportDimensions, elements: Vec<UiElement>) -> Self {
        Self {
            viewport,
            elements,
            invisible: Vec::new(),
        }
    }

    /// Attach the invisible-element list.
    pub fn with_invisible(mut self, invisible: Vec<ElementId>) -> Self {
        self.invisible = invisible;
        self
    }
}
