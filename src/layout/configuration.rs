//! Immutable output of one optimization pass.

use crate::model::{ElementId, GroupId, Rect, ViewportDimensions};
use serde::Serialize;

/// Arrangement of overlay elements relative to the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutStrategy {
    /// Elements stacked in a column right of the board.
    Horizontal,
    /// Elements stacked in a column below the board.
    Vertical,
    /// Some element groups beside the board, the rest below it.
    Hybrid,
}

impl LayoutStrategy {
    /// Lowercase name used in logs and the consumer payload.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Horizontal => "horizontal",
            Self::Vertical => "vertical",
            Self::Hybrid => "hybrid",
        }
    }
}

/// Placement area for overlay elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum LayoutRegion {
    /// Column to the right of the board.
    SideColumn,
    /// Column under the board.
    BelowBoard,
}

/// Computed geometry of one overlay element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementPlacement {
    /// Element handle.
    pub id: ElementId,
    /// Target position and size.
    pub rect: Rect,
    /// Target stacking order.
    pub z_index: i32,
    /// Region the element was assigned to.
    pub region: LayoutRegion,
    /// Group membership, carried for validation.
    pub group: Option<GroupId>,
    /// Order index within the group.
    pub order: Option<u32>,
}

/// Space available to a region before it must scroll.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScrollBounds {
    /// Left edge of the visible window.
    pub x: f64,
    /// Top edge of the visible window.
    pub y: f64,
    /// Visible width.
    pub max_width: f64,
    /// Visible height.
    pub max_height: f64,
}

impl ScrollBounds {
    /// Visible window as a rectangle.
    pub fn window(&self) -> Rect {
        Rect::new(self.x, self.y, self.max_width, self.max_height)
    }

    /// Whether `content` exceeds the window on `(horizontal, vertical)`.
    pub fn overflow(&self, content: &Rect) -> (bool, bool) {
        (
            content.width > self.max_width,
            content.height > self.max_height,
        )
    }
}

/// A region whose content does not fit its available space.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScrollRequirement {
    /// Overflowing region.
    pub region: LayoutRegion,
    /// Elements of the region, in stacking order.
    pub elements: Vec<ElementId>,
    /// Available space.
    pub bounds: ScrollBounds,
    /// Bounding box of the region's content.
    pub content: Rect,
}

/// Result of one optimization pass.
///
/// Never mutated after creation: a new configuration supersedes the old one.
/// Consumers share it behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutConfiguration {
    pub(crate) viewport: ViewportDimensions,
    pub(crate) board: Rect,
    pub(crate) strategy: LayoutStrategy,
    pub(crate) placements: Vec<ElementPlacement>,
    pub(crate) requires_scrolling: bool,
    pub(crate) scroll_requirements: Vec<ScrollRequirement>,
}

impl LayoutConfiguration {
    /// Viewport the layout was computed for.
    pub fn viewport(&self) -> ViewportDimensions {
        self.viewport
    }

    /// Board rectangle (always square).
    pub fn board(&self) -> Rect {
        self.board
    }

    /// Board edge length.
    pub fn board_size(&self) -> f64 {
        self.board.width
    }

    /// Board origin.
    pub fn board_position(&self) -> (f64, f64) {
        (self.board.x, self.board.y)
    }

    /// Chosen arrangement.
    pub fn strategy(&self) -> LayoutStrategy {
        self.strategy
    }

    /// Placements in stacking order.
    pub fn placements(&self) -> &[ElementPlacement] {
        &self.placements
    }

    /// Placement of one element.
    pub fn placement(&self, id: &ElementId) -> Option<&ElementPlacement> {
        self.placements.iter().find(|placement| &placement.id == id)
    }

    /// Some content (board or elements) extends past the viewport or its region.
    pub fn requires_scrolling(&self) -> bool {
        self.requires_scrolling
    }

    /// Regions that need a scroll container.
    pub fn scroll_requirements(&self) -> &[ScrollRequirement] {
        &self.scroll_requirements
    }

    /// Payload handed to consumers of analysis results.
    pub fn summary(&self) -> AnalysisSummary {
        AnalysisSummary {
            viewport_width: self.viewport.width(),
            viewport_height: self.viewport.height(),
            layout_strategy: self.strategy,
            board_dimensions: BoardDimensions {
                width: self.board.width,
                height: self.board.height,
            },
            requires_scrolling: self.requires_scrolling,
        }
    }
}

/// Board size in the consumer payload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoardDimensions {
    /// Board width.
    pub width: f64,
    /// Board height.
    pub height: f64,
}

/// What consumers of `analyze_viewport()` receive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    /// Viewport width.
    pub viewport_width: f64,
    /// Viewport height.
    pub viewport_height: f64,
    /// Chosen strategy.
    pub layout_strategy: LayoutStrategy,
    /// Board size.
    pub board_dimensions: BoardDimensions,
    /// Whether anything needs scrolling.
    pub requires_scrolling: bool,
}

impl AnalysisSummary {
    /// Serialize for hosts that forward results as JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
