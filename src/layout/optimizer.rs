//! Board-first greedy layout optimizer.
//!
//! Allocation happens in a fixed order so the result is deterministic:
//!
//! 1. Board size: the larger of the "elements beside" and "elements below"
//!    candidates, clamped to the minimum board size. When elements overflow
//!    the right edge they go below the board, so only the "below" candidate
//!    applies.
//! 2. Board position inside the viewport.
//! 3. Strategy from aspect ratio, residual space, and horizontal overflow.
//! 4. Element positions: group clusters stacked in columns with fixed spacing.
//!
//! Conflicts are resolved by moving or scrolling elements. The one exception:
//! if the first element below the board would not be fully visible, the board
//! shrinks (never under the minimum) so that column starts inside the viewport.

use super::configuration::{
    ElementPlacement, LayoutConfiguration, LayoutRegion, LayoutStrategy, ScrollBounds,
    ScrollRequirement,
};
use super::validate::validate_layout;
use crate::model::{AnalysisResult, ElementId, GroupId, Rect, UiElement, ValidationError};
use std::collections::HashSet;
use tracing::debug;

/// Thresholds used by the optimizer and by [`validate_layout`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimizerSettings {
    /// Minimum board edge.
    pub min_board_size: f64,
    /// Gap between elements and between elements and the board.
    pub element_spacing: f64,
    /// Allowed shortfall on the spacing rule.
    pub spacing_tolerance: f64,
    /// Maximum gap between consecutive group members.
    pub grouping_tolerance: f64,
    /// Ceiling on group spread relative to its packed extent.
    pub max_group_spread_ratio: f64,
    /// Z-index of the board.
    pub board_z_index: i32,
    /// Z-index of the first placed element.
    pub element_z_base: i32,
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self {
            min_board_size: 280.0,
            element_spacing: 16.0,
            spacing_tolerance: 1.0,
            grouping_tolerance: 20.0,
            max_group_spread_ratio: 2.5,
            board_z_index: 1,
            element_z_base: 10,
        }
    }
}

/// Elements that must be placed as one contiguous run.
#[derive(Debug)]
struct Cluster<'a> {
    members: Vec<&'a UiElement>,
    /// Some member overflowed the right viewport edge.
    offending: bool,
}

impl Cluster<'_> {
    fn height(&self, spacing: f64) -> f64 {
        stack_height(self.members.iter().copied(), spacing)
    }
}

/// Pure function from viewport + elements to a [`LayoutConfiguration`].
#[derive(Debug, Clone, Default)]
pub struct LayoutOptimizer {
    settings: OptimizerSettings,
}

impl LayoutOptimizer {
    /// Optimizer with the given thresholds.
    pub fn new(settings: OptimizerSettings) -> Self {
        Self { settings }
    }

    /// Thresholds in use.
    pub fn settings(&self) -> &OptimizerSettings {
        &self.settings
    }

    /// Compute the layout for one analysis pass.
    ///
    /// Deterministic for identical input. The returned configuration always
    /// passes [`validate_layout`].
    ///
    /// # Errors
    /// `ValidationError` if an element has non-finite geometry, or if the
    /// computed layout fails validation (never returned partially).
    pub fn calculate_optimal_layout(
        &self,
        input: &AnalysisResult,
    ) -> Result<LayoutConfiguration, ValidationError> {
        for element in &input.elements {
            if !element.rect.is_finite() {
                return Err(ValidationError::NonFiniteGeometry {
                    element: element.id().to_string(),
                });
            }
        }

        let viewport = input.viewport;
        let (vw, vh) = (viewport.width(), viewport.height());
        let spacing = self.settings.element_spacing;

        let placeable: Vec<&UiElement> = input.elements.iter().filter(|e| !e.hidden).collect();
        let invisible: HashSet<&ElementId> = input.invisible.iter().collect();
        let clusters = build_clusters(&placeable, &invisible, vw);
        let any_offending = clusters.iter().any(|c| c.offending);

        // 1. Board size. Offending clusters always land below the board, so
        // the board leaves room for the full stack there.
        let widest = placeable
            .iter()
            .map(|e| element_size(e).0)
            .fold(0.0, f64::max);
        let stack = stack_height(placeable.iter().copied(), spacing);
        let optimal = if placeable.is_empty() {
            vw.min(vh) - 2.0 * spacing
        } else {
            let beside = (vw - widest - 3.0 * spacing).min(vh - 2.0 * spacing);
            let below = (vw - 2.0 * spacing).min(vh - stack - 3.0 * spacing);
            if any_offending {
                below
            } else {
                beside.max(below)
            }
        };
        let mut board_size = optimal.max(self.settings.min_board_size);

        // 3. Strategy (needs the board size, decides the board position).
        let side_space = vw - board_size - 3.0 * spacing;
        let side_fits = !placeable.is_empty() && side_space >= widest;
        let strategy = if placeable.is_empty() {
            if viewport.aspect_ratio() >= 1.0 {
                LayoutStrategy::Horizontal
            } else {
                LayoutStrategy::Vertical
            }
        } else if any_offending {
            if side_fits && clusters.iter().any(|c| !c.offending) {
                LayoutStrategy::Hybrid
            } else {
                LayoutStrategy::Vertical
            }
        } else if side_fits && stack <= vh - 2.0 * spacing {
            LayoutStrategy::Horizontal
        } else if viewport.aspect_ratio() < 1.0 || !side_fits {
            LayoutStrategy::Vertical
        } else {
            LayoutStrategy::Hybrid
        };

        // 2 and 4. Board and element positions. If the first element below
        // the board would not be fully visible, shrink the board (never under
        // the minimum) until the tallest element fits there and place again.
        let (mut board, mut side, mut below) = self.place(board_size, strategy, &clusters, vw, vh);
        if below
            .first_bottom()
            .is_some_and(|bottom| bottom > vh - spacing)
        {
            let tallest = placeable
                .iter()
                .map(|e| element_size(e).1)
                .fold(0.0, f64::max);
            let resized = (vh - tallest - 3.0 * spacing).max(self.settings.min_board_size);
            if resized < board_size {
                debug!(from = board_size, to = resized, "Shrinking board for below column");
                board_size = resized;
                (board, side, below) = self.place(board_size, strategy, &clusters, vw, vh);
            }
        }

        let strategy = match (strategy, side.is_empty(), below.is_empty()) {
            (LayoutStrategy::Hybrid, true, _) => LayoutStrategy::Vertical,
            (LayoutStrategy::Hybrid, false, true) => LayoutStrategy::Horizontal,
            (strategy, _, _) => strategy,
        };

        let mut placements = Vec::with_capacity(placeable.len());
        let mut scroll_requirements = Vec::new();
        for column in [side, below] {
            if let Some(requirement) = column.scroll_requirement(vw, vh, spacing) {
                scroll_requirements.push(requirement);
            }
            placements.extend(column.placements);
        }
        for (index, placement) in placements.iter_mut().enumerate() {
            placement.z_index = self.settings.element_z_base + index as i32;
        }

        let board_overflows = board.right() > vw || board.bottom() > vh;
        let requires_scrolling = board_overflows || !scroll_requirements.is_empty();

        let config = LayoutConfiguration {
            viewport,
            board,
            strategy,
            placements,
            requires_scrolling,
            scroll_requirements,
        };
        validate_layout(&config, &self.settings)?;

        debug!(
            viewport_width = vw,
            viewport_height = vh,
            board_size,
            strategy = strategy.as_str(),
            placed = config.placements.len(),
            invisible = input.invisible.len(),
            requires_scrolling,
            "Computed layout"
        );
        Ok(config)
    }

    /// Position the board and stack every cluster into the side or below column.
    fn place(
        &self,
        board_size: f64,
        strategy: LayoutStrategy,
        clusters: &[Cluster<'_>],
        vw: f64,
        vh: f64,
    ) -> (Rect, Column, Column) {
        let spacing = self.settings.element_spacing;
        let preferred_x = match strategy {
            LayoutStrategy::Vertical => (vw - board_size) / 2.0,
            LayoutStrategy::Horizontal | LayoutStrategy::Hybrid => spacing,
        };
        let board_x = preferred_x.min(vw - board_size).max(0.0);
        let board_y = spacing.min(vh - board_size).max(0.0);
        let board = Rect::new(board_x, board_y, board_size, board_size);

        let mut side = Column::new(LayoutRegion::SideColumn, board.right() + spacing, board.y);
        let mut below = Column::new(LayoutRegion::BelowBoard, board.x, board.bottom() + spacing);
        for cluster in clusters {
            let to_side = match strategy {
                LayoutStrategy::Horizontal => true,
                LayoutStrategy::Vertical => false,
                LayoutStrategy::Hybrid => {
                    !cluster.offending
                        && side.next_y() + cluster.height(spacing) <= board.bottom()
                }
            };
            let column = if to_side { &mut side } else { &mut below };
            for member in &cluster.members {
                column.push(member, vw, spacing);
            }
        }
        (board, side, below)
    }
}

/// Placed size of an element; degenerate sizes occupy one pixel.
fn element_size(element: &UiElement) -> (f64, f64) {
    (element.rect.width.max(1.0), element.rect.height.max(1.0))
}

fn stack_height<'a>(elements: impl Iterator<Item = &'a UiElement>, spacing: f64) -> f64 {
    let (count, total) = elements.fold((0usize, 0.0), |(count, total), element| {
        (count + 1, total + element_size(element).1)
    });
    if count == 0 {
        0.0
    } else {
        total + spacing * (count - 1) as f64
    }
}

/// Group elements into clusters.
///
/// Groups appear in order of their first member; members are sorted by order
/// index (stable, unordered members last). Ungrouped elements are singleton
/// clusters in input order.
fn build_clusters<'a>(
    elements: &[&'a UiElement],
    invisible: &HashSet<&ElementId>,
    viewport_width: f64,
) -> Vec<Cluster<'a>> {
    let offends = |element: &UiElement| {
        element.rect.right() > viewport_width
            || (invisible.contains(element.id()) && element.rect.x >= viewport_width)
    };

    let mut clusters: Vec<Cluster<'a>> = Vec::new();
    let mut group_slots: Vec<(&GroupId, usize)> = Vec::new();

    for &element in elements {
        let slot = match &element.spec.group {
            Some(group) => match group_slots.iter().find(|(g, _)| *g == group) {
                Some(&(_, slot)) => Some(slot),
                None => {
                    group_slots.push((group, clusters.len()));
                    clusters.push(Cluster {
                        members: Vec::new(),
                        offending: false,
                    });
                    Some(clusters.len() - 1)
                }
            },
            None => None,
        };
        let index = match slot {
            Some(index) => index,
            None => {
                clusters.push(Cluster {
                    members: Vec::new(),
                    offending: false,
                });
                clusters.len() - 1
            }
        };
        clusters[index].offending |= offends(element);
        clusters[index].members.push(element);
    }

    for cluster in &mut clusters {
        cluster
            .members
            .sort_by_key(|element| element.spec.order.unwrap_or(u32::MAX));
    }
    clusters
}

/// A column of stacked placements.
struct Column {
    region: LayoutRegion,
    x: f64,
    top: f64,
    cursor: f64,
    placements: Vec<ElementPlacement>,
}

impl Column {
    fn new(region: LayoutRegion, x: f64, top: f64) -> Self {
        Self {
            region,
            x,
            top,
            cursor: top,
            placements: Vec::new(),
        }
    }

    fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    /// Top edge of the next element.
    fn next_y(&self) -> f64 {
        self.cursor
    }

    fn first_bottom(&self) -> Option<f64> {
        self.placements.first().map(|p| p.rect.bottom())
    }

    fn push(&mut self, element: &UiElement, viewport_width: f64, spacing: f64) {
        let (width, height) = element_size(element);
        // Below the board, slide wide elements left rather than past the right edge.
        let x = match self.region {
            LayoutRegion::SideColumn => self.x,
            LayoutRegion::BelowBoard => self.x.min(viewport_width - spacing - width).max(0.0),
        };
        self.placements.push(ElementPlacement {
            id: element.id().clone(),
            rect: Rect::new(x, self.cursor, width, height),
            z_index: 0,
            region: self.region,
            group: element.spec.group.clone(),
            order: element.spec.order,
        });
        self.cursor += height + spacing;
    }

    fn content(&self) -> Option<Rect> {
        let first = self.placements.first()?.rect;
        Some(
            self.placements
                .iter()
                .skip(1)
                .fold(first, |acc, placement| acc.union(&placement.rect)),
        )
    }

    fn scroll_requirement(&self, vw: f64, vh: f64, spacing: f64) -> Option<ScrollRequirement> {
        let content = self.content()?;
        let x = content.x.min(self.x);
        let bounds = ScrollBounds {
            x,
            y: self.top,
            max_width: (vw - x - spacing).max(0.0),
            max_height: (vh - self.top - spacing).max(0.0),
        };
        let (horizontal, vertical) = bounds.overflow(&content);
        if !horizontal && !vertical {
            return None;
        }
        Some(ScrollRequirement {
            region: self.region,
            elements: self.placements.iter().map(|p| p.id.clone()).collect(),
            bounds,
            content,
        })
    }
}

#[cfg(test)]
#[path = "optimizer_tests.rs"]
mod tests;
