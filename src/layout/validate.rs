//! Structural checks every published configuration must pass.

use super::configuration::{ElementPlacement, LayoutConfiguration};
use super::optimizer::OptimizerSettings;
use crate::model::{GroupId, Rect, ValidationError};
use std::collections::BTreeMap;

/// Rounding slack for floating-point comparisons.
const EPSILON: f64 = 1e-6;

/// Check a configuration against the layout invariants.
///
/// # Invariants checked
/// - Board and element rectangles are finite, non-negative, positively sized.
/// - Board is square, at least `min_board_size`, and inside the viewport
///   (containment is skipped when the viewport itself is smaller than the board floor).
/// - Elements keep `element_spacing - spacing_tolerance` from each other and the board.
/// - Consecutive group members are within `grouping_tolerance`, follow their order
///   indices top to bottom, and stay within `max_group_spread_ratio` of their packed extent.
pub fn validate_layout(
    config: &LayoutConfiguration,
    settings: &OptimizerSettings,
) -> Result<(), ValidationError> {
    validate_rect("board", &config.board)?;

    let board = config.board;
    if (board.width - board.height).abs() > EPSILON {
        return Err(ValidationError::BoardNotSquare {
            width: board.width,
            height: board.height,
        });
    }
    if board.width + EPSILON < settings.min_board_size {
        return Err(ValidationError::BoardTooSmall {
            size: board.width,
            minimum: settings.min_board_size,
        });
    }
    let viewport = config.viewport;
    let viewport_fits_floor = viewport.width() >= settings.min_board_size
        && viewport.height() >= settings.min_board_size;
    if viewport_fits_floor && !contains_with_slack(&viewport.bounds(), &board) {
        return Err(ValidationError::BoardOutsideViewport);
    }

    for placement in &config.placements {
        validate_rect(placement.id.as_str(), &placement.rect)?;
    }

    validate_spacing(config, settings)?;
    validate_groups(&config.placements, settings)
}

fn validate_rect(element: &str, rect: &Rect) -> Result<(), ValidationError> {
    if !rect.is_finite() {
        return Err(ValidationError::NonFiniteGeometry {
            element: element.to_string(),
        });
    }
    if rect.x < 0.0 || rect.y < 0.0 {
        return Err(ValidationError::NegativePosition {
            element: element.to_string(),
            x: rect.x,
            y: rect.y,
        });
    }
    if rect.width <= 0.0 || rect.height <= 0.0 {
        return Err(ValidationError::NonPositiveSize {
            element: element.to_string(),
            width: rect.width,
            height: rect.height,
        });
    }
    Ok(())
}

fn contains_with_slack(outer: &Rect, inner: &Rect) -> bool {
    inner.x >= outer.x - EPSILON
        && inner.y >= outer.y - EPSILON
        && inner.right() <= outer.right() + EPSILON
        && inner.bottom() <= outer.bottom() + EPSILON
}

fn validate_spacing(
    config: &LayoutConfiguration,
    settings: &OptimizerSettings,
) -> Result<(), ValidationError> {
    let minimum = settings.element_spacing - settings.spacing_tolerance;
    let placements = &config.placements;

    for (index, first) in placements.iter().enumerate() {
        let board_gap = first.rect.gap_to(&config.board);
        if board_gap + EPSILON < minimum {
            // The board has no element id; report the element against itself.
            return Err(ValidationError::SpacingViolation {
                first: first.id.clone(),
                second: first.id.clone(),
                gap: board_gap,
                minimum,
            });
        }
        for second in &placements[index + 1..] {
            let gap = first.rect.gap_to(&second.rect);
            if gap + EPSILON < minimum {
                return Err(ValidationError::SpacingViolation {
                    first: first.id.clone(),
                    second: second.id.clone(),
                    gap,
                    minimum,
                });
            }
        }
    }
    Ok(())
}

fn validate_groups(
    placements: &[ElementPlacement],
    settings: &OptimizerSettings,
) -> Result<(), ValidationError> {
    let mut groups: BTreeMap<&GroupId, Vec<&ElementPlacement>> = BTreeMap::new();
    for placement in placements {
        if let Some(group) = &placement.group {
            groups.entry(group).or_default().push(placement);
        }
    }

    for (group, mut members) in groups {
        if members.len() < 2 {
            continue;
        }
        members.sort_by(|a, b| a.rect.y.total_cmp(&b.rect.y).then(a.rect.x.total_cmp(&b.rect.x)));

        let mut last_order: Option<u32> = None;
        for member in &members {
            if let Some(order) = member.order {
                if last_order.is_some_and(|last| order < last) {
                    return Err(ValidationError::GroupOrderViolated {
                        group: group.clone(),
                    });
                }
                last_order = Some(order);
            }
        }

        for pair in members.windows(2) {
            let gap = pair[0].rect.gap_to(&pair[1].rect);
            if gap > settings.grouping_tolerance + EPSILON {
                return Err(ValidationError::GroupNotAdjacent {
                    group: group.clone(),
                    gap,
                    tolerance: settings.grouping_tolerance,
                });
            }
        }

        let extent = members
            .iter()
            .skip(1)
            .fold(members[0].rect, |acc, member| acc.union(&member.rect));
        let packed: f64 = members.iter().map(|member| member.rect.height).sum::<f64>()
            + settings.element_spacing * (members.len() - 1) as f64;
        let ratio = extent.height / packed;
        if ratio > settings.max_group_spread_ratio {
            return Err(ValidationError::GroupSpreadExceeded {
                group: group.clone(),
                ratio,
                ceiling: settings.max_group_spread_ratio,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::configuration::{LayoutRegion, LayoutStrategy};
    use crate::model::{ElementId, ViewportDimensions};

    fn settings() -> OptimizerSettings {
        OptimizerSettings::default()
    }

    fn placement(id: &str, rect: Rect) -> ElementPlacement {
        ElementPlacement {
            id: ElementId::new(id).unwrap(),
            rect,
            z_index: 10,
            region: LayoutRegion::SideColumn,
            group: None,
            order: None,
        }
    }

    fn grouped(id: &str, rect: Rect, order: u32) -> ElementPlacement {
        ElementPlacement {
            group: Some(GroupId::new("tools").unwrap()),
            order: Some(order),
            ..placement(id, rect)
        }
    }

    fn config(board: Rect, placements: Vec<ElementPlacement>) -> LayoutConfiguration {
        LayoutConfiguration {
            viewport: ViewportDimensions::new(1280.0, 720.0).unwrap(),
            board,
            strategy: LayoutStrategy::Horizontal,
            placements,
            requires_scrolling: false,
            scroll_requirements: Vec::new(),
        }
    }

    fn board() -> Rect {
        Rect::new(16.0, 16.0, 600.0, 600.0)
    }

    #[test]
    fn well_formed_layout_passes() {
        let config = config(
            board(),
            vec![
                placement("a", Rect::new(632.0, 16.0, 200.0, 100.0)),
                placement("b", Rect::new(632.0, 132.0, 200.0, 100.0)),
            ],
        );
        assert_eq!(validate_layout(&config, &settings()), Ok(()));
    }

    #[test]
    fn non_square_board_fails() {
        let config = config(Rect::new(16.0, 16.0, 600.0, 500.0), vec![]);
        assert!(matches!(
            validate_layout(&config, &settings()),
            Err(ValidationError::BoardNotSquare { .. })
        ));
    }

    #[test]
    fn small_board_fails() {
        let config = config(Rect::new(16.0, 16.0, 200.0, 200.0), vec![]);
        assert!(matches!(
            validate_layout(&config, &settings()),
            Err(ValidationError::BoardTooSmall { .. })
        ));
    }

    #[test]
    fn board_outside_viewport_fails() {
        let config = config(Rect::new(700.0, 16.0, 600.0, 600.0), vec![]);
        assert_eq!(
            validate_layout(&config, &settings()),
            Err(ValidationError::BoardOutsideViewport)
        );
    }

    #[test]
    fn nan_element_fails() {
        let config = config(
            board(),
            vec![placement("a", Rect::new(f64::NAN, 16.0, 200.0, 100.0))],
        );
        assert!(matches!(
            validate_layout(&config, &settings()),
            Err(ValidationError::NonFiniteGeometry { .. })
        ));
    }

    #[test]
    fn zero_sized_element_fails() {
        let config = config(board(), vec![placement("a", Rect::new(632.0, 16.0, 0.0, 100.0))]);
        assert!(matches!(
            validate_layout(&config, &settings()),
            Err(ValidationError::NonPositiveSize { .. })
        ));
    }

    #[test]
    fn crowded_elements_fail_spacing() {
        let config = config(
            board(),
            vec![
                placement("a", Rect::new(632.0, 16.0, 200.0, 100.0)),
                placement("b", Rect::new(632.0, 121.0, 200.0, 100.0)),
            ],
        );
        assert!(matches!(
            validate_layout(&config, &settings()),
            Err(ValidationError::SpacingViolation { gap, .. }) if gap == 5.0
        ));
    }

    #[test]
    fn spacing_tolerance_allows_one_pixel_shortfall() {
        let config = config(
            board(),
            vec![
                placement("a", Rect::new(632.0, 16.0, 200.0, 100.0)),
                placement("b", Rect::new(632.0, 131.0, 200.0, 100.0)),
            ],
        );
        assert_eq!(validate_layout(&config, &settings()), Ok(()));
    }

    #[test]
    fn element_touching_board_fails() {
        let config = config(board(), vec![placement("a", Rect::new(620.0, 16.0, 200.0, 100.0))]);
        assert!(matches!(
            validate_layout(&config, &settings()),
            Err(ValidationError::SpacingViolation { .. })
        ));
    }

    #[test]
    fn separated_group_fails_adjacency() {
        let config = config(
            board(),
            vec![
                grouped("a", Rect::new(632.0, 16.0, 200.0, 100.0), 0),
                grouped("b", Rect::new(632.0, 216.0, 200.0, 100.0), 1),
            ],
        );
        assert!(matches!(
            validate_layout(&config, &settings()),
            Err(ValidationError::GroupNotAdjacent { .. })
        ));
    }

    #[test]
    fn reversed_group_fails_order() {
        let config = config(
            board(),
            vec![
                grouped("a", Rect::new(632.0, 132.0, 200.0, 100.0), 0),
                grouped("b", Rect::new(632.0, 16.0, 200.0, 100.0), 1),
            ],
        );
        assert!(matches!(
            validate_layout(&config, &settings()),
            Err(ValidationError::GroupOrderViolated { .. })
        ));
    }

    #[test]
    fn side_by_side_group_is_adjacent() {
        let config = config(
            board(),
            vec![
                grouped("a", Rect::new(632.0, 16.0, 100.0, 100.0), 0),
                grouped("b", Rect::new(748.0, 16.0, 100.0, 100.0), 1),
            ],
        );
        assert_eq!(validate_layout(&config, &settings()), Ok(()));
    }
}
