//! In-memory render surface.

use super::{
    Geometry, HandlerId, IndicatorEdge, IndicatorId, InteractionKind, RenderSurface, ScrollRegion,
};
use crate::model::{ContainerId, ElementId, Rect, SurfaceError};
use std::collections::{BTreeMap, BTreeSet};

/// One element of the in-memory render tree.
///
/// `attributes` holds theme styling and accessibility metadata (classes,
/// colors, `aria-*`, focus handlers). The core can never write it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ElementNode {
    /// Realized geometry.
    pub rect: Rect,
    /// Realized stacking order.
    pub z_index: i32,
    /// Explicitly hidden by the host.
    pub hidden: bool,
    /// Non-geometric properties.
    pub attributes: BTreeMap<String, String>,
    /// Keyboard tab order.
    pub tab_index: Option<i32>,
}

#[derive(Debug, Clone, PartialEq)]
struct ScrollState {
    members: Vec<ElementId>,
    region: ScrollRegion,
    offset: (f64, f64),
}

/// Headless [`RenderSurface`] backed by ordered maps.
#[derive(Debug, Clone, Default)]
pub struct MemorySurface {
    viewport: (f64, f64),
    elements: BTreeMap<ElementId, ElementNode>,
    scroll: BTreeMap<ContainerId, ScrollState>,
    indicators: BTreeMap<IndicatorId, (ContainerId, IndicatorEdge)>,
    handlers: BTreeMap<HandlerId, (ContainerId, InteractionKind)>,
    next_handle: u64,
    frames: u64,
    writes: u64,
    subscribed: bool,
    reject_writes: bool,
    rejected_elements: BTreeSet<ElementId>,
    reject_subscription: bool,
    reject_scroll_regions: bool,
}

impl MemorySurface {
    /// Empty surface with the given viewport.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            viewport: (width, height),
            ..Self::default()
        }
    }

    /// Resize the viewport.
    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.viewport = (width, height);
    }

    /// Add (or replace) an element at `rect`.
    pub fn insert_element(&mut self, id: ElementId, rect: Rect) {
        self.elements.insert(
            id,
            ElementNode {
                rect,
                ..ElementNode::default()
            },
        );
    }

    /// Remove an element from the tree (host-side destruction).
    pub fn remove_element(&mut self, id: &ElementId) -> Option<ElementNode> {
        self.elements.remove(id)
    }

    /// Move an element without going through the core.
    pub fn move_element(&mut self, id: &ElementId, rect: Rect) {
        if let Some(node) = self.elements.get_mut(id) {
            node.rect = rect;
        }
    }

    /// Set a theme or accessibility attribute.
    pub fn set_attribute(&mut self, id: &ElementId, key: &str, value: &str) {
        if let Some(node) = self.elements.get_mut(id) {
            node.attributes.insert(key.to_string(), value.to_string());
        }
    }

    /// Set the keyboard tab order.
    pub fn set_tab_index(&mut self, id: &ElementId, tab_index: i32) {
        if let Some(node) = self.elements.get_mut(id) {
            node.tab_index = Some(tab_index);
        }
    }

    /// Toggle host-side hiding.
    pub fn set_hidden(&mut self, id: &ElementId, hidden: bool) {
        if let Some(node) = self.elements.get_mut(id) {
            node.hidden = hidden;
        }
    }

    /// Borrow an element node.
    pub fn node(&self, id: &ElementId) -> Option<&ElementNode> {
        self.elements.get(id)
    }

    /// Number of elements in the tree.
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Frames requested so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Geometry writes accepted so far.
    pub fn writes(&self) -> u64 {
        self.writes
    }

    /// Whether viewport signals are currently subscribed.
    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    /// Scroll region styling of a container, if present.
    pub fn scroll_region(&self, container: ContainerId) -> Option<&ScrollRegion> {
        self.scroll.get(&container).map(|state| &state.region)
    }

    /// Members of a scroll region.
    pub fn scroll_members(&self, container: ContainerId) -> Option<&[ElementId]> {
        self.scroll.get(&container).map(|state| state.members.as_slice())
    }

    /// Current scroll offset of a container.
    pub fn scroll_offset(&self, container: ContainerId) -> Option<(f64, f64)> {
        self.scroll.get(&container).map(|state| state.offset)
    }

    /// Number of scroll regions currently styled.
    pub fn scroll_region_count(&self) -> usize {
        self.scroll.len()
    }

    /// Indicators attached to a container.
    pub fn indicator_count(&self, container: ContainerId) -> usize {
        self.indicators
            .values()
            .filter(|(owner, _)| *owner == container)
            .count()
    }

    /// Handlers attached to a container.
    pub fn handler_count(&self, container: ContainerId) -> usize {
        self.handlers
            .values()
            .filter(|(owner, _)| *owner == container)
            .count()
    }

    /// All indicators on the surface.
    pub fn total_indicators(&self) -> usize {
        self.indicators.len()
    }

    /// All handlers on the surface.
    pub fn total_handlers(&self) -> usize {
        self.handlers.len()
    }

    /// Make every subsequent geometry write fail.
    pub fn reject_writes(&mut self, reject: bool) {
        self.reject_writes = reject;
    }

    /// Make geometry writes to one element fail.
    pub fn reject_writes_to(&mut self, id: ElementId) {
        self.rejected_elements.insert(id);
    }

    /// Make every subsequent scroll region update fail.
    pub fn reject_scroll_regions(&mut self, reject: bool) {
        self.reject_scroll_regions = reject;
    }

    /// Make the next signal subscription fail.
    pub fn reject_subscription(&mut self, reject: bool) {
        self.reject_subscription = reject;
    }

    fn next_handle(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }
}

impl RenderSurface for MemorySurface {
    fn viewport_size(&self) -> (f64, f64) {
        self.viewport
    }

    fn element_rect(&self, id: &ElementId) -> Option<Rect> {
        self.elements.get(id).map(|node| node.rect)
    }

    fn element_z_index(&self, id: &ElementId) -> Option<i32> {
        self.elements.get(id).map(|node| node.z_index)
    }

    fn is_hidden(&self, id: &ElementId) -> bool {
        self.elements.get(id).is_some_and(|node| node.hidden)
    }

    fn write_geometry(&mut self, id: &ElementId, geometry: Geometry) -> Result<(), SurfaceError> {
        if self.reject_writes || self.rejected_elements.contains(id) {
            return Err(SurfaceError::Rejected {
                element: id.clone(),
                reason: "write rejected by host".to_string(),
            });
        }
        let node = self
            .elements
            .get_mut(id)
            .ok_or_else(|| SurfaceError::UnknownElement(id.clone()))?;
        node.rect = geometry.rect;
        node.z_index = geometry.z_index;
        self.writes += 1;
        Ok(())
    }

    fn request_frame(&mut self) {
        self.frames += 1;
    }

    fn set_scroll_region(
        &mut self,
        container: ContainerId,
        members: &[ElementId],
        region: ScrollRegion,
    ) -> Result<(), SurfaceError> {
        if self.reject_scroll_regions {
            return Err(SurfaceError::ScrollRegionRejected {
                container,
                reason: "scroll region rejected by host".to_string(),
            });
        }
        if let Some(missing) = members.iter().find(|id| !self.elements.contains_key(*id)) {
            return Err(SurfaceError::UnknownElement(missing.clone()));
        }
        let offset = self
            .scroll
            .get(&container)
            .map(|state| state.offset)
            .unwrap_or((0.0, 0.0));
        self.scroll.insert(
            container,
            ScrollState {
                members: members.to_vec(),
                region,
                offset,
            },
        );
        Ok(())
    }

    fn clear_scroll_region(&mut self, container: ContainerId) {
        self.scroll.remove(&container);
    }

    fn set_scroll_offset(&mut self, container: ContainerId, x: f64, y: f64) {
        if let Some(state) = self.scroll.get_mut(&container) {
            state.offset = (x, y);
        }
    }

    fn add_indicator(&mut self, container: ContainerId, edge: IndicatorEdge) -> IndicatorId {
        let id = IndicatorId::new(self.next_handle());
        self.indicators.insert(id, (container, edge));
        id
    }

    fn remove_indicator(&mut self, indicator: IndicatorId) {
        self.indicators.remove(&indicator);
    }

    fn attach_handler(&mut self, container: ContainerId, kind: InteractionKind) -> HandlerId {
        let id = HandlerId::new(self.next_handle());
        self.handlers.insert(id, (container, kind));
        id
    }

    fn detach_handler(&mut self, handler: HandlerId) {
        self.handlers.remove(&handler);
    }

    fn subscribe_viewport_signals(&mut self) -> Result<(), SurfaceError> {
        if self.reject_subscription {
            return Err(SurfaceError::Subscription(
                "signal source unavailable".to_string(),
            ));
        }
        self.subscribed = true;
        Ok(())
    }

    fn unsubscribe_viewport_signals(&mut self) {
        self.subscribed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: &str) -> ElementId {
        ElementId::new(raw).expect("valid element id")
    }

    #[test]
    fn write_geometry_updates_only_geometry() {
        let mut surface = MemorySurface::new(800.0, 600.0);
        surface.insert_element(id("a"), Rect::new(0.0, 0.0, 10.0, 10.0));
        surface.set_attribute(&id("a"), "aria-label", "Score");
        surface.set_tab_index(&id("a"), 3);

        surface
            .write_geometry(
                &id("a"),
                Geometry {
                    rect: Rect::new(5.0, 6.0, 7.0, 8.0),
                    z_index: 4,
                },
            )
            .unwrap();

        let node = surface.node(&id("a")).unwrap();
        assert_eq!(node.rect, Rect::new(5.0, 6.0, 7.0, 8.0));
        assert_eq!(node.z_index, 4);
        assert_eq!(node.attributes.get("aria-label").unwrap(), "Score");
        assert_eq!(node.tab_index, Some(3));
        assert_eq!(surface.writes(), 1);
    }

    #[test]
    fn write_to_unknown_element_fails() {
        let mut surface = MemorySurface::new(800.0, 600.0);
        let result = surface.write_geometry(
            &id("ghost"),
            Geometry {
                rect: Rect::default(),
                z_index: 0,
            },
        );
        assert_eq!(result, Err(SurfaceError::UnknownElement(id("ghost"))));
    }

    #[test]
    fn rejected_writes_leave_tree_untouched() {
        let mut surface = MemorySurface::new(800.0, 600.0);
        surface.insert_element(id("a"), Rect::new(0.0, 0.0, 10.0, 10.0));
        surface.reject_writes(true);
        let result = surface.write_geometry(
            &id("a"),
            Geometry {
                rect: Rect::new(1.0, 1.0, 1.0, 1.0),
                z_index: 1,
            },
        );
        assert!(result.is_err());
        assert_eq!(surface.element_rect(&id("a")), Some(Rect::new(0.0, 0.0, 10.0, 10.0)));
    }

    #[test]
    fn rejected_scroll_regions_are_not_recorded() {
        let mut surface = MemorySurface::new(800.0, 600.0);
        surface.insert_element(id("a"), Rect::new(0.0, 0.0, 10.0, 10.0));
        surface.reject_scroll_regions(true);
        let container = ContainerId::new(1);
        let result = surface.set_scroll_region(
            container,
            &[id("a")],
            ScrollRegion {
                viewport: Rect::new(0.0, 0.0, 10.0, 5.0),
                content: Rect::new(0.0, 0.0, 10.0, 10.0),
                axis: crate::surface::ScrollAxis::Vertical,
            },
        );
        assert!(matches!(
            result,
            Err(SurfaceError::ScrollRegionRejected { .. })
        ));
        assert_eq!(surface.scroll_region_count(), 0);
    }

    #[test]
    fn indicators_and_handlers_are_tracked_per_container() {
        let mut surface = MemorySurface::new(800.0, 600.0);
        let container = ContainerId::new(1);
        let indicator = surface.add_indicator(container, IndicatorEdge::Top);
        let handler = surface.attach_handler(container, InteractionKind::Touch);
        assert_eq!(surface.indicator_count(container), 1);
        assert_eq!(surface.handler_count(container), 1);

        surface.remove_indicator(indicator);
        surface.detach_handler(handler);
        surface.detach_handler(handler);
        assert_eq!(surface.total_indicators(), 0);
        assert_eq!(surface.total_handlers(), 0);
    }

    #[test]
    fn subscription_can_be_rejected() {
        let mut surface = MemorySurface::new(800.0, 600.0);
        surface.reject_subscription(true);
        assert!(surface.subscribe_viewport_signals().is_err());
        assert!(!surface.is_subscribed());
    }
}
