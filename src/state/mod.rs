//! Layout state: snapshot history and the element dimension cache.
//!
//! [`LayoutStateManager`] is an explicit instance owned by the analyzer and
//! lent to collaborators; nothing here is global.

mod cache;
mod history;

pub use cache::{CacheLookup, CacheStats, DimensionCache};
pub use history::{LayoutSnapshot, StateHistory};

use crate::model::{ElementId, Rect};
use crate::surface::RenderSurface;
use std::time::{Duration, Instant};
use tracing::debug;

/// Owner of the snapshot history and dimension cache.
#[derive(Debug, Clone)]
pub struct LayoutStateManager {
    history: StateHistory,
    cache: DimensionCache,
}

impl LayoutStateManager {
    /// Manager retaining `history_capacity` snapshots with cache entries
    /// living for `cache_ttl`.
    pub fn new(history_capacity: usize, cache_ttl: Duration) -> Self {
        Self {
            history: StateHistory::new(history_capacity),
            cache: DimensionCache::new(cache_ttl),
        }
    }

    /// Append a snapshot, trimming history to capacity.
    pub fn save_state(&mut self, snapshot: LayoutSnapshot) {
        debug!(
            valid = snapshot.is_valid,
            strategy = snapshot.configuration.strategy().as_str(),
            history = self.history.len() + 1,
            "Saving layout snapshot"
        );
        self.history.push(snapshot);
    }

    /// Copy of the newest snapshot.
    pub fn get_state(&self) -> Option<LayoutSnapshot> {
        self.history.latest().cloned()
    }

    /// Copy of the most recent valid snapshot, scanning backward.
    pub fn get_previous_state(&self) -> Option<LayoutSnapshot> {
        self.history.latest_valid().cloned()
    }

    /// Snapshots oldest first.
    pub fn history(&self) -> impl Iterator<Item = &LayoutSnapshot> {
        self.history.iter()
    }

    /// Number of retained snapshots.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Flag the newest snapshot as unusable for recovery.
    ///
    /// Returns `false` if the history is empty.
    pub fn mark_current_invalid(&mut self) -> bool {
        match self.history.latest_mut() {
            Some(snapshot) => {
                snapshot.is_valid = false;
                true
            }
            None => false,
        }
    }

    /// Drop every snapshot.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Measure an element and cache it.
    pub fn cache_element_dimensions(
        &mut self,
        surface: &dyn RenderSurface,
        id: &ElementId,
        now: Instant,
    ) -> Option<Rect> {
        self.cache.cache_element_dimensions(surface, id, now)
    }

    /// Read-through lookup.
    pub fn get_cached_dimensions(
        &mut self,
        surface: &dyn RenderSurface,
        id: &ElementId,
        now: Instant,
    ) -> CacheLookup {
        self.cache.get_cached_dimensions(surface, id, now)
    }

    /// Hit/miss counters and current size of the dimension cache.
    pub fn get_cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Drop one cache entry, or all of them.
    pub fn invalidate_cache(&mut self, id: Option<&ElementId>) {
        match id {
            Some(id) => debug!(element = %id, "Invalidating cached dimensions"),
            None => debug!("Invalidating dimension cache"),
        }
        self.cache.invalidate(id);
    }

    /// Sweep expired cache entries.
    pub fn purge_expired(&mut self, now: Instant) -> usize {
        self.cache.purge_expired(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::LayoutOptimizer;
    use crate::model::{AnalysisResult, ViewportDimensions};
    use crate::surface::MemorySurface;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn snapshot(width: f64) -> LayoutSnapshot {
        let viewport = ViewportDimensions::new(width, 720.0).unwrap();
        let config = LayoutOptimizer::default()
            .calculate_optimal_layout(&AnalysisResult::new(viewport, vec![]))
            .unwrap();
        LayoutSnapshot::new(Arc::new(config), BTreeMap::new())
    }

    fn manager() -> LayoutStateManager {
        LayoutStateManager::new(10, Duration::from_millis(1000))
    }

    #[test]
    fn empty_manager_has_no_state() {
        let manager = manager();
        assert!(manager.get_state().is_none());
        assert!(manager.get_previous_state().is_none());
    }

    #[test]
    fn history_is_trimmed_oldest_first() {
        let mut manager = LayoutStateManager::new(3, Duration::from_millis(1000));
        for width in [800.0, 900.0, 1000.0, 1100.0, 1200.0] {
            manager.save_state(snapshot(width));
        }
        let widths: Vec<f64> = manager.history().map(|s| s.viewport.width()).collect();
        assert_eq!(widths, vec![1000.0, 1100.0, 1200.0]);
    }

    #[test]
    fn get_state_returns_detached_copy() {
        let mut manager = manager();
        manager.save_state(snapshot(800.0));

        let mut copy = manager.get_state().unwrap();
        copy.is_valid = false;
        copy.element_dimensions
            .insert(ElementId::new("x").unwrap(), Rect::new(0.0, 0.0, 1.0, 1.0));

        let stored = manager.get_state().unwrap();
        assert!(stored.is_valid);
        assert!(stored.element_dimensions.is_empty());
    }

    #[test]
    fn previous_state_skips_invalid_entries() {
        let mut manager = manager();
        manager.save_state(snapshot(800.0));
        manager.save_state(snapshot(900.0).with_validity(false));
        manager.save_state(snapshot(1000.0));
        manager.mark_current_invalid();

        let previous = manager.get_previous_state().unwrap();
        assert_eq!(previous.viewport.width(), 800.0);
    }

    #[test]
    fn previous_state_is_none_when_all_invalid() {
        let mut manager = manager();
        manager.save_state(snapshot(800.0).with_validity(false));
        assert!(manager.get_previous_state().is_none());
    }

    #[test]
    fn mark_current_invalid_on_empty_history() {
        assert!(!manager().mark_current_invalid());
    }

    #[test]
    fn clear_history_drops_everything() {
        let mut manager = manager();
        manager.save_state(snapshot(800.0));
        manager.clear_history();
        assert_eq!(manager.history_len(), 0);
    }

    #[test]
    fn repeated_queries_exceed_eighty_percent_hit_rate() {
        let mut surface = MemorySurface::new(800.0, 600.0);
        let ids: Vec<ElementId> = (0..5)
            .map(|i| ElementId::new(format!("e{i}")).unwrap())
            .collect();
        for (i, id) in ids.iter().enumerate() {
            surface.insert_element(id.clone(), Rect::new(0.0, i as f64 * 50.0, 40.0, 40.0));
        }

        let mut manager = manager();
        let now = Instant::now();
        for round in 0..20 {
            for id in &ids {
                manager.get_cached_dimensions(&surface, id, now + Duration::from_millis(round));
            }
        }

        let stats = manager.get_cache_stats();
        assert_eq!(stats.size, 5);
        assert!(stats.hit_rate > 0.8, "hit rate {}", stats.hit_rate);
    }
}
