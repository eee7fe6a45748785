//! Read-through cache of measured element rectangles.

use crate::model::{ElementId, Rect};
use crate::surface::RenderSurface;
use serde::Serialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
struct CachedDimensions {
    rect: Rect,
    measured_at: Instant,
}

/// Outcome of a cache lookup. A miss is a normal result, not an error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CacheLookup {
    /// Fresh entry served from the cache.
    Hit(Rect),
    /// Entry absent or expired; the surface was measured again.
    /// `None` if the host no longer has the element.
    Miss(Option<Rect>),
}

impl CacheLookup {
    /// Measured rectangle regardless of where it came from.
    pub fn rect(&self) -> Option<Rect> {
        match self {
            Self::Hit(rect) => Some(*rect),
            Self::Miss(rect) => *rect,
        }
    }

    /// Whether the lookup was served from the cache.
    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Hit(_))
    }
}

/// Counters reported by [`DimensionCache::stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    /// Entries currently held (fresh or not yet purged).
    pub size: usize,
    /// Lookups served from a fresh entry.
    pub hits: u64,
    /// Lookups that had to measure.
    pub misses: u64,
    /// `hits / (hits + misses)`, 0 before the first lookup.
    pub hit_rate: f64,
    /// Entries dropped because they outlived the ttl.
    pub expired: u64,
}

/// Element dimensions with a time-to-live.
#[derive(Debug, Clone)]
pub struct DimensionCache {
    entries: HashMap<ElementId, CachedDimensions>,
    ttl: Duration,
    hits: u64,
    misses: u64,
    expired: u64,
}

impl DimensionCache {
    /// Empty cache whose entries live for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            hits: 0,
            misses: 0,
            expired: 0,
        }
    }

    /// Entry lifetime.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn is_fresh(&self, entry: &CachedDimensions, now: Instant) -> bool {
        now.saturating_duration_since(entry.measured_at) < self.ttl
    }

    /// Measure an element and store the result.
    ///
    /// Returns `None` (and drops any stale entry) if the element is gone.
    pub fn cache_element_dimensions(
        &mut self,
        surface: &dyn RenderSurface,
        id: &ElementId,
        now: Instant,
    ) -> Option<Rect> {
        match surface.element_rect(id) {
            Some(rect) => {
                self.entries.insert(
                    id.clone(),
                    CachedDimensions {
                        rect,
                        measured_at: now,
                    },
                );
                Some(rect)
            }
            None => {
                self.entries.remove(id);
                None
            }
        }
    }

    /// Fresh cached rectangle, or a new measurement on miss.
    pub fn get_cached_dimensions(
        &mut self,
        surface: &dyn RenderSurface,
        id: &ElementId,
        now: Instant,
    ) -> CacheLookup {
        if let Some(entry) = self.entries.get(id) {
            if self.is_fresh(entry, now) {
                self.hits += 1;
                return CacheLookup::Hit(entry.rect);
            }
            self.entries.remove(id);
            self.expired += 1;
        }
        self.misses += 1;
        CacheLookup::Miss(self.cache_element_dimensions(surface, id, now))
    }

    /// Drop one entry, or everything when `id` is `None`.
    pub fn invalidate(&mut self, id: Option<&ElementId>) {
        match id {
            Some(id) => {
                self.entries.remove(id);
            }
            None => self.entries.clear(),
        }
    }

    /// Drop every entry older than the ttl. Returns how many were dropped.
    pub fn purge_expired(&mut self, now: Instant) -> usize {
        let ttl = self.ttl;
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| now.saturating_duration_since(entry.measured_at) < ttl);
        let purged = before - self.entries.len();
        self.expired += purged as u64;
        purged
    }

    /// Current counters.
    pub fn stats(&self) -> CacheStats {
        let lookups = self.hits + self.misses;
        CacheStats {
            size: self.entries.len(),
            hits: self.hits,
            misses: self.misses,
            hit_rate: if lookups == 0 {
                0.0
            } else {
                self.hits as f64 / lookups as f64
            },
            expired: self.expired,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::MemorySurface;

    fn id(raw: &str) -> ElementId {
        ElementId::new(raw).unwrap()
    }

    fn surface() -> MemorySurface {
        let mut surface = MemorySurface::new(800.0, 600.0);
        surface.insert_element(id("a"), Rect::new(0.0, 0.0, 100.0, 50.0));
        surface
    }

    #[test]
    fn first_lookup_misses_then_hits() {
        let surface = surface();
        let mut cache = DimensionCache::new(Duration::from_millis(1000));
        let t0 = Instant::now();

        let first = cache.get_cached_dimensions(&surface, &id("a"), t0);
        let second = cache.get_cached_dimensions(&surface, &id("a"), t0 + Duration::from_millis(10));

        assert!(!first.is_hit());
        assert!(second.is_hit());
        assert_eq!(second.rect(), Some(Rect::new(0.0, 0.0, 100.0, 50.0)));
        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses), (1, 1));
        assert_eq!(stats.hit_rate, 0.5);
    }

    #[test]
    fn entry_expires_after_ttl() {
        let mut surface = surface();
        let mut cache = DimensionCache::new(Duration::from_millis(1000));
        let t0 = Instant::now();
        cache.get_cached_dimensions(&surface, &id("a"), t0);

        surface.move_element(&id("a"), Rect::new(5.0, 5.0, 100.0, 50.0));
        let stale = cache.get_cached_dimensions(&surface, &id("a"), t0 + Duration::from_millis(999));
        let fresh = cache.get_cached_dimensions(&surface, &id("a"), t0 + Duration::from_millis(1000));

        assert_eq!(stale, CacheLookup::Hit(Rect::new(0.0, 0.0, 100.0, 50.0)));
        assert_eq!(fresh, CacheLookup::Miss(Some(Rect::new(5.0, 5.0, 100.0, 50.0))));
        assert_eq!(cache.stats().expired, 1);
    }

    #[test]
    fn missing_element_is_a_miss_without_entry() {
        let surface = surface();
        let mut cache = DimensionCache::new(Duration::from_millis(1000));
        let lookup = cache.get_cached_dimensions(&surface, &id("ghost"), Instant::now());
        assert_eq!(lookup, CacheLookup::Miss(None));
        assert_eq!(cache.stats().size, 0);
    }

    #[test]
    fn invalidate_single_and_all() {
        let mut surface = surface();
        surface.insert_element(id("b"), Rect::new(0.0, 100.0, 10.0, 10.0));
        let mut cache = DimensionCache::new(Duration::from_millis(1000));
        let now = Instant::now();
        cache.cache_element_dimensions(&surface, &id("a"), now);
        cache.cache_element_dimensions(&surface, &id("b"), now);

        cache.invalidate(Some(&id("a")));
        assert_eq!(cache.stats().size, 1);
        cache.invalidate(None);
        assert_eq!(cache.stats().size, 0);
    }

    #[test]
    fn purge_drops_only_expired_entries() {
        let mut surface = surface();
        surface.insert_element(id("b"), Rect::new(0.0, 100.0, 10.0, 10.0));
        let mut cache = DimensionCache::new(Duration::from_millis(1000));
        let t0 = Instant::now();
        cache.cache_element_dimensions(&surface, &id("a"), t0);
        cache.cache_element_dimensions(&surface, &id("b"), t0 + Duration::from_millis(600));

        assert_eq!(cache.purge_expired(t0 + Duration::from_millis(1200)), 1);
        assert_eq!(cache.stats().size, 1);
    }

    #[test]
    fn empty_stats_have_zero_hit_rate() {
        let cache = DimensionCache::new(Duration::from_millis(1000));
        assert_eq!(cache.stats().hit_rate, 0.0);
    }
}
