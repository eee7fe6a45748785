//! Pipeline orchestrator.
//!
//! [`ViewportAnalyzer`] owns the render surface and every component, and runs
//! one analysis pass end to end:
//!
//! 1. measure registered elements through the dimension cache
//! 2. refresh visibility
//! 3. compute the layout
//! 4. apply geometry (queued if a transition is running)
//! 5. reconcile scroll containers
//! 6. verify the realized geometry and save a snapshot
//!
//! Steps 5 and 6 only run once the geometry is on the surface. A queued pass
//! finishes them from [`ViewportAnalyzer::tick`] when its update commits; if
//! the commit fails, the pass is dropped and never enters the history.
//!
//! A failed stage aborts the pass: the error is recorded, the last valid
//! state is kept, and the pass returns `None`. There is no retry. If scroll
//! reconciliation fails after new geometry was written, the last valid layout
//! is written back together with its scroll containers.
//!
//! Time is explicit. The host forwards viewport signals with
//! [`ViewportAnalyzer::on_resize`] / [`ViewportAnalyzer::on_orientation_change`]
//! and drives debouncing, transitions, and cache expiry with
//! [`ViewportAnalyzer::tick`].

mod debounce;
mod stats;

pub use debounce::{DebounceState, ResizeDebouncer};
pub use stats::AnalyzerStats;

use crate::config::LayoutSettings;
use crate::layout::{AnalysisSummary, LayoutConfiguration, LayoutOptimizer};
use crate::model::{
    AnalysisError, AnalysisResult, ContainerId, ElementId, ElementSpec, InitializationError, Rect,
    SurfaceError, UiElement, ViewportDimensions,
};
use crate::overflow::OverflowHandler;
use crate::state::{LayoutSnapshot, LayoutStateManager};
use crate::surface::RenderSurface;
use crate::update::{DomUpdater, UpdateOutcome};
use crate::visibility::{SubscriptionId, VisibilityCallback, VisibilityDetector};
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Components that exist between `initialize` and `destroy`.
#[derive(Debug)]
struct Components {
    visibility: VisibilityDetector,
    state: LayoutStateManager,
    optimizer: LayoutOptimizer,
    overflow: OverflowHandler,
    updater: DomUpdater,
    /// Passes whose geometry sits in the updater queue, in queue order.
    awaiting: VecDeque<QueuedPass>,
}

/// A computed layout waiting behind a transition.
#[derive(Debug)]
struct QueuedPass {
    config: Arc<LayoutConfiguration>,
    dimensions: BTreeMap<ElementId, Rect>,
}

impl Components {
    /// Reconcile, verify, and record a layout whose geometry is committed.
    fn finish(
        &mut self,
        surface: &mut dyn RenderSurface,
        config: &Arc<LayoutConfiguration>,
        dimensions: BTreeMap<ElementId, Rect>,
    ) -> Result<(), SurfaceError> {
        self.overflow.reconcile(surface, config)?;

        let drift = self.updater.verify(surface, config);
        if !drift.is_empty() {
            warn!(drifted = drift.len(), "Realized geometry outside tolerance");
        }
        for placement in config.placements() {
            self.state.invalidate_cache(Some(&placement.id));
        }
        self.state.save_state(
            LayoutSnapshot::new(Arc::clone(config), dimensions).with_validity(drift.is_empty()),
        );
        Ok(())
    }

    /// Write the last valid layout and its scroll containers back.
    fn restore_last_valid(&mut self, surface: &mut dyn RenderSurface, now: Instant) {
        let Some(snapshot) = self.state.get_previous_state() else {
            let removed = self.overflow.remove_all(surface);
            warn!(removed, "No valid layout to restore, scroll containers dropped");
            return;
        };
        let config = snapshot.configuration;
        if let Err(err) = self.updater.restore(surface, Arc::clone(&config), now) {
            warn!(error = %err, "Restoring last valid geometry failed");
        }
        if let Err(err) = self.overflow.reconcile(surface, &config) {
            warn!(error = %err, "Restoring last valid scroll containers failed");
        }
    }

    /// Commit queued updates whose transition has elapsed and finish their
    /// passes. Returns the newest layout that made it onto the surface.
    fn settle(
        &mut self,
        surface: &mut dyn RenderSurface,
        now: Instant,
    ) -> Option<Arc<LayoutConfiguration>> {
        let before = self.updater.pending();
        let result = self.updater.tick(surface, now);
        let consumed = before - self.updater.pending();
        let committed = if result.is_err() {
            consumed.saturating_sub(1)
        } else {
            consumed
        };

        let mut latest = None;
        for _ in 0..committed {
            let Some(pass) = self.awaiting.pop_front() else {
                break;
            };
            match self.finish(surface, &pass.config, pass.dimensions) {
                Ok(()) => latest = Some(pass.config),
                Err(err) => {
                    warn!(error = %err, "Queued layout failed in overflow stage");
                    self.restore_last_valid(surface, now);
                    latest = self.state.get_previous_state().map(|s| s.configuration);
                }
            }
        }
        if let Err(err) = result {
            if let Some(pass) = self.awaiting.pop_front() {
                warn!(
                    error = %err,
                    strategy = pass.config.strategy().as_str(),
                    "Queued layout dropped"
                );
            }
        }
        latest
    }
}

/// Runs the layout pipeline against a render surface.
#[derive(Debug)]
pub struct ViewportAnalyzer<S: RenderSurface> {
    surface: S,
    settings: LayoutSettings,
    board: Option<ElementId>,
    elements: Vec<ElementSpec>,
    components: Option<Components>,
    destroyed: bool,
    /// Set while a pass runs. Hosts that call back into the analyzer from
    /// surface callbacks (through interior mutability) hit this guard.
    in_flight: bool,
    debouncer: ResizeDebouncer,
    last_viewport: Option<ViewportDimensions>,
    current: Option<Arc<LayoutConfiguration>>,
    stats: AnalyzerStats,
}

impl<S: RenderSurface> ViewportAnalyzer<S> {
    /// Analyzer over `surface`. Nothing runs until [`Self::initialize`].
    pub fn new(surface: S, settings: LayoutSettings) -> Self {
        let debouncer = ResizeDebouncer::new(settings.debounce());
        Self {
            surface,
            settings,
            board: None,
            elements: Vec::new(),
            components: None,
            destroyed: false,
            in_flight: false,
            debouncer,
            last_viewport: None,
            current: None,
            stats: AnalyzerStats::default(),
        }
    }

    /// Element that receives the board geometry.
    pub fn with_board(mut self, board: ElementId) -> Self {
        self.board = Some(board);
        self
    }

    /// Build every component and subscribe to viewport signals.
    ///
    /// Calling it again after success is a no-op.
    ///
    /// # Errors
    /// - `InitializationError::Destroyed` after [`Self::destroy`]
    /// - `InitializationError::InvalidSettings` for unusable settings
    /// - `InitializationError::Subscription` if the surface refuses signals
    ///
    /// The analyzer stays uninitialized on error.
    pub fn initialize(&mut self) -> Result<(), InitializationError> {
        if self.destroyed {
            return Err(InitializationError::Destroyed);
        }
        if self.components.is_some() {
            debug!("Analyzer already initialized");
            return Ok(());
        }
        self.settings.validate()?;
        self.surface
            .subscribe_viewport_signals()
            .map_err(InitializationError::Subscription)?;

        let mut visibility = VisibilityDetector::new(self.settings.refresh_budget());
        for spec in &self.elements {
            visibility.observe(&self.surface, spec.id.clone());
        }
        self.components = Some(Components {
            visibility,
            state: LayoutStateManager::new(
                self.settings.history_capacity,
                self.settings.cache_ttl(),
            ),
            optimizer: LayoutOptimizer::new(self.settings.optimizer()),
            overflow: OverflowHandler::new(),
            updater: DomUpdater::new(
                self.board.clone(),
                self.settings.board_z_index,
                self.settings.transition(),
                self.settings.position_tolerance,
            ),
            awaiting: VecDeque::new(),
        });
        info!(
            elements = self.elements.len(),
            board = self.board.is_some(),
            "Viewport analyzer initialized"
        );
        Ok(())
    }

    /// Components are built and signals subscribed.
    pub fn is_initialized(&self) -> bool {
        self.components.is_some()
    }

    /// Register an element for layout. Re-registering replaces its spec.
    pub fn observe_element(&mut self, spec: ElementSpec) {
        if let Some(components) = self.components.as_mut() {
            components.visibility.observe(&self.surface, spec.id.clone());
        }
        match self.elements.iter_mut().find(|known| known.id == spec.id) {
            Some(known) => *known = spec,
            None => self.elements.push(spec),
        }
    }

    /// Stop laying out an element. Returns `false` if it was not registered.
    pub fn unobserve_element(&mut self, id: &ElementId) -> bool {
        let before = self.elements.len();
        self.elements.retain(|spec| &spec.id != id);
        if let Some(components) = self.components.as_mut() {
            components.visibility.unobserve(id);
            components.state.invalidate_cache(Some(id));
        }
        self.elements.len() != before
    }

    /// Register a visibility callback. `None` before initialization.
    pub fn on_visibility_change(&mut self, callback: VisibilityCallback) -> Option<SubscriptionId> {
        self.components
            .as_mut()
            .map(|components| components.visibility.on_visibility_change(callback))
    }

    /// Forward a resize signal to the debouncer.
    pub fn on_resize(&mut self, width: f64, height: f64, now: Instant) {
        if self.components.is_none() {
            return;
        }
        self.debouncer.signal(width, height, now);
    }

    /// Orientation flips invalidate every cached dimension and always re-analyze.
    pub fn on_orientation_change(&mut self, now: Instant) {
        let Some(components) = self.components.as_mut() else {
            return;
        };
        components.state.invalidate_cache(None);
        let (width, height) = self.surface.viewport_size();
        self.debouncer.force(width, height, now);
    }

    /// Drive deferred work: queued updates, cache expiry, and debounced analysis.
    ///
    /// Returns the new configuration when a debounced analysis ran and succeeded.
    pub fn tick(&mut self, now: Instant) -> Option<Arc<LayoutConfiguration>> {
        let components = self.components.as_mut()?;
        if let Some(config) = components.settle(&mut self.surface, now) {
            self.current = Some(config);
        }
        components.state.purge_expired(now);

        let DebounceState::Ready {
            width,
            height,
            forced,
        } = self.debouncer.poll(now)
        else {
            return None;
        };

        if !forced {
            if let (Some(last), Ok(next)) =
                (self.last_viewport, ViewportDimensions::new(width, height))
            {
                let delta = last.delta(&next);
                if delta < self.settings.min_resize_delta {
                    self.stats.skipped_below_threshold += 1;
                    debug!(delta, "Resize below threshold, skipping analysis");
                    return None;
                }
            }
        }
        self.analyze_viewport(now)
    }

    /// Run the full pipeline once.
    ///
    /// Returns `None` if an analysis is already running or any stage fails;
    /// failures are recorded in [`Self::stats`] and leave the last valid
    /// layout in place. A layout queued behind a transition is returned but
    /// only becomes [`Self::current_configuration`] once it is committed.
    pub fn analyze_viewport(&mut self, now: Instant) -> Option<Arc<LayoutConfiguration>> {
        if self.in_flight {
            self.stats.skipped_in_flight += 1;
            debug!("Analysis already in flight");
            return None;
        }
        self.in_flight = true;
        self.stats.analyses += 1;
        let started = Instant::now();
        let result = self.run_pipeline(now);
        self.stats.last_duration = Some(started.elapsed());
        self.in_flight = false;

        match result {
            Ok((config, committed)) => {
                self.stats.successes += 1;
                if committed {
                    self.current = Some(Arc::clone(&config));
                }
                Some(config)
            }
            Err(err) => {
                self.stats.failures += 1;
                self.stats.last_error = Some(err.to_string());
                error!(error = %err, "Viewport analysis failed");
                self.recover();
                None
            }
        }
    }

    /// Returns the layout and whether it is already on the surface.
    fn run_pipeline(
        &mut self,
        now: Instant,
    ) -> Result<(Arc<LayoutConfiguration>, bool), AnalysisError> {
        let components = self.components.as_mut().ok_or(AnalysisError::NotInitialized)?;
        let surface = &mut self.surface;
        if let Some(config) = components.settle(&mut *surface, now) {
            self.current = Some(config);
        }

        let (width, height) = surface.viewport_size();
        let viewport = ViewportDimensions::new(width, height)
            .map_err(|err| AnalysisError::stage("measure", err))?;

        let mut elements = Vec::with_capacity(self.elements.len());
        let mut dimensions = BTreeMap::new();
        for spec in &self.elements {
            let lookup = components
                .state
                .get_cached_dimensions(&*surface, &spec.id, now);
            let Some(rect) = lookup.rect() else {
                debug!(element = %spec.id, "Element missing from surface, skipped");
                continue;
            };
            dimensions.insert(spec.id.clone(), rect);
            let mut element = UiElement::new(spec.clone(), rect);
            element.hidden = surface.is_hidden(&spec.id);
            elements.push(element);
        }

        components.visibility.refresh(&*surface);
        let invisible: Vec<ElementId> = components
            .visibility
            .invisible_elements()
            .into_iter()
            .filter(|id| dimensions.contains_key(id))
            .collect();

        let input = AnalysisResult::new(viewport, elements).with_invisible(invisible);
        let config = Arc::new(
            components
                .optimizer
                .calculate_optimal_layout(&input)
                .map_err(|err| AnalysisError::stage("optimize", err))?,
        );

        let outcome = components
            .updater
            .apply_configuration(&mut *surface, Arc::clone(&config), now)
            .map_err(|err| AnalysisError::stage("apply", err))?;

        let committed = match outcome {
            UpdateOutcome::Applied { .. } => {
                if let Err(err) = components.finish(&mut *surface, &config, dimensions) {
                    components.restore_last_valid(&mut *surface, now);
                    return Err(AnalysisError::stage("overflow", err));
                }
                true
            }
            UpdateOutcome::Queued { .. } => {
                components.awaiting.push_back(QueuedPass {
                    config: Arc::clone(&config),
                    dimensions,
                });
                false
            }
        };
        self.last_viewport = Some(viewport);

        info!(
            viewport_width = viewport.width(),
            viewport_height = viewport.height(),
            strategy = config.strategy().as_str(),
            board_size = config.board_size(),
            requires_scrolling = config.requires_scrolling(),
            queued = !committed,
            "Viewport analyzed"
        );
        Ok((config, committed))
    }

    /// Fall back to the last valid snapshot after a failed pass.
    fn recover(&mut self) {
        let Some(components) = self.components.as_ref() else {
            return;
        };
        match components.state.get_previous_state() {
            Some(snapshot) => {
                debug!(saved_at = %snapshot.timestamp, "Keeping last valid layout");
                self.current = Some(snapshot.configuration);
            }
            None => debug!("No valid layout to fall back to"),
        }
    }

    /// Scroll a container created by the overflow stage.
    pub fn scroll_by(&mut self, container: ContainerId, dx: f64, dy: f64) -> Option<(f64, f64)> {
        let components = self.components.as_mut()?;
        components
            .overflow
            .scroll_by(&mut self.surface, container, dx, dy)
    }

    /// Tear everything down: containers, queued updates, observers, signals.
    ///
    /// Idempotent. The analyzer cannot be initialized again afterwards.
    pub fn destroy(&mut self) {
        if let Some(mut components) = self.components.take() {
            let removed = components.overflow.remove_all(&mut self.surface);
            components.updater.reset();
            components.visibility.clear_subscribers();
            components.visibility.unobserve_all();
            self.surface.unsubscribe_viewport_signals();
            info!(removed_containers = removed, "Viewport analyzer destroyed");
        }
        self.debouncer.cancel();
        self.current = None;
        self.destroyed = true;
    }

    /// Counters and component sizes.
    pub fn stats(&self) -> AnalyzerStats {
        let mut stats = self.stats.clone();
        if let Some(components) = &self.components {
            stats.cache = components.state.get_cache_stats();
            stats.history_len = components.state.history_len();
            stats.active_containers = components.overflow.active_count();
            stats.queued_updates = components.updater.pending();
        }
        stats
    }

    /// Most recent successful (or recovered) configuration.
    pub fn current_configuration(&self) -> Option<Arc<LayoutConfiguration>> {
        self.current.clone()
    }

    /// Consumer payload of the current configuration.
    pub fn summary(&self) -> Option<AnalysisSummary> {
        self.current.as_ref().map(|config| config.summary())
    }

    /// Settings the analyzer was built with.
    pub fn settings(&self) -> &LayoutSettings {
        &self.settings
    }

    /// The render surface.
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Host-side access to the surface (moving elements, resizing).
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Visibility detector, `None` before initialization.
    pub fn visibility(&self) -> Option<&VisibilityDetector> {
        self.components.as_ref().map(|components| &components.visibility)
    }

    /// Snapshot history and dimension cache, `None` before initialization.
    pub fn state(&self) -> Option<&LayoutStateManager> {
        self.components.as_ref().map(|components| &components.state)
    }

    /// Scroll containers, `None` before initialization.
    pub fn overflow(&self) -> Option<&OverflowHandler> {
        self.components.as_ref().map(|components| &components.overflow)
    }
}

#[cfg(test)]
#[path = "analyzer_tests.rs"]
mod tests;
