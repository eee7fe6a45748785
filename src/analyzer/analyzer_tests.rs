//! Tests for the analysis pipeline orchestrator.

use super::*;
use crate::model::Rect;
use crate::surface::MemorySurface;
use std::time::Duration;

fn id(raw: &str) -> ElementId {
    ElementId::new(raw).expect("valid element id")
}

fn settings() -> LayoutSettings {
    LayoutSettings {
        transition_ms: 0,
        ..LayoutSettings::default()
    }
}

fn surface(width: f64, height: f64, panels: usize) -> MemorySurface {
    let mut surface = MemorySurface::new(width, height);
    surface.insert_element(id("board"), Rect::new(0.0, 0.0, 400.0, 400.0));
    for i in 0..panels {
        surface.insert_element(
            id(&format!("panel-{i}")),
            Rect::new(20.0, 20.0 + i as f64 * 120.0, 200.0, 100.0),
        );
    }
    surface
}

fn analyzer(panels: usize) -> ViewportAnalyzer<MemorySurface> {
    analyzer_with(surface(1280.0, 720.0, panels), panels, settings())
}

fn analyzer_with(
    surface: MemorySurface,
    panels: usize,
    settings: LayoutSettings,
) -> ViewportAnalyzer<MemorySurface> {
    let mut analyzer = ViewportAnalyzer::new(surface, settings).with_board(id("board"));
    for i in 0..panels {
        analyzer.observe_element(ElementSpec::new(id(&format!("panel-{i}"))));
    }
    analyzer
}

// ===== Lifecycle =====

#[test]
fn initialize_is_idempotent() {
    let mut analyzer = analyzer(2);
    analyzer.initialize().unwrap();
    analyzer.initialize().unwrap();

    assert!(analyzer.is_initialized());
    assert!(analyzer.surface().is_subscribed());
    assert_eq!(analyzer.visibility().unwrap().tracked(), 2);
}

#[test]
fn invalid_settings_leave_analyzer_uninitialized() {
    let settings = LayoutSettings {
        element_spacing: 0.0,
        ..settings()
    };
    let mut analyzer = analyzer_with(surface(1280.0, 720.0, 1), 1, settings);

    let err = analyzer.initialize().unwrap_err();

    assert!(matches!(err, InitializationError::InvalidSettings { .. }));
    assert!(!analyzer.is_initialized());
    assert!(!analyzer.surface().is_subscribed());
}

#[test]
fn subscription_failure_is_surfaced_and_retryable() {
    let mut analyzer = analyzer(1);
    analyzer.surface_mut().reject_subscription(true);

    assert!(matches!(
        analyzer.initialize(),
        Err(InitializationError::Subscription(_))
    ));
    assert!(!analyzer.is_initialized());

    analyzer.surface_mut().reject_subscription(false);
    analyzer.initialize().unwrap();
    assert!(analyzer.is_initialized());
}

#[test]
fn destroy_releases_everything_and_is_final() {
    let mut analyzer = analyzer_with(surface(400.0, 700.0, 5), 5, settings());
    analyzer.initialize().unwrap();
    analyzer.analyze_viewport(Instant::now()).unwrap();
    assert_eq!(analyzer.surface().scroll_region_count(), 1);

    analyzer.destroy();
    analyzer.destroy();

    assert!(!analyzer.is_initialized());
    assert!(!analyzer.surface().is_subscribed());
    assert_eq!(analyzer.surface().scroll_region_count(), 0);
    assert_eq!(analyzer.surface().total_handlers(), 0);
    assert_eq!(analyzer.surface().element_count(), 6);
    assert!(analyzer.current_configuration().is_none());
    assert!(matches!(
        analyzer.initialize(),
        Err(InitializationError::Destroyed)
    ));
}

// ===== Analysis =====

#[test]
fn analyze_before_initialize_records_failure() {
    let mut analyzer = analyzer(1);

    assert!(analyzer.analyze_viewport(Instant::now()).is_none());

    let stats = analyzer.stats();
    assert_eq!(stats.failures, 1);
    assert!(stats.last_error.unwrap().contains("not initialized"));
}

#[test]
fn analysis_applies_layout_and_saves_snapshot() {
    let mut analyzer = analyzer(3);
    analyzer.initialize().unwrap();

    let config = analyzer.analyze_viewport(Instant::now()).unwrap();

    assert_eq!(
        analyzer.surface().element_rect(&id("board")),
        Some(config.board())
    );
    for placement in config.placements() {
        assert_eq!(
            analyzer.surface().element_rect(&placement.id),
            Some(placement.rect)
        );
    }
    let stats = analyzer.stats();
    assert_eq!((stats.analyses, stats.successes), (1, 1));
    assert_eq!(stats.history_len, 1);
    assert!(analyzer.state().unwrap().get_state().unwrap().is_valid);

    let summary = analyzer.summary().unwrap();
    assert_eq!(summary.viewport_width, 1280.0);
    assert_eq!(summary.board_dimensions.width, config.board_size());
}

#[test]
fn concurrent_analysis_short_circuits() {
    let mut analyzer = analyzer(1);
    analyzer.initialize().unwrap();
    analyzer.in_flight = true;

    assert!(analyzer.analyze_viewport(Instant::now()).is_none());
    assert_eq!(analyzer.stats().skipped_in_flight, 1);
    assert_eq!(analyzer.stats().analyses, 0);

    analyzer.in_flight = false;
    assert!(analyzer.analyze_viewport(Instant::now()).is_some());
}

#[test]
fn failed_stage_keeps_last_valid_layout() {
    let mut analyzer = analyzer(2);
    analyzer.initialize().unwrap();
    let first = analyzer.analyze_viewport(Instant::now()).unwrap();
    let board_before = analyzer.surface().element_rect(&id("board"));

    analyzer.surface_mut().set_viewport(1920.0, 1080.0);
    analyzer.surface_mut().reject_writes(true);
    let result = analyzer.analyze_viewport(Instant::now());

    assert!(result.is_none());
    assert_eq!(analyzer.current_configuration(), Some(first));
    assert_eq!(analyzer.surface().element_rect(&id("board")), board_before);
    let stats = analyzer.stats();
    assert_eq!(stats.failures, 1);
    assert!(stats.last_error.unwrap().contains("apply"));
    assert_eq!(stats.history_len, 1);
}

#[test]
fn failed_apply_leaves_scroll_containers_untouched() {
    let mut analyzer = analyzer_with(surface(1920.0, 1080.0, 5), 5, settings());
    analyzer.initialize().unwrap();
    analyzer.analyze_viewport(Instant::now()).unwrap();
    assert_eq!(analyzer.surface().scroll_region_count(), 0);

    // This viewport needs a scroll container below the board.
    analyzer.surface_mut().set_viewport(400.0, 700.0);
    analyzer.surface_mut().reject_writes(true);
    assert!(analyzer.analyze_viewport(Instant::now()).is_none());

    assert_eq!(analyzer.surface().scroll_region_count(), 0);
    assert_eq!(analyzer.overflow().unwrap().active_count(), 0);
    assert!(analyzer.stats().last_error.unwrap().contains("apply"));
}

#[test]
fn rejected_scroll_region_restores_last_valid_layout() {
    let mut analyzer = analyzer_with(surface(1920.0, 1080.0, 5), 5, settings());
    analyzer.initialize().unwrap();
    let first = analyzer.analyze_viewport(Instant::now()).unwrap();
    let on_screen: Vec<Option<Rect>> = ["board", "panel-0", "panel-4"]
        .iter()
        .map(|raw| analyzer.surface().element_rect(&id(raw)))
        .collect();

    analyzer.surface_mut().set_viewport(400.0, 700.0);
    analyzer.surface_mut().reject_scroll_regions(true);
    assert!(analyzer.analyze_viewport(Instant::now()).is_none());

    let after: Vec<Option<Rect>> = ["board", "panel-0", "panel-4"]
        .iter()
        .map(|raw| analyzer.surface().element_rect(&id(raw)))
        .collect();
    assert_eq!(after, on_screen);
    assert_eq!(analyzer.surface().scroll_region_count(), 0);
    assert_eq!(analyzer.overflow().unwrap().active_count(), 0);
    assert_eq!(analyzer.current_configuration(), Some(first));
    let stats = analyzer.stats();
    assert!(stats.last_error.unwrap().contains("overflow"));
    assert_eq!(stats.history_len, 1);
}

#[test]
fn non_finite_viewport_fails_measure_stage() {
    let mut analyzer = analyzer(1);
    analyzer.initialize().unwrap();
    analyzer.surface_mut().set_viewport(f64::NAN, 720.0);

    assert!(analyzer.analyze_viewport(Instant::now()).is_none());
    assert!(analyzer.stats().last_error.unwrap().contains("measure"));
}

#[test]
fn missing_board_fails_apply_without_partial_writes() {
    let mut surface = surface(1280.0, 720.0, 2);
    surface.remove_element(&id("board"));
    let mut analyzer = analyzer_with(surface, 2, settings());
    analyzer.initialize().unwrap();

    assert!(analyzer.analyze_viewport(Instant::now()).is_none());
    assert_eq!(analyzer.surface().writes(), 0);
}

#[test]
fn unobserved_elements_are_no_longer_placed() {
    let mut analyzer = analyzer(2);
    analyzer.initialize().unwrap();

    assert!(analyzer.unobserve_element(&id("panel-1")));
    assert!(!analyzer.unobserve_element(&id("panel-1")));
    let config = analyzer.analyze_viewport(Instant::now()).unwrap();

    assert!(config.placement(&id("panel-1")).is_none());
    assert!(config.placement(&id("panel-0")).is_some());
}

#[test]
fn hidden_elements_are_skipped() {
    let mut analyzer = analyzer(2);
    analyzer.surface_mut().set_hidden(&id("panel-0"), true);
    analyzer.initialize().unwrap();

    let config = analyzer.analyze_viewport(Instant::now()).unwrap();
    assert!(config.placement(&id("panel-0")).is_none());
}

// ===== Signals =====

#[test]
fn resize_is_debounced() {
    let mut analyzer = analyzer(2);
    analyzer.initialize().unwrap();
    let t0 = Instant::now();
    analyzer.analyze_viewport(t0).unwrap();

    analyzer.surface_mut().set_viewport(1024.0, 768.0);
    analyzer.on_resize(1024.0, 768.0, t0);

    assert!(analyzer.tick(t0 + Duration::from_millis(50)).is_none());
    let config = analyzer.tick(t0 + Duration::from_millis(100)).unwrap();
    assert_eq!(config.viewport().width(), 1024.0);
    assert_eq!(analyzer.stats().analyses, 2);
}

#[test]
fn small_resize_is_ignored() {
    let mut analyzer = analyzer(2);
    analyzer.initialize().unwrap();
    let t0 = Instant::now();
    analyzer.analyze_viewport(t0).unwrap();

    analyzer.surface_mut().set_viewport(1285.0, 720.0);
    analyzer.on_resize(1285.0, 720.0, t0);

    assert!(analyzer.tick(t0 + Duration::from_millis(100)).is_none());
    let stats = analyzer.stats();
    assert_eq!(stats.skipped_below_threshold, 1);
    assert_eq!(stats.analyses, 1);
}

#[test]
fn orientation_change_invalidates_cache_and_forces_analysis() {
    let mut analyzer = analyzer(2);
    analyzer.initialize().unwrap();
    let t0 = Instant::now();
    analyzer.analyze_viewport(t0).unwrap();
    assert!(analyzer.stats().cache.size > 0 || analyzer.stats().cache.misses > 0);

    analyzer.on_orientation_change(t0);
    assert_eq!(analyzer.stats().cache.size, 0);

    assert!(analyzer.tick(t0 + Duration::from_millis(100)).is_some());
    assert_eq!(analyzer.stats().analyses, 2);
}

#[test]
fn signals_before_initialize_are_ignored() {
    let mut analyzer = analyzer(1);
    let t0 = Instant::now();
    analyzer.on_resize(800.0, 600.0, t0);
    assert!(analyzer.tick(t0 + Duration::from_secs(1)).is_none());
    assert_eq!(analyzer.stats().analyses, 0);
}

#[test]
fn updates_during_transition_are_queued_and_drained_by_tick() {
    let settings = LayoutSettings {
        transition_ms: 150,
        ..LayoutSettings::default()
    };
    let mut analyzer = analyzer_with(surface(1280.0, 720.0, 2), 2, settings);
    analyzer.initialize().unwrap();
    let t0 = Instant::now();
    let first = analyzer.analyze_viewport(t0).unwrap();

    analyzer.surface_mut().set_viewport(1920.0, 1080.0);
    let second = analyzer
        .analyze_viewport(t0 + Duration::from_millis(20))
        .unwrap();
    assert_eq!(analyzer.stats().queued_updates, 1);
    assert_eq!(
        analyzer.surface().element_rect(&id("board")),
        Some(first.board())
    );

    assert_eq!(analyzer.current_configuration(), Some(Arc::clone(&first)));
    assert_eq!(analyzer.stats().history_len, 1);

    analyzer.tick(t0 + Duration::from_millis(150));
    assert_eq!(analyzer.stats().queued_updates, 0);
    assert_eq!(
        analyzer.surface().element_rect(&id("board")),
        Some(second.board())
    );
    assert_eq!(analyzer.current_configuration(), Some(Arc::clone(&second)));
    let latest = analyzer.state().unwrap().get_state().unwrap();
    assert_eq!(latest.configuration, second);
    assert!(latest.is_valid);
    assert_eq!(analyzer.stats().history_len, 2);
}

#[test]
fn failed_queued_commit_never_enters_history() {
    let settings = LayoutSettings {
        transition_ms: 150,
        ..LayoutSettings::default()
    };
    let mut analyzer = analyzer_with(surface(1280.0, 720.0, 2), 2, settings);
    analyzer.initialize().unwrap();
    let t0 = Instant::now();
    let first = analyzer.analyze_viewport(t0).unwrap();

    analyzer.surface_mut().set_viewport(1920.0, 1080.0);
    let second = analyzer
        .analyze_viewport(t0 + Duration::from_millis(20))
        .unwrap();
    assert_ne!(first, second);
    assert_eq!(analyzer.stats().queued_updates, 1);

    analyzer.surface_mut().reject_writes(true);
    analyzer.tick(t0 + Duration::from_millis(150));

    let stats = analyzer.stats();
    assert_eq!(stats.queued_updates, 0);
    assert_eq!(stats.history_len, 1);
    let previous = analyzer.state().unwrap().get_previous_state().unwrap();
    assert_eq!(previous.configuration, first);
    assert_eq!(analyzer.current_configuration(), Some(Arc::clone(&first)));
    assert_eq!(
        analyzer.surface().element_rect(&id("board")),
        Some(first.board())
    );
}

#[test]
fn visibility_callbacks_can_be_registered_after_initialize() {
    let mut analyzer = analyzer(1);
    assert!(analyzer
        .on_visibility_change(Box::new(|_, _| {}))
        .is_none());
    analyzer.initialize().unwrap();
    assert!(analyzer
        .on_visibility_change(Box::new(|_, _| {}))
        .is_some());
}
