//! Layout optimizer benchmarks.
//!
//! A full analysis must finish well inside the 100 ms resize budget; the
//! optimizer is the dominant cost of a pass.
//!
//! Run with: cargo bench --bench optimizer_benchmark

#![allow(missing_docs)] // criterion macros generate undocumented items

use boardfit::layout::LayoutOptimizer;
use boardfit::model::{
    AnalysisResult, ElementId, ElementSpec, GroupId, Rect, UiElement, ViewportDimensions,
};
use boardfit::surface::MemorySurface;
use boardfit::visibility::VisibilityDetector;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

/// Viewports covering the supported range.
const VIEWPORTS: [(f64, f64); 4] = [
    (400.0, 700.0),
    (1280.0, 720.0),
    (1920.0, 1080.0),
    (3840.0, 2160.0),
];

fn elements(count: usize) -> Vec<UiElement> {
    let toolbar = GroupId::new("toolbar").unwrap();
    (0..count)
        .map(|i| {
            let id = ElementId::new(format!("element-{i}")).unwrap();
            let spec = if i % 3 == 0 {
                ElementSpec::grouped(id, toolbar.clone(), i as u32)
            } else {
                ElementSpec::new(id)
            };
            UiElement::new(
                spec,
                Rect::new(100.0 + i as f64 * 150.0, 40.0 + i as f64 * 30.0, 180.0, 90.0),
            )
        })
        .collect()
}

fn benchmark_calculate_optimal_layout(c: &mut Criterion) {
    let optimizer = LayoutOptimizer::default();
    let mut group = c.benchmark_group("calculate_optimal_layout");

    for (width, height) in VIEWPORTS {
        for count in [0, 5, 15] {
            let input = AnalysisResult::new(
                ViewportDimensions::new(width, height).unwrap(),
                elements(count),
            );
            group.bench_with_input(
                BenchmarkId::new(format!("{width}x{height}"), count),
                &input,
                |b, input| b.iter(|| optimizer.calculate_optimal_layout(black_box(input))),
            );
        }
    }
    group.finish();
}

fn benchmark_visibility_refresh(c: &mut Criterion) {
    let mut group = c.benchmark_group("visibility_refresh");

    for count in [15, 100, 1000] {
        let mut surface = MemorySurface::new(1920.0, 1080.0);
        let mut detector = VisibilityDetector::default();
        for element in elements(count) {
            surface.insert_element(element.id().clone(), element.rect);
            detector.observe(&surface, element.id().clone());
        }
        group.bench_with_input(BenchmarkId::from_parameter(count), &surface, |b, surface| {
            b.iter(|| detector.refresh(black_box(surface)))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    benchmark_calculate_optimal_layout,
    benchmark_visibility_refresh
);
criterion_main!(benches);
