//! Boardfit: adaptive board layout engine
//!
//! Keeps a square "board" element fully visible and above a minimum size
//! while overlay elements around it are relocated, scrolled, or regrouped as
//! the viewport changes.
//!
//! The crate is a pure core behind the [`surface::RenderSurface`] boundary:
//! the host supplies element geometry, viewport size, and time, and receives
//! geometry writes and scroll decoration back. [`analyzer::ViewportAnalyzer`]
//! is the entry point.

pub mod analyzer;
pub mod config;
pub mod layout;
pub mod logging;
pub mod model;
pub mod overflow;
pub mod state;
pub mod surface;
pub mod update;
pub mod visibility;

pub use analyzer::{AnalyzerStats, ViewportAnalyzer};
pub use config::LayoutSettings;
pub use layout::{AnalysisSummary, LayoutConfiguration, LayoutOptimizer, LayoutStrategy};
pub use model::{ElementId, ElementSpec, GroupId, LayoutError, Rect, ViewportDimensions};
pub use surface::{MemorySurface, RenderSurface};
