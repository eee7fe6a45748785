//! Layout analysis and optimization.
//!
//! # Module Structure
//!
//! - `configuration`: LayoutConfiguration - immutable result of one pass
//! - `optimizer`: LayoutOptimizer - board-first greedy allocation
//! - `validate`: validate_layout - invariants every published layout satisfies

pub mod configuration;
pub mod optimizer;
pub mod validate;

pub use configuration::{
    AnalysisSummary, BoardDimensions, ElementPlacement, LayoutConfiguration, LayoutRegion,
    LayoutStrategy, ScrollBounds, ScrollRequirement,
};
pub use optimizer::{LayoutOptimizer, OptimizerSettings};
pub use validate::validate_layout;
