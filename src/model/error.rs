//! Error types for boardfit.
//!
//! This module defines the error taxonomy using `thiserror`. Errors compose via
//! `?` and `From` conversions into the top-level [`LayoutError`].
//!
//! # Error Hierarchy
//!
//! - [`LayoutError`] - Top-level error wrapping every failure mode
//!   - [`ValidationError`] - Malformed geometry, viewport, or layout output
//!   - [`InitializationError`] - Sub-component construction failures
//!   - [`AnalysisError`] - Failures inside the optimize/apply pipeline
//!   - [`SurfaceError`] - Rejections from the host render surface
//!
//! # Recovery Strategy
//!
//! Validation and analysis errors are fatal to the call that raised them but not
//! to the analyzer: it records the error, keeps the last valid layout on screen,
//! and returns `None`. Initialization errors propagate to the caller of
//! `initialize()` unrecovered, since no prior valid state exists yet.
//!
//! A dimension-cache miss is a normal, counted event and never an error; see
//! [`crate::state::CacheLookup`].

use super::identifiers::{ContainerId, ElementId, EmptyIdentifier, GroupId};
use thiserror::Error;

/// Top-level error encompassing all failure modes.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// Input or output geometry failed validation.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The analyzer could not be initialized.
    #[error("Initialization failed: {0}")]
    Initialization(#[from] InitializationError),

    /// A pipeline stage failed.
    #[error("Analysis failed: {0}")]
    Analysis(#[from] AnalysisError),

    /// The host surface rejected an operation.
    #[error("Surface error: {0}")]
    Surface(#[from] SurfaceError),
}

/// Malformed geometry, configuration, or layout output.
///
/// Fatal to the call that raised it. Every variant carries the offending
/// values so logs can pinpoint the element.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Viewport width or height is NaN or infinite.
    #[error("Viewport dimensions must be finite (got {width}x{height})")]
    NonFiniteViewport {
        /// Offending width.
        width: f64,
        /// Offending height.
        height: f64,
    },

    /// Viewport width or height is zero or negative.
    #[error("Viewport dimensions must be positive (got {width}x{height})")]
    NonPositiveViewport {
        /// Offending width.
        width: f64,
        /// Offending height.
        height: f64,
    },

    /// A rectangle component is NaN or infinite.
    #[error("Geometry of '{element}' is not finite")]
    NonFiniteGeometry {
        /// Element name (`board` for the board).
        element: String,
    },

    /// A rectangle has zero or negative width/height.
    #[error("Size of '{element}' must be positive (got {width}x{height})")]
    NonPositiveSize {
        /// Element name.
        element: String,
        /// Offending width.
        width: f64,
        /// Offending height.
        height: f64,
    },

    /// A rectangle has a negative origin.
    #[error("Position of '{element}' must be non-negative (got {x},{y})")]
    NegativePosition {
        /// Element name.
        element: String,
        /// Offending x.
        x: f64,
        /// Offending y.
        y: f64,
    },

    /// Board is below the minimum size.
    #[error("Board size {size} is below the minimum {minimum}")]
    BoardTooSmall {
        /// Actual edge length.
        size: f64,
        /// Required minimum edge length.
        minimum: f64,
    },

    /// Board width and height differ.
    #[error("Board must be square (got {width}x{height})")]
    BoardNotSquare {
        /// Board width.
        width: f64,
        /// Board height.
        height: f64,
    },

    /// Board rectangle extends past the viewport.
    #[error("Board does not fit inside the viewport")]
    BoardOutsideViewport,

    /// Two placed elements are closer than the minimum spacing.
    #[error("'{first}' and '{second}' are {gap}px apart (minimum {minimum}px)")]
    SpacingViolation {
        /// First element.
        first: ElementId,
        /// Second element.
        second: ElementId,
        /// Measured gap (negative on overlap).
        gap: f64,
        /// Required spacing after tolerance.
        minimum: f64,
    },

    /// Consecutive group members are further apart than the grouping tolerance.
    #[error("Group '{group}' members are {gap}px apart (tolerance {tolerance}px)")]
    GroupNotAdjacent {
        /// Offending group.
        group: GroupId,
        /// Measured gap.
        gap: f64,
        /// Grouping tolerance.
        tolerance: f64,
    },

    /// Stacking order of a group does not follow its order indices.
    #[error("Group '{group}' stacking order does not match its order indices")]
    GroupOrderViolated {
        /// Offending group.
        group: GroupId,
    },

    /// Group is spread over too much space relative to its members' size.
    #[error("Group '{group}' spread ratio {ratio:.2} exceeds {ceiling}")]
    GroupSpreadExceeded {
        /// Offending group.
        group: GroupId,
        /// Measured spread ratio.
        ratio: f64,
        /// Configured ceiling.
        ceiling: f64,
    },

    /// An identifier string was empty.
    #[error(transparent)]
    EmptyIdentifier(#[from] EmptyIdentifier),
}

/// Failures while constructing analyzer sub-components.
#[derive(Debug, Error)]
pub enum InitializationError {
    /// `initialize()` was called after `destroy()`.
    #[error("Analyzer has been destroyed")]
    Destroyed,

    /// Layout settings are unusable.
    #[error("Invalid setting '{field}': {reason}")]
    InvalidSettings {
        /// Name of the rejected setting.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// Subscribing to resize/orientation signals failed.
    #[error("Failed to subscribe to viewport signals: {0}")]
    Subscription(#[source] SurfaceError),
}

/// Failures inside the optimize/apply pipeline.
///
/// Caught by the analyzer, logged, and counted in its error stats.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// `analyze_viewport()` was called before `initialize()`.
    #[error("Analyzer is not initialized")]
    NotInitialized,

    /// A named pipeline stage failed.
    #[error("Stage '{stage}' failed: {source}")]
    Stage {
        /// Stage name (`measure`, `optimize`, `overflow`, `apply`).
        stage: &'static str,
        /// Underlying failure.
        #[source]
        source: Box<LayoutError>,
    },
}

impl AnalysisError {
    /// Wrap a failure of `stage`.
    pub fn stage(stage: &'static str, source: impl Into<LayoutError>) -> Self {
        Self::Stage {
            stage,
            source: Box::new(source.into()),
        }
    }
}

/// Rejections from the host render surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurfaceError {
    /// The surface does not know this element.
    #[error("Unknown element '{0}'")]
    UnknownElement(ElementId),

    /// The surface refused a write.
    #[error("Write to '{element}' rejected: {reason}")]
    Rejected {
        /// Target element.
        element: ElementId,
        /// Host-provided reason.
        reason: String,
    },

    /// The surface refused a scroll region update.
    #[error("Scroll region for {container} rejected: {reason}")]
    ScrollRegionRejected {
        /// Target container.
        container: ContainerId,
        /// Host-provided reason.
        reason: String,
    },

    /// Signal subscription could not be established.
    #[error("Signal subscription failed: {0}")]
    Subscription(String),
}
