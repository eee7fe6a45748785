//! Domain model types (pure).
//!
//! All types in this module are plain data with smart constructors.

pub mod element;
pub mod error;
pub mod geometry;
pub mod identifiers;

pub use element::{AnalysisResult, ElementSpec, UiElement};
pub use error::{
    AnalysisError, InitializationError, LayoutError, SurfaceError, ValidationError,
};
pub use geometry::{Rect, ViewportDimensions};
pub use identifiers::{ContainerId, ElementId, EmptyIdentifier, GroupId};
