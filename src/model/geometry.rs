//! Geometry primitives in device-independent pixels.

use super::error::ValidationError;
use serde::{Deserialize, Serialize};

/// Smallest supported viewport width.
pub const MIN_VIEWPORT_WIDTH: f64 = 320.0;
/// Largest supported viewport width.
pub const MAX_VIEWPORT_WIDTH: f64 = 3840.0;
/// Smallest supported viewport height.
pub const MIN_VIEWPORT_HEIGHT: f64 = 480.0;
/// Largest supported viewport height.
pub const MAX_VIEWPORT_HEIGHT: f64 = 2160.0;

/// Axis-aligned rectangle.
///
/// Coordinates may be negative (elements dragged off-screen); sizes may be
/// zero for degenerate elements.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl Rect {
    /// Create a new rectangle.
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge (`x + width`).
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge (`y + height`).
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// All four components are finite (no NaN, no infinity).
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }

    /// True when `other` lies entirely inside `self`.
    pub fn contains(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Smallest rectangle covering both.
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::new(x, y, right - x, bottom - y)
    }

    /// Separation between two rectangles.
    ///
    /// The larger of the horizontal and vertical gaps. Negative when the
    /// rectangles overlap on both axes.
    pub fn gap_to(&self, other: &Rect) -> f64 {
        let dx = (other.x - self.right()).max(self.x - other.right());
        let dy = (other.y - self.bottom()).max(self.y - other.bottom());
        dx.max(dy)
    }

    /// Largest per-component absolute difference.
    pub fn max_deviation(&self, other: &Rect) -> f64 {
        (self.x - other.x)
            .abs()
            .max((self.y - other.y).abs())
            .max((self.width - other.width).abs())
            .max((self.height - other.height).abs())
    }

    /// Snap every component to whole pixels.
    pub fn rounded(&self) -> Rect {
        Rect::new(
            self.x.round(),
            self.y.round(),
            self.width.round(),
            self.height.round(),
        )
    }
}

/// Validated viewport size.
///
/// # Invariants
/// - Both dimensions are finite and strictly positive.
///
/// Dimensions outside the supported range are accepted (the layout then
/// reports `requires_scrolling`); see [`ViewportDimensions::is_supported`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewportDimensions {
    width: f64,
    height: f64,
}

impl ViewportDimensions {
    /// Smart constructor rejecting NaN, infinite, zero, or negative sizes.
    pub fn new(width: f64, height: f64) -> Result<Self, ValidationError> {
        if !width.is_finite() || !height.is_finite() {
            return Err(ValidationError::NonFiniteViewport { width, height });
        }
        if width <= 0.0 || height <= 0.0 {
            return Err(ValidationError::NonPositiveViewport { width, height });
        }
        Ok(Self { width, height })
    }

    /// Width in pixels.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Width over height.
    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }

    /// Within `[320, 3840] x [480, 2160]`.
    pub fn is_supported(&self) -> bool {
        (MIN_VIEWPORT_WIDTH..=MAX_VIEWPORT_WIDTH).contains(&self.width)
            && (MIN_VIEWPORT_HEIGHT..=MAX_VIEWPORT_HEIGHT).contains(&self.height)
    }

    /// Viewport as a rectangle anchored at the origin.
    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    /// Largest change along either axis.
    pub fn delta(&self, other: &ViewportDimensions) -> f64 {
        (self.width - other.width)
            .abs()
            .max((self.height - other.height).abs())
    }
}
