//! Core types shared by the geometry, viewport and coordinator modules.

use serde::Deserialize;

// =============================================================================
// Rect
// =============================================================================

/// Bounding box of an element, relative to the viewport's top-left corner.
///
/// Coordinates grow right and down. A rect above the viewport has a
/// negative `bottom`; one below it has `top > viewport height`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
}

impl Rect {
    pub const fn new(top: f64, left: f64, bottom: f64, right: f64) -> Self {
        Self { top, left, bottom, right }
    }

    /// Create a rect from an origin and a size.
    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            top: y,
            left: x,
            bottom: y + height,
            right: x + width,
        }
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    /// True for zero-area (or inverted) rects.
    pub fn is_empty(&self) -> bool {
        !(self.width() > 0.0 && self.height() > 0.0)
    }

    /// Shift the rect, e.g. from document to viewport coordinates.
    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        Self {
            top: self.top + dy,
            left: self.left + dx,
            bottom: self.bottom + dy,
            right: self.right + dx,
        }
    }
}

// =============================================================================
// ViewportSize
// =============================================================================

/// Viewport dimensions (pixels in a browser, cells in a terminal).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewportSize {
    pub width: f64,
    pub height: f64,
}

impl ViewportSize {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl From<(u16, u16)> for ViewportSize {
    fn from((width, height): (u16, u16)) -> Self {
        Self::new(width as f64, height as f64)
    }
}

// =============================================================================
// BufferFactors
// =============================================================================

/// How far beyond the literal viewport an element still counts as visible.
///
/// Each factor is a fraction of the matching viewport dimension, applied on
/// both sides of that axis: `height = 0.5` extends the window by half a
/// viewport above and half a viewport below.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BufferFactors {
    pub height: f64,
    pub width: f64,
}

impl BufferFactors {
    /// Default margin: prefetch half a screen vertically, a quarter horizontally.
    pub const PREFETCH: Self = Self { height: 0.5, width: 0.25 };

    /// Wide margin: two screens vertically, one horizontally.
    pub const EAGER: Self = Self { height: 2.0, width: 1.0 };

    /// No margin at all: only what is literally on screen.
    pub const NONE: Self = Self { height: 0.0, width: 0.0 };

    pub const fn new(height: f64, width: f64) -> Self {
        Self { height, width }
    }

    /// Margin in viewport units for the given viewport: (vertical, horizontal).
    pub fn margins(&self, viewport: ViewportSize) -> (f64, f64) {
        (self.height * viewport.height, self.width * viewport.width)
    }
}

impl Default for BufferFactors {
    fn default() -> Self {
        Self::PREFETCH
    }
}
