//! Geometry oracle - decides whether an element is "into view".
//!
//! The visible window is the viewport grown by a buffer margin on every side,
//! so content starts loading shortly before it scrolls on screen.

use crate::types::{BufferFactors, Rect, ViewportSize};
use crate::viewport::ViewportEvents;

/// Check whether `element` intersects the viewport expanded by `buffer`.
///
/// Returns `false` for a missing element. Bounds are inclusive, so a
/// zero-area rect sitting on the window edge still counts as visible.
/// Comparisons involving NaN are false, which makes a corrupt rect invisible.
pub fn is_into_view(element: Option<&Rect>, viewport: ViewportSize, buffer: BufferFactors) -> bool {
    let Some(rect) = element else {
        return false;
    };

    let (buffer_height, buffer_width) = buffer.margins(viewport);

    let vertical = rect.bottom >= -buffer_height && rect.top <= viewport.height + buffer_height;
    let horizontal = rect.right >= -buffer_width && rect.left <= viewport.width + buffer_width;

    vertical && horizontal
}

// =============================================================================
// Oracle
// =============================================================================

/// Answers visibility questions for the coordinator.
///
/// The viewport dimensions are the oracle's business; callers only supply the
/// element and the margin.
pub trait GeometryOracle {
    fn is_into_view(&self, element: Option<Rect>, buffer: BufferFactors) -> bool;
}

/// Oracle backed by the live viewport of a [`ViewportEvents`] bridge.
///
/// In a headless context there is no viewport, so nothing is ever visible.
#[derive(Clone)]
pub struct ViewportGeometry {
    viewport: ViewportEvents,
}

impl ViewportGeometry {
    pub fn new(viewport: &ViewportEvents) -> Self {
        Self { viewport: viewport.clone() }
    }
}

impl GeometryOracle for ViewportGeometry {
    fn is_into_view(&self, element: Option<Rect>, buffer: BufferFactors) -> bool {
        if !self.viewport.is_interactive() {
            return false;
        }
        is_into_view(element.as_ref(), self.viewport.size(), buffer)
    }
}

/// Oracle over a fixed viewport size. Handy for pre-computed layouts and tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedViewport(pub ViewportSize);

impl GeometryOracle for FixedViewport {
    fn is_into_view(&self, element: Option<Rect>, buffer: BufferFactors) -> bool {
        is_into_view(element.as_ref(), self.0, buffer)
    }
}
