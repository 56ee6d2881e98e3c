//! Terminal viewport source
//!
//! Drives a [`ViewportEvents`] bridge from crossterm input: terminal resizes
//! become resize events, mouse wheel and scroll keys move a clamped scroll
//! offset and become scroll events.
//!
//! # Example
//!
//! ```ignore
//! use folio_texts::viewport::{terminal, ScrollTracker, ViewportEvents};
//! use std::time::Duration;
//!
//! let viewport = ViewportEvents::detect();
//! let mut tracker = ScrollTracker::new(viewport.size().height, 400.0);
//! loop {
//!     if let Ok(Some(event)) = terminal::poll_event(Duration::from_millis(16)) {
//!         terminal::route_event(&viewport, &mut tracker, &event);
//!     }
//! }
//! ```

use std::io::{stdout, IsTerminal};
use std::time::Duration;

use crossterm::event::{
    poll, read, DisableMouseCapture, EnableMouseCapture, Event as CrosstermEvent, KeyCode,
    KeyEvent as CrosstermKeyEvent, KeyEventKind, MouseEvent as CrosstermMouseEvent,
    MouseEventKind,
};
use crossterm::execute;

use super::ViewportEvents;
use crate::types::ViewportSize;

// =============================================================================
// SCROLL CONSTANTS
// =============================================================================

/// Default scroll amount for arrow keys (lines).
pub const LINE_SCROLL: u16 = 1;

/// Default scroll amount for mouse wheel.
pub const WHEEL_SCROLL: u16 = 3;

/// Default scroll amount for Page Up/Down (90% of viewport).
pub const PAGE_SCROLL_FACTOR: f32 = 0.9;

// =============================================================================
// DETECTION
// =============================================================================

/// Terminal size if stdout is an interactive terminal, `None` otherwise.
pub fn detect_terminal_size() -> Option<ViewportSize> {
    if !stdout().is_terminal() {
        return None;
    }
    crossterm::terminal::size().ok().map(ViewportSize::from)
}

// =============================================================================
// SCROLL TRACKER
// =============================================================================

/// Vertical scroll position of a document inside the terminal viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollTracker {
    offset: f64,
    viewport_height: f64,
    content_height: f64,
}

impl ScrollTracker {
    pub fn new(viewport_height: f64, content_height: f64) -> Self {
        Self {
            offset: 0.0,
            viewport_height,
            content_height,
        }
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Largest valid offset.
    pub fn max_offset(&self) -> f64 {
        (self.content_height - self.viewport_height).max(0.0)
    }

    /// Scroll by a delta. Returns `true` if the offset changed.
    pub fn scroll_by(&mut self, delta: f64) -> bool {
        self.scroll_to(self.offset + delta)
    }

    /// Scroll to an absolute offset (clamped). Returns `true` if it changed.
    pub fn scroll_to(&mut self, offset: f64) -> bool {
        let clamped = offset.clamp(0.0, self.max_offset());
        if clamped == self.offset {
            return false;
        }
        self.offset = clamped;
        true
    }

    /// Page size in lines.
    pub fn page(&self) -> f64 {
        (self.viewport_height * PAGE_SCROLL_FACTOR as f64).round().max(1.0)
    }

    /// Update the viewport height, re-clamping the offset.
    /// Returns `true` if the offset moved as a result.
    pub fn set_viewport_height(&mut self, height: f64) -> bool {
        self.viewport_height = height;
        self.scroll_to(self.offset)
    }

    pub fn set_content_height(&mut self, height: f64) -> bool {
        self.content_height = height;
        self.scroll_to(self.offset)
    }
}

// =============================================================================
// EVENT ROUTING
// =============================================================================

/// Feed one crossterm event into the bridge.
///
/// Returns `true` if the event produced a scroll or resize emission.
pub fn route_event(viewport: &ViewportEvents, tracker: &mut ScrollTracker, event: &CrosstermEvent) -> bool {
    match event {
        CrosstermEvent::Resize(width, height) => {
            let size = ViewportSize::from((*width, *height));
            let moved = tracker.set_viewport_height(size.height);
            viewport.emit_resize(size);
            if moved {
                viewport.emit_scroll(tracker.offset());
            }
            true
        }
        CrosstermEvent::Mouse(mouse) => route_scroll(viewport, tracker, mouse_scroll_delta(mouse)),
        CrosstermEvent::Key(key) => {
            let delta = key_scroll_delta(key, tracker);
            route_scroll(viewport, tracker, delta)
        }
        _ => false,
    }
}

fn route_scroll(viewport: &ViewportEvents, tracker: &mut ScrollTracker, delta: Option<f64>) -> bool {
    let Some(delta) = delta else {
        return false;
    };
    if !tracker.scroll_by(delta) {
        return false;
    }
    viewport.emit_scroll(tracker.offset());
    true
}

/// Scroll delta for a mouse wheel event, in lines.
pub fn mouse_scroll_delta(event: &CrosstermMouseEvent) -> Option<f64> {
    match event.kind {
        MouseEventKind::ScrollDown => Some(WHEEL_SCROLL as f64),
        MouseEventKind::ScrollUp => Some(-(WHEEL_SCROLL as f64)),
        _ => None,
    }
}

/// Scroll delta for a navigation key press, in lines.
pub fn key_scroll_delta(event: &CrosstermKeyEvent, tracker: &ScrollTracker) -> Option<f64> {
    if event.kind == KeyEventKind::Release {
        return None;
    }
    match event.code {
        KeyCode::Down | KeyCode::Char('j') => Some(LINE_SCROLL as f64),
        KeyCode::Up | KeyCode::Char('k') => Some(-(LINE_SCROLL as f64)),
        KeyCode::PageDown | KeyCode::Char(' ') => Some(tracker.page()),
        KeyCode::PageUp => Some(-tracker.page()),
        KeyCode::Home => Some(-tracker.offset()),
        KeyCode::End => Some(tracker.max_offset() - tracker.offset()),
        _ => None,
    }
}

// =============================================================================
// EVENT POLLING
// =============================================================================

/// Poll for an event with timeout.
/// Returns None if no event within timeout.
pub fn poll_event(timeout: Duration) -> std::io::Result<Option<CrosstermEvent>> {
    if poll(timeout)? {
        Ok(Some(read()?))
    } else {
        Ok(None)
    }
}

/// Enable mouse capture.
pub fn enable_mouse() -> std::io::Result<()> {
    execute!(stdout(), EnableMouseCapture)
}

/// Disable mouse capture.
pub fn disable_mouse() -> std::io::Result<()> {
    execute!(stdout(), DisableMouseCapture)
}

// =============================================================================
// TESTS
// =============================================================================
