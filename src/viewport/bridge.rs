//! Viewport Bridge - Scroll and resize broadcast streams
//!
//! One bridge per viewport. The host feeds it raw events through
//! `emit_scroll` / `emit_resize`; every registered listener receives each
//! event exactly once. There is no replay: a listener registered after an
//! event never sees it.
//!
//! # API
//!
//! - `on_scroll(fn)` - Subscribe to scroll offsets
//! - `on_resize(fn)` - Subscribe to viewport sizes
//! - `emit_scroll` / `emit_resize` - Feed events (no-op when headless)
//! - `scroll_offset` / `size` - Latest values (reactive signals)
//!
//! # Example
//!
//! ```ignore
//! use folio_texts::viewport::ViewportEvents;
//!
//! let viewport = ViewportEvents::detect();
//! let cleanup = viewport.on_scroll(|offset| {
//!     println!("scrolled to {offset}");
//! });
//!
//! // ... later
//! cleanup();
//! ```

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use spark_signals::{signal, Signal};

use crate::types::ViewportSize;

// =============================================================================
// TYPES
// =============================================================================

/// Whether a real viewport exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionContext {
    /// A live viewport that produces scroll and resize events.
    Interactive,
    /// Pre-rendering or any run without a viewport. Streams stay silent.
    Headless,
}

type ScrollHandler = Rc<dyn Fn(f64)>;
type ResizeHandler = Rc<dyn Fn(ViewportSize)>;

// =============================================================================
// HANDLER REGISTRY
// =============================================================================

struct HandlerRegistry {
    scroll_handlers: Vec<(usize, ScrollHandler)>,
    resize_handlers: Vec<(usize, ResizeHandler)>,
    next_id: usize,
}

impl HandlerRegistry {
    fn new() -> Self {
        Self {
            scroll_handlers: Vec::new(),
            resize_handlers: Vec::new(),
            next_id: 0,
        }
    }

    fn next_id(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

struct BridgeInner {
    context: ExecutionContext,
    scroll_offset: Signal<f64>,
    size: Signal<ViewportSize>,
    handlers: RefCell<HandlerRegistry>,
}

// =============================================================================
// VIEWPORT EVENTS
// =============================================================================

/// Hot scroll/resize streams for one viewport.
///
/// Cloning yields another handle to the same bridge.
#[derive(Clone)]
pub struct ViewportEvents {
    inner: Rc<BridgeInner>,
}

impl ViewportEvents {
    fn with_context(context: ExecutionContext, size: ViewportSize) -> Self {
        Self {
            inner: Rc::new(BridgeInner {
                context,
                scroll_offset: signal(0.0),
                size: signal(size),
                handlers: RefCell::new(HandlerRegistry::new()),
            }),
        }
    }

    /// Bridge for a live viewport of the given initial size.
    pub fn interactive(size: ViewportSize) -> Self {
        Self::with_context(ExecutionContext::Interactive, size)
    }

    /// Inert bridge: accepts listeners, never emits.
    pub fn headless() -> Self {
        Self::with_context(ExecutionContext::Headless, ViewportSize::default())
    }

    /// Bridge for the current process: interactive on a terminal, headless otherwise.
    pub fn detect() -> Self {
        match super::terminal::detect_terminal_size() {
            Some(size) => Self::interactive(size),
            None => Self::headless(),
        }
    }

    pub fn context(&self) -> ExecutionContext {
        self.inner.context
    }

    pub fn is_interactive(&self) -> bool {
        self.inner.context == ExecutionContext::Interactive
    }

    /// Latest vertical scroll offset.
    pub fn scroll_offset(&self) -> f64 {
        self.inner.scroll_offset.get()
    }

    /// Latest viewport size.
    pub fn size(&self) -> ViewportSize {
        self.inner.size.get()
    }

    /// Scroll offset signal for reactive tracking.
    pub fn scroll_offset_signal(&self) -> Signal<f64> {
        self.inner.scroll_offset.clone()
    }

    /// Viewport size signal for reactive tracking.
    pub fn size_signal(&self) -> Signal<ViewportSize> {
        self.inner.size.clone()
    }

    // -------------------------------------------------------------------------
    // Subscriptions
    // -------------------------------------------------------------------------

    /// Subscribe to scroll events. Returns cleanup function.
    pub fn on_scroll<F>(&self, handler: F) -> Box<dyn FnOnce()>
    where
        F: Fn(f64) + 'static,
    {
        let id = {
            let mut reg = self.inner.handlers.borrow_mut();
            let id = reg.next_id();
            reg.scroll_handlers.push((id, Rc::new(handler)));
            id
        };

        let weak = Rc::downgrade(&self.inner);
        Box::new(move || {
            if let Some(inner) = Weak::upgrade(&weak) {
                inner
                    .handlers
                    .borrow_mut()
                    .scroll_handlers
                    .retain(|(handler_id, _)| *handler_id != id);
            }
        })
    }

    /// Subscribe to resize events. Returns cleanup function.
    pub fn on_resize<F>(&self, handler: F) -> Box<dyn FnOnce()>
    where
        F: Fn(ViewportSize) + 'static,
    {
        let id = {
            let mut reg = self.inner.handlers.borrow_mut();
            let id = reg.next_id();
            reg.resize_handlers.push((id, Rc::new(handler)));
            id
        };

        let weak = Rc::downgrade(&self.inner);
        Box::new(move || {
            if let Some(inner) = Weak::upgrade(&weak) {
                inner
                    .handlers
                    .borrow_mut()
                    .resize_handlers
                    .retain(|(handler_id, _)| *handler_id != id);
            }
        })
    }

    pub fn scroll_listener_count(&self) -> usize {
        self.inner.handlers.borrow().scroll_handlers.len()
    }

    pub fn resize_listener_count(&self) -> usize {
        self.inner.handlers.borrow().resize_handlers.len()
    }

    // -------------------------------------------------------------------------
    // Emission
    // -------------------------------------------------------------------------

    /// Broadcast a scroll event. Does nothing when headless.
    pub fn emit_scroll(&self, offset: f64) {
        if !self.is_interactive() {
            return;
        }
        self.inner.scroll_offset.set(offset);

        // Snapshot so handlers may (un)subscribe while being called
        let handlers: Vec<ScrollHandler> = self
            .inner
            .handlers
            .borrow()
            .scroll_handlers
            .iter()
            .map(|(_, handler)| handler.clone())
            .collect();
        for handler in handlers {
            handler(offset);
        }
    }

    /// Broadcast a resize event. Does nothing when headless.
    pub fn emit_resize(&self, size: ViewportSize) {
        if !self.is_interactive() {
            return;
        }
        self.inner.size.set(size);

        let handlers: Vec<ResizeHandler> = self
            .inner
            .handlers
            .borrow()
            .resize_handlers
            .iter()
            .map(|(_, handler)| handler.clone())
            .collect();
        for handler in handlers {
            handler(size);
        }
    }
}
