//! Viewport event bridge
//!
//! Turns raw viewport events (scroll, resize) into two hot broadcast streams.
//!
//! - [`bridge`] - `ViewportEvents`: handler registry, fan-out, inert headless mode
//! - [`terminal`] - crossterm-backed event source for interactive terminals

pub mod bridge;
pub mod terminal;

pub use bridge::{ExecutionContext, ViewportEvents};
pub use terminal::{ScrollTracker, LINE_SCROLL, PAGE_SCROLL_FACTOR, WHEEL_SCROLL};
