//! # folio-texts
//!
//! Visibility-driven lazy loading of localized texts for component UIs.
//!
//! Every text-bearing component registers with one [`TextLoadCoordinator`].
//! The coordinator fetches a component's text only once it scrolls within a
//! buffer margin of the viewport, never fetches the same component twice
//! concurrently, and refetches after a language change.
//!
//! ## Architecture
//!
//! ```text
//! ViewportEvents (scroll/resize) → Debounced refresh → TextLoadCoordinator
//!     → GeometryOracle (per component) → TextComponent::update_texts
//!     → backend fetch → TextLoadCoordinator::text_loaded
//! ```
//!
//! Everything is single-threaded. The host drives deferred work by calling
//! [`Scheduler::tick`] once per frame.
//!
//! ## Modules
//!
//! - [`types`] - Rect, ViewportSize, BufferFactors
//! - [`geometry`] - `is_into_view` and the `GeometryOracle` seam
//! - [`viewport`] - Scroll/resize broadcast bridge, crossterm source
//! - [`scheduler`] - Frame-driven deferred tasks and debouncing
//! - [`component`] - The `TextComponent` contract
//! - [`coordinator`] - The load state machine
//! - [`language`] - Active language selection
//! - [`texts`] - Text backends, catalog, `LocalizedText` component
//! - [`config`] - Coordinator configuration (TOML)

pub mod component;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod geometry;
pub mod language;
pub mod scheduler;
pub mod texts;
pub mod types;
pub mod viewport;

// Re-export commonly used items
pub use types::*;

pub use component::{ComponentHandle, ComponentKey, TextComponent};
pub use config::CoordinatorConfig;
pub use coordinator::{ComponentState, TextLoadCoordinator, Trigger, WeakCoordinator};
pub use error::{Error, Result};
pub use geometry::{is_into_view, FixedViewport, GeometryOracle, ViewportGeometry};
pub use language::LanguageSelector;
pub use scheduler::{debounce, Debounced, Scheduler};
pub use texts::{
    CatalogBackend, LocalizedText, Placement, TextBackend, TextBundle, TextCatalog, TextRequest,
};
pub use viewport::{ExecutionContext, ScrollTracker, ViewportEvents};
