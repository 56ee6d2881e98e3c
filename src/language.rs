//! Language selection.
//!
//! Holds the active language and tells the coordinator when it changes.
//! The coordinator never learns which language is active; components read it
//! from the selector when they fetch.

use std::rc::Rc;

use spark_signals::{signal, Signal};
use tracing::info;

use crate::coordinator::{TextLoadCoordinator, WeakCoordinator};
use crate::error::{Error, Result};

struct SelectorInner {
    supported: Vec<String>,
    current: Signal<String>,
    coordinator: WeakCoordinator,
}

/// Active language plus the set of languages texts exist for.
///
/// Cloning yields another handle to the same selection.
#[derive(Clone)]
pub struct LanguageSelector {
    inner: Rc<SelectorInner>,
}

impl LanguageSelector {
    /// Create a selector. `initial` must be one of `supported`.
    pub fn new<I, S>(coordinator: &TextLoadCoordinator, supported: I, initial: &str) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let supported: Vec<String> = supported.into_iter().map(Into::into).collect();
        if !supported.iter().any(|code| code == initial) {
            return Err(Error::UnsupportedLanguage(initial.to_string()));
        }
        Ok(Self {
            inner: Rc::new(SelectorInner {
                supported,
                current: signal(initial.to_string()),
                coordinator: coordinator.downgrade(),
            }),
        })
    }

    /// Active language code.
    pub fn current(&self) -> String {
        self.inner.current.get()
    }

    /// Active language signal for reactive tracking.
    pub fn current_signal(&self) -> Signal<String> {
        self.inner.current.clone()
    }

    pub fn supported(&self) -> &[String] {
        &self.inner.supported
    }

    pub fn is_supported(&self, code: &str) -> bool {
        self.inner.supported.iter().any(|supported| supported == code)
    }

    /// Switch language.
    ///
    /// Returns `Ok(false)` if `code` is already active (nothing is
    /// refetched), `Ok(true)` after notifying the coordinator.
    pub fn set_language(&self, code: &str) -> Result<bool> {
        if !self.is_supported(code) {
            return Err(Error::UnsupportedLanguage(code.to_string()));
        }
        if self.current() == code {
            return Ok(false);
        }

        info!(from = %self.current(), to = code, "switching language");
        self.inner.current.set(code.to_string());
        if let Some(coordinator) = self.inner.coordinator.upgrade() {
            coordinator.language_change();
        }
        Ok(true)
    }

    /// Switch to the next supported language, wrapping around.
    pub fn cycle(&self) -> Result<String> {
        let current = self.current();
        let index = self
            .inner
            .supported
            .iter()
            .position(|code| *code == current)
            .unwrap_or(0);
        let next = self.inner.supported[(index + 1) % self.inner.supported.len()].clone();
        self.set_language(&next)?;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::TextComponent;
    use crate::config::CoordinatorConfig;
    use crate::geometry::FixedViewport;
    use crate::scheduler::Scheduler;
    use crate::types::{Rect, ViewportSize};
    use crate::viewport::ViewportEvents;
    use std::cell::Cell;
    use std::time::Instant;

    struct Counter(Cell<u32>);

    impl TextComponent for Counter {
        fn update_texts(&self) {
            self.0.set(self.0.get() + 1);
        }
        fn element(&self) -> Option<Rect> {
            Some(Rect::from_xywh(0.0, 0.0, 10.0, 10.0))
        }
    }

    fn setup() -> (LanguageSelector, TextLoadCoordinator, Scheduler, Rc<Counter>) {
        let scheduler = Scheduler::new();
        let size = ViewportSize::new(100.0, 100.0);
        let viewport = ViewportEvents::interactive(size);
        let coordinator = TextLoadCoordinator::new(
            CoordinatorConfig::default(),
            &viewport,
            FixedViewport(size),
            &scheduler,
        )
        .unwrap();
        let selector = LanguageSelector::new(&coordinator, ["en", "fr", "es"], "en").unwrap();

        let counter = Rc::new(Counter(Cell::new(0)));
        coordinator.subscribe(counter.clone(), false);
        scheduler.tick(Instant::now());
        coordinator.text_loaded(&*counter);

        (selector, coordinator, scheduler, counter)
    }

    #[test]
    fn test_initial_must_be_supported() {
        let scheduler = Scheduler::new();
        let viewport = ViewportEvents::headless();
        let coordinator =
            TextLoadCoordinator::with_viewport(CoordinatorConfig::default(), &viewport, &scheduler)
                .unwrap();
        let result = LanguageSelector::new(&coordinator, ["en"], "de");
        assert!(matches!(result, Err(Error::UnsupportedLanguage(code)) if code == "de"));
    }

    #[test]
    fn test_set_language_notifies() {
        let (selector, coordinator, _scheduler, counter) = setup();
        assert_eq!(counter.0.get(), 1);

        assert!(selector.set_language("fr").unwrap());
        assert_eq!(selector.current(), "fr");
        assert_eq!(counter.0.get(), 2);
        assert_eq!(coordinator.has_text_loaded(&*counter), Some(false));
    }

    #[test]
    fn test_same_language_is_noop() {
        let (selector, coordinator, _scheduler, counter) = setup();

        assert!(!selector.set_language("en").unwrap());
        assert_eq!(counter.0.get(), 1);
        assert_eq!(coordinator.has_text_loaded(&*counter), Some(true));
    }

    #[test]
    fn test_unsupported_language_rejected() {
        let (selector, _coordinator, _scheduler, counter) = setup();

        assert!(matches!(selector.set_language("xx"), Err(Error::UnsupportedLanguage(_))));
        assert_eq!(selector.current(), "en");
        assert_eq!(counter.0.get(), 1);
    }

    #[test]
    fn test_cycle_wraps() {
        let (selector, _coordinator, _scheduler, _counter) = setup();

        assert_eq!(selector.cycle().unwrap(), "fr");
        assert_eq!(selector.cycle().unwrap(), "es");
        assert_eq!(selector.cycle().unwrap(), "en");
        assert_eq!(selector.supported().len(), 3);
    }
}
