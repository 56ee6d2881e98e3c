//! LocalizedText - a text-bearing component backed by a [`TextBackend`].
//!
//! Owns a set of text keys, asks the backend for them in the active
//! language whenever the coordinator says so, and reports completion back.
//! Results for a language that is no longer active are dropped.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use tracing::warn;

use super::{TextBackend, TextBundle, TextRequest};
use crate::component::TextComponent;
use crate::coordinator::{TextLoadCoordinator, WeakCoordinator};
use crate::error::Result;
use crate::language::LanguageSelector;
use crate::types::Rect;
use crate::viewport::ViewportEvents;

/// Where the component's element sits.
#[derive(Clone, Default)]
pub enum Placement {
    /// Not laid out yet; never visible.
    #[default]
    Unmounted,
    /// Fixed bounds, already relative to the viewport.
    Viewport(Rect),
    /// Bounds in document coordinates; the viewport's scroll offset is
    /// subtracted on every query.
    Document { rect: Rect, viewport: ViewportEvents },
}

impl Placement {
    fn element(&self) -> Option<Rect> {
        match self {
            Placement::Unmounted => None,
            Placement::Viewport(rect) => Some(*rect),
            Placement::Document { rect, viewport } => Some(rect.translated(0.0, -viewport.scroll_offset())),
        }
    }
}

pub struct LocalizedText {
    name: String,
    keys: Vec<String>,
    placement: RefCell<Placement>,
    texts: RefCell<TextBundle>,
    texts_language: RefCell<Option<String>>,
    last_error: RefCell<Option<String>>,
    fetches: Cell<u32>,
    backend: Rc<dyn TextBackend>,
    language: LanguageSelector,
    coordinator: WeakCoordinator,
    this: Weak<LocalizedText>,
}

impl LocalizedText {
    /// Create the component and register it with `coordinator`.
    pub fn mount<I, S>(
        name: &str,
        keys: I,
        placement: Placement,
        backend: Rc<dyn TextBackend>,
        language: &LanguageSelector,
        coordinator: &TextLoadCoordinator,
        only_once: bool,
    ) -> Rc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let component = Rc::new_cyclic(|this| Self {
            name: name.to_string(),
            keys: keys.into_iter().map(Into::into).collect(),
            placement: RefCell::new(placement),
            texts: RefCell::new(TextBundle::new()),
            texts_language: RefCell::new(None),
            last_error: RefCell::new(None),
            fetches: Cell::new(0),
            backend,
            language: language.clone(),
            coordinator: coordinator.downgrade(),
            this: this.clone(),
        });
        coordinator.subscribe(component.clone(), only_once);
        component
    }

    /// Unregister from the coordinator. Safe to call twice.
    pub fn unmount(&self) {
        if let Some(coordinator) = self.coordinator.upgrade() {
            coordinator.unsubscribe(self);
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn set_placement(&self, placement: Placement) {
        *self.placement.borrow_mut() = placement;
    }

    /// Loaded text for `key`, if any.
    pub fn text(&self, key: &str) -> Option<String> {
        self.texts.borrow().get(key).cloned()
    }

    /// Language of the texts currently held.
    pub fn texts_language(&self) -> Option<String> {
        self.texts_language.borrow().clone()
    }

    /// Message of the most recent failed fetch, cleared on success.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.borrow().clone()
    }

    /// Fetches started so far.
    pub fn fetch_count(&self) -> u32 {
        self.fetches.get()
    }

    fn finish(&self, language: &str, result: Result<TextBundle>) {
        match result {
            Ok(bundle) if language == self.language.current() => {
                *self.texts.borrow_mut() = bundle;
                *self.texts_language.borrow_mut() = Some(language.to_string());
                *self.last_error.borrow_mut() = None;
            }
            Ok(_) => {}
            Err(err) => {
                warn!(component = %self.name, language, %err, "text fetch failed");
                *self.last_error.borrow_mut() = Some(err.to_string());
            }
        }

        if let Some(coordinator) = self.coordinator.upgrade() {
            coordinator.text_loaded(self);
        }
    }
}

impl TextComponent for LocalizedText {
    fn update_texts(&self) {
        self.fetches.set(self.fetches.get() + 1);
        let request = TextRequest {
            language: self.language.current(),
            keys: self.keys.clone(),
        };

        let this = self.this.clone();
        let language = request.language.clone();
        self.backend.fetch(
            request,
            Box::new(move |result| {
                if let Some(this) = this.upgrade() {
                    this.finish(&language, result);
                }
            }),
        );
    }

    fn element(&self) -> Option<Rect> {
        self.placement.borrow().element()
    }
}
