//! Localized text retrieval
//!
//! - [`TextBackend`] - where component texts come from (fire-and-forget fetch)
//! - [`catalog`] - in-memory, TOML-loadable catalog and a backend serving it
//! - [`localized`] - `LocalizedText`, a ready-made text-bearing component

pub mod catalog;
pub mod localized;

pub use catalog::{CatalogBackend, TextCatalog};
pub use localized::{LocalizedText, Placement};

use std::collections::HashMap;

use crate::error::Result;

/// Texts of one component in one language, by key.
pub type TextBundle = HashMap<String, String>;

/// Completion callback for [`TextBackend::fetch`].
pub type FetchCallback = Box<dyn FnOnce(Result<TextBundle>)>;

/// One component's request: these keys, in this language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRequest {
    pub language: String,
    pub keys: Vec<String>,
}

impl TextRequest {
    pub fn new<I, S>(language: impl Into<String>, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            language: language.into(),
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }
}

/// Source of localized texts.
///
/// `fetch` returns immediately; `done` runs once the texts (or an error)
/// are available, possibly during a later scheduler tick.
pub trait TextBackend {
    fn fetch(&self, request: TextRequest, done: FetchCallback);
}
