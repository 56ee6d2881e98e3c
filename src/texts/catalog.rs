//! In-memory text catalog.
//!
//! A catalog maps language → key → text and can be loaded from TOML:
//!
//! ```toml
//! [en]
//! "about.title" = "About me"
//!
//! [fr]
//! "about.title" = "À propos"
//! ```

use std::cell::Cell;
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

use serde::Deserialize;
use tracing::trace;

use super::{FetchCallback, TextBackend, TextBundle, TextRequest};
use crate::error::{Error, Result};
use crate::scheduler::Scheduler;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct TextCatalog {
    languages: HashMap<String, HashMap<String, String>>,
}

impl TextCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Add or replace one text.
    pub fn insert(&mut self, language: &str, key: &str, text: impl Into<String>) {
        self.languages
            .entry(language.to_string())
            .or_default()
            .insert(key.to_string(), text.into());
    }

    pub fn with(mut self, language: &str, key: &str, text: impl Into<String>) -> Self {
        self.insert(language, key, text);
        self
    }

    /// Language codes present in the catalog, sorted.
    pub fn languages(&self) -> Vec<String> {
        let mut languages: Vec<String> = self.languages.keys().cloned().collect();
        languages.sort();
        languages
    }

    pub fn lookup(&self, language: &str, key: &str) -> Option<&str> {
        self.languages.get(language)?.get(key).map(String::as_str)
    }

    /// All texts for a request. Fails on the first missing key.
    pub fn resolve(&self, request: &TextRequest) -> Result<TextBundle> {
        request
            .keys
            .iter()
            .map(|key| {
                self.lookup(&request.language, key)
                    .map(|text| (key.clone(), text.to_string()))
                    .ok_or_else(|| Error::MissingText {
                        language: request.language.clone(),
                        key: key.clone(),
                    })
            })
            .collect()
    }
}

// =============================================================================
// Backend
// =============================================================================

/// Serves a [`TextCatalog`], answering each fetch on the next scheduler tick
/// the way a network backend answers on a later event-loop turn.
pub struct CatalogBackend {
    catalog: Rc<TextCatalog>,
    scheduler: Scheduler,
    requests: Cell<u64>,
}

impl CatalogBackend {
    pub fn new(catalog: TextCatalog, scheduler: &Scheduler) -> Self {
        Self {
            catalog: Rc::new(catalog),
            scheduler: scheduler.clone(),
            requests: Cell::new(0),
        }
    }

    pub fn catalog(&self) -> &TextCatalog {
        &self.catalog
    }

    /// Fetches received so far.
    pub fn request_count(&self) -> u64 {
        self.requests.get()
    }
}

impl TextBackend for CatalogBackend {
    fn fetch(&self, request: TextRequest, done: FetchCallback) {
        self.requests.set(self.requests.get() + 1);
        trace!(language = %request.language, keys = request.keys.len(), "catalog fetch queued");

        let catalog = self.catalog.clone();
        self.scheduler.defer(move || {
            done(catalog.resolve(&request));
        });
    }
}
