//! Coordinator configuration.
//!
//! Fixed at construction. Loadable from TOML:
//!
//! ```toml
//! debounce_ms = 16
//!
//! [buffer]
//! height = 0.5
//! width = 0.25
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::types::BufferFactors;

/// Default quiet window for scroll/resize bursts: about one frame at 60 FPS.
pub const DEFAULT_DEBOUNCE_MS: u64 = 16;

/// Longest accepted quiet window.
pub const MAX_DEBOUNCE_MS: u64 = 1000;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoordinatorConfig {
    /// Margin around the viewport inside which components count as visible.
    pub buffer: BufferFactors,
    /// Quiet window before a scroll/resize burst triggers re-evaluation.
    pub debounce_ms: u64,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            buffer: BufferFactors::PREFETCH,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

impl CoordinatorConfig {
    /// Wide-margin preset (two screens vertically, one horizontally).
    pub fn eager() -> Self {
        Self {
            buffer: BufferFactors::EAGER,
            ..Self::default()
        }
    }

    pub fn with_buffer(mut self, buffer: BufferFactors) -> Self {
        self.buffer = buffer;
        self
    }

    pub fn with_debounce_ms(mut self, debounce_ms: u64) -> Self {
        self.debounce_ms = debounce_ms;
        self
    }

    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn validate(&self) -> Result<()> {
        for (axis, value) in [("height", self.buffer.height), ("width", self.buffer.width)] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidBufferFactor { axis, value });
            }
        }
        if self.debounce_ms > MAX_DEBOUNCE_MS {
            return Err(Error::InvalidConfig(format!(
                "debounce_ms {} exceeds {MAX_DEBOUNCE_MS}",
                self.debounce_ms
            )));
        }
        Ok(())
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }
}
