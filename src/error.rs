//! Error types.
//!
//! The coordinator itself never fails: contract misuse (unknown component,
//! duplicate completion) is ignored and logged. Errors come from the edges:
//! configuration loading, language selection, text backends and terminal I/O.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration file: {0}")]
    Config(#[from] toml::de::Error),

    #[error("invalid {axis} buffer factor {value}: must be finite and non-negative")]
    InvalidBufferFactor { axis: &'static str, value: f64 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("unsupported language '{0}'")]
    UnsupportedLanguage(String),

    #[error("no text for key '{key}' in language '{language}'")]
    MissingText { language: String, key: String },
}
