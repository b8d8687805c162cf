//! Error types for OwlMind.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for owlmind operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid rule weight {0}: must be finite and non-negative")]
    InvalidWeight(f64),

    #[error("Invalid action: {0}")]
    InvalidAction(String),

    #[error("Unknown selection strategy: {0}")]
    InvalidStrategy(String),

    #[error("Action emits a bare value but no default key is configured")]
    NoDefaultKey,

    #[error("Unknown artifact function: {0}")]
    UnknownArtifact(String),

    #[error("Artifact '{function}' failed: {message}")]
    Artifact { function: String, message: String },

    #[error("Unsupported rule file format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    pub fn code(&self) -> i32 {
        match self {
            Error::InvalidWeight(_) => -32010,
            Error::InvalidAction(_) => -32011,
            Error::InvalidStrategy(_) => -32016,
            Error::NoDefaultKey => -32012,
            Error::UnknownArtifact(_) => -32013,
            Error::Artifact { .. } => -32014,
            Error::UnsupportedFormat(_) => -32015,
            Error::Io(_) => -32006,
            Error::Json(_) => -32700,
            Error::Toml(_) => -32701,
        }
    }
}
