//! Error types used throughout this crate.

use thiserror::Error;

/// Catch-all error for this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// A configuration value failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// The configuration requests a system this solver does not implement.
    #[error("unsupported system type `{0}`")]
    UnsupportedType(String),
    /// The configuration file could not be read.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// The configuration file could not be parsed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result type with this crate's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
