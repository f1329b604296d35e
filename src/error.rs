// src/error.rs

use thiserror::Error;

/// Core error types for extinstall
#[derive(Error, Debug)]
pub enum Error {
    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A string that should have been a version number was not
    #[error("Invalid version: {0}")]
    InvalidVersion(String),

    /// Manifest or host inventory could not be parsed
    #[error("Parse error: {0}")]
    ParseError(String),

    /// JSON (de)serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The package advertises none of the known SDK facets
    #[error("Not a recognized package: {0}")]
    UnrecognizedPackage(String),

    /// A family folder could not be resolved for an install root
    #[error("Failed to resolve install folder: {0}")]
    ResolverError(String),
}

/// Result type alias using extinstall's Error type
pub type Result<T> = std::result::Result<T, Error>;
