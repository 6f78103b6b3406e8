//! Error types for meshtune

use thiserror::Error;

/// Main error type for meshtune operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("Type mismatch for parameter '{name}': expected {expected}, found {found}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    #[error("Compile error: {0}")]
    Compile(String),

    #[error("Channel error: {0}")]
    Channel(String),

    #[error("Malformed mesh: {0}")]
    MalformedMesh(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Viewer error: {0}")]
    Viewer(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for meshtune operations
pub type Result<T> = std::result::Result<T, Error>;
