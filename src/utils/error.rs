//! Error Handling Module
//!
//! Defines the error type shared by the model, inference and disease-table code.
//! Uses thiserror for ergonomic error definitions.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for plantdoc operations
#[derive(Error, Debug)]
pub enum PlantDocError {
    /// Weights file missing or incompatible with the network definition
    #[error("Failed to load model from '{path}': {reason}")]
    ModelLoad { path: PathBuf, reason: String },

    /// Model manifest missing, unreadable or inconsistent with the label list
    #[error("Manifest error: {0}")]
    Manifest(String),

    /// Uploaded bytes are not a decodable image
    #[error("Failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// Decodable image in a format the classifier does not accept
    #[error("Unsupported image format: {0} (expected JPEG or PNG)")]
    UnsupportedFormat(String),

    /// Input tensor or argument with the wrong shape or value
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Normalized lookup key with no disease record
    #[error("No disease record for key '{key}'")]
    UnknownDisease { key: String },

    /// Class index outside the label list
    #[error("Class index {0} is out of range")]
    UnknownClass(usize),

    /// Error while running the forward pass or reading its output
    #[error("Inference error: {0}")]
    Inference(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PlantDocError {
    /// Whether the current request can carry on after this error.
    ///
    /// Only lookup misses are recoverable; everything else aborts the request
    /// (or, for load failures, the process).
    pub fn is_recoverable(&self) -> bool {
        matches!(self, PlantDocError::UnknownDisease { .. })
    }
}

impl From<serde_json::Error> for PlantDocError {
    fn from(err: serde_json::Error) -> Self {
        PlantDocError::Serialization(err.to_string())
    }
}

/// Convenience Result type for plantdoc operations
pub type Result<T> = std::result::Result<T, PlantDocError>;
