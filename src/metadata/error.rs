use crate::annotation::{AnnotationValidationError, DecodeError};

/// Errors that can occur while building or loading metadata
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    /// An annotation failed validation
    #[error(transparent)]
    Validation(#[from] AnnotationValidationError),

    /// An annotation document could not be decoded
    #[error("Annotation decode error: {0}")]
    Decode(#[from] DecodeError),

    /// The metadata document has the wrong shape
    #[error("Invalid metadata document: {0}")]
    InvalidDocument(String),

    /// JSON serialization/deserialization error
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error reading or writing a metadata file
    #[error("Failed to access file: {0}")]
    Io(#[from] std::io::Error),
}
