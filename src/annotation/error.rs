use super::rules::{self, AnnotationType};

/// Validation failure raised while constructing an annotation.
///
/// Carries the annotation kind, the numbered rule that fired and the rendered
/// message from [`rules::ANNOTATION_ERRORS`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{annotation_type} validation error {code}: {message}")]
pub struct AnnotationValidationError {
    /// Kind of annotation being constructed
    pub annotation_type: AnnotationType,
    /// Rule code
    pub code: u16,
    /// Violation message
    pub message: String,
}

impl AnnotationValidationError {
    /// Build an error from the rule table, rendering `{max}` with `max`
    pub fn rule(annotation_type: AnnotationType, code: u16, max: usize) -> Self {
        Self {
            annotation_type,
            code,
            message: rules::render(annotation_type, code, max),
        }
    }

    /// Build an error for a rule concerning one named field
    pub(crate) fn field_rule(
        annotation_type: AnnotationType,
        code: u16,
        field: &str,
        detail: String,
    ) -> Self {
        Self {
            annotation_type,
            code,
            message: format!("Field name: {}, {}", field, detail),
        }
    }
}

/// Result alias for annotation construction
pub type ValidationResult<T> = Result<T, AnnotationValidationError>;

/// Errors raised while decoding an annotation document
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// Document has no `type` key
    #[error("Annotation document has no 'type' discriminator")]
    MissingDiscriminator,

    /// Document `type` is not a known annotation kind
    #[error("Unknown annotation type: {0}")]
    UnknownAnnotationType(String),

    /// Document decodes to a different kind than the caller requires
    #[error("Expected {expected}, found {found}")]
    UnexpectedType {
        /// Kind the caller asked for
        expected: AnnotationType,
        /// Kind named by the document
        found: AnnotationType,
    },

    /// Document content failed validation
    #[error(transparent)]
    Validation(#[from] AnnotationValidationError),

    /// Document shape does not match the annotation kind
    #[error("JSON decoding error: {0}")]
    Json(#[from] serde_json::Error),
}
