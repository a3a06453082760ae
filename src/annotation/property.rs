use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::{AnnotationValidationError, DecodeError, ValidationResult};
use super::fields::check_kind;
use super::rules::{self, AnnotationType};
use crate::config::ValidationLimits;

/// Audit record of a change to a metadata property such as `description`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", try_from = "PropertyChangeDocument")]
pub struct PropertyChangeAnnotation {
    name: String,
    created: DateTime<Utc>,
    active: bool,
    property: String,
    previous_value: String,
    new_value: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PropertyChangeDocument {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    created: Option<DateTime<Utc>>,
    #[serde(default = "default_active")]
    active: bool,
    property: String,
    #[serde(default)]
    previous_value: String,
    #[serde(default)]
    new_value: String,
}

fn default_active() -> bool {
    true
}

impl PropertyChangeAnnotation {
    /// Record a property change
    pub fn new(
        property: impl Into<String>,
        previous_value: impl Into<String>,
        new_value: impl Into<String>,
    ) -> ValidationResult<Self> {
        Self::build(
            property.into(),
            previous_value.into(),
            new_value.into(),
            None,
            None,
            true,
            &ValidationLimits::default(),
        )
    }

    fn build(
        property: String,
        previous_value: String,
        new_value: String,
        name: Option<String>,
        created: Option<DateTime<Utc>>,
        active: bool,
        limits: &ValidationLimits,
    ) -> ValidationResult<Self> {
        if !ValidationLimits::within(&property, limits.text_max) {
            return Err(AnnotationValidationError::rule(
                AnnotationType::PropertyChange,
                rules::PROPERTY_NAME,
                limits.text_max,
            ));
        }
        Ok(Self {
            name: name.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            created: created.unwrap_or_else(Utc::now),
            active,
            property,
            previous_value,
            new_value,
        })
    }

    pub(crate) fn from_document(
        doc: PropertyChangeDocument,
        limits: &ValidationLimits,
    ) -> Result<Self, DecodeError> {
        check_kind(doc.kind.as_deref(), AnnotationType::PropertyChange)?;
        Ok(Self::build(
            doc.property,
            doc.previous_value,
            doc.new_value,
            doc.name,
            doc.created,
            doc.active,
            limits,
        )?)
    }

    /// Identity name in a metadata log
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Creation timestamp
    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    /// Whether the annotation is active
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Name of the changed property
    pub fn property(&self) -> &str {
        &self.property
    }

    /// Value before the change
    pub fn previous_value(&self) -> &str {
        &self.previous_value
    }

    /// Value after the change
    pub fn new_value(&self) -> &str {
        &self.new_value
    }
}

impl TryFrom<PropertyChangeDocument> for PropertyChangeAnnotation {
    type Error = DecodeError;

    fn try_from(doc: PropertyChangeDocument) -> Result<Self, Self::Error> {
        Self::from_document(doc, &ValidationLimits::default())
    }
}
