use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::{AnnotationValidationError, DecodeError, ValidationResult};
use super::rules::{self, AnnotationType};
use crate::config::ValidationLimits;

/// How a label text is interpreted. The prefix is stored as part of the label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    /// Ordinary dataset label
    Plain,
    /// `@label`: scoped to a sub-structure named by the label reference
    Scoped,
    /// `#label`: hash or computed label
    Hash,
}

/// A label with an optional value, attached to a dataset or version.
///
/// Labels are keyed by their text. Adding the same label again to a
/// [`Metadata`](crate::metadata::Metadata) appends a new entry and the most recent
/// one wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", try_from = "LabelDocument")]
pub struct LabelAnnotation {
    name: String,
    created: DateTime<Utc>,
    active: bool,
    label: String,
    value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reference: Option<String>,
}

/// Unvalidated label document
#[derive(Debug, Deserialize)]
pub(crate) struct LabelDocument {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    created: Option<DateTime<Utc>>,
    #[serde(default = "default_active")]
    active: bool,
    label: String,
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    reference: Option<String>,
}

fn default_active() -> bool {
    true
}

impl LabelAnnotation {
    /// Create an active label with a value
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> ValidationResult<Self> {
        Self::builder(label).value(value).build()
    }

    /// Start building a label
    pub fn builder(label: impl Into<String>) -> LabelBuilder {
        LabelBuilder {
            label: label.into(),
            value: String::new(),
            reference: None,
            active: true,
            name: None,
            created: None,
            limits: ValidationLimits::default(),
        }
    }

    pub(crate) fn from_document(
        doc: LabelDocument,
        limits: &ValidationLimits,
    ) -> Result<Self, DecodeError> {
        if let Some(kind) = doc.kind.as_deref() {
            let found = kind
                .parse::<AnnotationType>()
                .map_err(DecodeError::UnknownAnnotationType)?;
            if found != AnnotationType::Label {
                return Err(DecodeError::UnexpectedType {
                    expected: AnnotationType::Label,
                    found,
                });
            }
        }
        let mut builder = Self::builder(doc.label)
            .value(doc.value.unwrap_or_default())
            .active(doc.active)
            .limits(limits);
        builder.reference = doc.reference;
        builder.name = doc.name;
        builder.created = doc.created;
        Ok(builder.build()?)
    }

    /// Identity name in a metadata log
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Creation timestamp
    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    /// Whether the label is active
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Label text, including any prefix
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Label value (empty when none was given)
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Reference of a scoped label
    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    /// Interpretation of the label prefix
    pub fn kind(&self) -> LabelKind {
        if self.label.starts_with('@') {
            LabelKind::Scoped
        } else if self.label.starts_with('#') {
            LabelKind::Hash
        } else {
            LabelKind::Plain
        }
    }

    /// True if both labels resolve to the same visible state
    pub(crate) fn same_state(&self, other: &LabelAnnotation) -> bool {
        self.label == other.label
            && self.value == other.value
            && self.active == other.active
            && self.reference == other.reference
    }
}

impl TryFrom<LabelDocument> for LabelAnnotation {
    type Error = DecodeError;

    fn try_from(doc: LabelDocument) -> Result<Self, Self::Error> {
        Self::from_document(doc, &ValidationLimits::default())
    }
}

/// Builder for [`LabelAnnotation`]
#[derive(Debug, Clone)]
pub struct LabelBuilder {
    label: String,
    value: String,
    reference: Option<String>,
    active: bool,
    name: Option<String>,
    created: Option<DateTime<Utc>>,
    limits: ValidationLimits,
}

impl LabelBuilder {
    /// Set the label value
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    /// Set the reference of an `@` scoped label
    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// Set the active flag (default true)
    pub fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Override the identity name (defaults to the label text)
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the creation timestamp (defaults to now)
    pub fn created(mut self, created: DateTime<Utc>) -> Self {
        self.created = Some(created);
        self
    }

    /// Use custom validation bounds
    pub fn limits(mut self, limits: &ValidationLimits) -> Self {
        self.limits = *limits;
        self
    }

    /// Validate and build the label
    pub fn build(self) -> ValidationResult<LabelAnnotation> {
        let t = AnnotationType::Label;
        if !ValidationLimits::within(&self.label, self.limits.label_max) {
            return Err(AnnotationValidationError::rule(
                t,
                rules::LABEL_LENGTH,
                self.limits.label_max,
            ));
        }
        if self.value.chars().count() > self.limits.label_value_max {
            return Err(AnnotationValidationError::rule(
                t,
                rules::LABEL_VALUE_LENGTH,
                self.limits.label_value_max,
            ));
        }
        if self.reference.is_some() && !self.label.starts_with('@') {
            return Err(AnnotationValidationError::rule(t, rules::LABEL_REFERENCE, 0));
        }

        Ok(LabelAnnotation {
            name: self.name.unwrap_or_else(|| self.label.clone()),
            created: self.created.unwrap_or_else(Utc::now),
            active: self.active,
            label: self.label,
            value: self.value,
            reference: self.reference,
        })
    }
}
