//! # Annotations
//!
//! Typed, named units of dataset metadata. Every annotation is validated when it is
//! constructed (or decoded) and is a value object from then on.
//!
//! ## Kinds
//!
//! | Discriminator | Type | Purpose |
//! |---------------|------|---------|
//! | `LabelAnnotation` | [`LabelAnnotation`] | Label with optional value |
//! | `FieldsDescriptorAnnotation` | [`FieldsDescriptorAnnotation`] | Field declarations of one producer |
//! | `ServiceExecutionAnnotation` | [`ServiceExecutionAnnotation`] | Service run plus the fields it produced |
//! | `PropertyChangeAnnotation` | [`PropertyChangeAnnotation`] | Audit entry for a metadata property change |
//!
//! Documents are decoded through [`decode_annotation`], which reads the `type`
//! discriminator and hands the document to the decoder for that kind. Unknown or
//! missing discriminators are errors.

mod error;
mod fields;
mod label;
mod property;
pub mod rules;
mod service;
mod template;
pub mod utils;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::config::ValidationLimits;

pub use error::{AnnotationValidationError, DecodeError, ValidationResult};
pub use fields::{
    FieldDescriptor, FieldMap, FieldSpec, FieldType, FieldsDescriptorAnnotation,
    FieldsDescriptorBuilder,
};
pub use label::{LabelAnnotation, LabelBuilder, LabelKind};
pub use property::PropertyChangeAnnotation;
pub use rules::{AnnotationType, ANNOTATION_ERRORS};
pub use service::{ServiceExecutionAnnotation, ServiceExecutionBuilder, ServiceInfo};
pub use template::TemplateSpec;

/// Any annotation kind
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Annotation {
    /// Label annotation
    Label(LabelAnnotation),
    /// Fields descriptor annotation
    FieldsDescriptor(FieldsDescriptorAnnotation),
    /// Service execution annotation
    ServiceExecution(ServiceExecutionAnnotation),
    /// Property change annotation
    PropertyChange(PropertyChangeAnnotation),
}

impl Annotation {
    /// Discriminator of this annotation
    pub fn annotation_type(&self) -> AnnotationType {
        match self {
            Annotation::Label(_) => AnnotationType::Label,
            Annotation::FieldsDescriptor(_) => AnnotationType::FieldsDescriptor,
            Annotation::ServiceExecution(_) => AnnotationType::ServiceExecution,
            Annotation::PropertyChange(_) => AnnotationType::PropertyChange,
        }
    }

    /// Identity name
    pub fn name(&self) -> &str {
        match self {
            Annotation::Label(a) => a.name(),
            Annotation::FieldsDescriptor(a) => a.name(),
            Annotation::ServiceExecution(a) => a.name(),
            Annotation::PropertyChange(a) => a.name(),
        }
    }

    /// Identity key within a metadata log
    pub fn key(&self) -> (AnnotationType, &str) {
        (self.annotation_type(), self.name())
    }

    /// Whether the annotation is active
    pub fn is_active(&self) -> bool {
        match self {
            Annotation::Label(a) => a.is_active(),
            Annotation::FieldsDescriptor(a) => a.is_active(),
            Annotation::ServiceExecution(a) => a.is_active(),
            Annotation::PropertyChange(a) => a.is_active(),
        }
    }

    /// Creation timestamp
    pub fn created(&self) -> DateTime<Utc> {
        match self {
            Annotation::Label(a) => a.created(),
            Annotation::FieldsDescriptor(a) => a.created(),
            Annotation::ServiceExecution(a) => a.created(),
            Annotation::PropertyChange(a) => a.created(),
        }
    }

    /// Field descriptors contributed by this annotation, if it declares any
    pub fn fields(&self) -> Option<&FieldMap> {
        match self {
            Annotation::FieldsDescriptor(a) => Some(a.fields()),
            Annotation::ServiceExecution(a) => Some(a.fields()),
            Annotation::Label(_) | Annotation::PropertyChange(_) => None,
        }
    }

    /// The label, if this is a label annotation
    pub fn as_label(&self) -> Option<&LabelAnnotation> {
        match self {
            Annotation::Label(label) => Some(label),
            _ => None,
        }
    }
}

impl From<LabelAnnotation> for Annotation {
    fn from(a: LabelAnnotation) -> Self {
        Annotation::Label(a)
    }
}

impl From<FieldsDescriptorAnnotation> for Annotation {
    fn from(a: FieldsDescriptorAnnotation) -> Self {
        Annotation::FieldsDescriptor(a)
    }
}

impl From<ServiceExecutionAnnotation> for Annotation {
    fn from(a: ServiceExecutionAnnotation) -> Self {
        Annotation::ServiceExecution(a)
    }
}

impl From<PropertyChangeAnnotation> for Annotation {
    fn from(a: PropertyChangeAnnotation) -> Self {
        Annotation::PropertyChange(a)
    }
}

impl<'de> Deserialize<'de> for Annotation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        decode_annotation(value, &ValidationLimits::default()).map_err(serde::de::Error::custom)
    }
}

type Decoder = fn(Value, &ValidationLimits) -> Result<Annotation, DecodeError>;

/// Dispatch table: discriminator → decoder
fn decoder(annotation_type: AnnotationType) -> Decoder {
    match annotation_type {
        AnnotationType::Label => decode_label_document,
        AnnotationType::FieldsDescriptor => decode_fields_document,
        AnnotationType::ServiceExecution => decode_service_document,
        AnnotationType::PropertyChange => decode_property_document,
    }
}

fn decode_label_document(value: Value, limits: &ValidationLimits) -> Result<Annotation, DecodeError> {
    let doc = serde_json::from_value(value)?;
    Ok(LabelAnnotation::from_document(doc, limits)?.into())
}

fn decode_fields_document(value: Value, limits: &ValidationLimits) -> Result<Annotation, DecodeError> {
    let doc = serde_json::from_value(value)?;
    Ok(FieldsDescriptorAnnotation::from_document(doc, limits)?.into())
}

fn decode_service_document(value: Value, limits: &ValidationLimits) -> Result<Annotation, DecodeError> {
    let doc = serde_json::from_value(value)?;
    Ok(ServiceExecutionAnnotation::from_document(doc, limits)?.into())
}

fn decode_property_document(value: Value, limits: &ValidationLimits) -> Result<Annotation, DecodeError> {
    let doc = serde_json::from_value(value)?;
    Ok(PropertyChangeAnnotation::from_document(doc, limits)?.into())
}

/// Decode one annotation document, validating it against `limits`
pub fn decode_annotation(value: Value, limits: &ValidationLimits) -> Result<Annotation, DecodeError> {
    let annotation_type = match value.get("type") {
        Some(Value::String(kind)) => kind
            .parse::<AnnotationType>()
            .map_err(DecodeError::UnknownAnnotationType)?,
        Some(other) => return Err(DecodeError::UnknownAnnotationType(other.to_string())),
        None => return Err(DecodeError::MissingDiscriminator),
    };
    decoder(annotation_type)(value, limits)
}

/// Decode a label document, rejecting any other kind
pub fn decode_label(value: Value, limits: &ValidationLimits) -> Result<LabelAnnotation, DecodeError> {
    match decode_annotation(value, limits)? {
        Annotation::Label(label) => Ok(label),
        other => Err(DecodeError::UnexpectedType {
            expected: AnnotationType::Label,
            found: other.annotation_type(),
        }),
    }
}
