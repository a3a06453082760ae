use chrono::{DateTime, Utc};
use indexmap::{IndexMap, IndexSet};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::document::{MetadataDocument, DEFAULT_SYNC_TIME, METADATA_VERSION};
use super::labels;
use super::schema::{self, CompiledFields, JsonSchema};
use super::MetadataError;
use crate::annotation::{
    decode_annotation, decode_label, Annotation, LabelAnnotation, PropertyChangeAnnotation,
};
use crate::config::ValidationLimits;

/// Metadata of one dataset or dataset version.
///
/// Holds the dataset identity, an ordered annotation log and an append-only
/// label log. Compiled fields, the label view and the JSON schema are derived
/// from the logs on every call.
///
/// `Deserialize` validates annotations with the default bounds. Metadata built
/// [`with_limits`](Self::with_limits) reloads through
/// [`from_json_with_limits`](Self::from_json_with_limits).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "MetadataDocument", from = "MetadataDocument")]
pub struct Metadata {
    dataset_name: String,
    dataset_uuid: String,
    description: String,
    created_by: String,
    created: DateTime<Utc>,
    dataset_version: Option<u32>,
    synchronised_datetime: String,
    annotations: Vec<Annotation>,
    labels: Vec<LabelAnnotation>,
    limits: ValidationLimits,
}

impl Metadata {
    /// Create empty dataset metadata
    pub fn new(
        dataset_name: impl Into<String>,
        dataset_uuid: impl Into<String>,
        description: impl Into<String>,
        created_by: impl Into<String>,
    ) -> Self {
        Self {
            dataset_name: dataset_name.into(),
            dataset_uuid: dataset_uuid.into(),
            description: description.into(),
            created_by: created_by.into(),
            created: Utc::now(),
            dataset_version: None,
            synchronised_datetime: DEFAULT_SYNC_TIME.to_string(),
            annotations: Vec::new(),
            labels: Vec::new(),
            limits: ValidationLimits::default(),
        }
    }

    /// Decode bulk imports with custom validation bounds
    pub fn with_limits(mut self, limits: ValidationLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Validation bounds used by [`add_annotations`](Self::add_annotations)
    pub fn limits(&self) -> &ValidationLimits {
        &self.limits
    }

    /// Dataset name
    pub fn dataset_name(&self) -> &str {
        &self.dataset_name
    }

    /// Dataset identifier
    pub fn dataset_uuid(&self) -> &str {
        &self.dataset_uuid
    }

    /// Dataset description
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Dataset owner
    pub fn created_by(&self) -> &str {
        &self.created_by
    }

    /// Creation timestamp
    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    /// Version number, for version-scoped metadata
    pub fn dataset_version(&self) -> Option<u32> {
        self.dataset_version
    }

    /// Scope the metadata to a dataset version
    pub fn set_dataset_version(&mut self, version: Option<u32>) {
        self.dataset_version = version;
    }

    /// Last synchronisation time
    pub fn synchronised_datetime(&self) -> &str {
        &self.synchronised_datetime
    }

    /// Stamp the synchronisation time
    pub fn set_synchronised_datetime(&mut self, datetime: impl Into<String>) {
        self.synchronised_datetime = datetime.into();
    }

    /// Document format version
    pub fn get_metadata_version(&self) -> &'static str {
        METADATA_VERSION
    }

    /// The annotation log
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// The label log, every entry ever added
    pub fn label_log(&self) -> &[LabelAnnotation] {
        &self.labels
    }

    /// Change the description, recording the change in the annotation log
    pub fn set_description(&mut self, description: impl Into<String>) -> Result<(), MetadataError> {
        let description = description.into();
        if description == self.description {
            return Ok(());
        }
        let change = PropertyChangeAnnotation::new("description", &*self.description, &*description)?;
        self.description = description;
        self.add_annotation(change);
        Ok(())
    }

    /// Change the owner, recording the change in the annotation log
    pub fn set_created_by(&mut self, created_by: impl Into<String>) -> Result<(), MetadataError> {
        let created_by = created_by.into();
        if created_by == self.created_by {
            return Ok(());
        }
        let change = PropertyChangeAnnotation::new("created_by", &*self.created_by, &*created_by)?;
        self.created_by = created_by;
        self.add_annotation(change);
        Ok(())
    }

    /// Add an annotation.
    ///
    /// An annotation whose (type, name) is already in the log replaces that
    /// entry in place; anything else is appended. Labels go to the label log.
    pub fn add_annotation(&mut self, annotation: impl Into<Annotation>) {
        let annotation = annotation.into();
        if let Annotation::Label(label) = annotation {
            self.add_label(label);
            return;
        }

        match self
            .annotations
            .iter()
            .position(|existing| existing.key() == annotation.key())
        {
            Some(index) => {
                debug!(
                    "Updating {} '{}' at position {}",
                    annotation.annotation_type(),
                    annotation.name(),
                    index
                );
                self.annotations[index] = annotation;
            }
            None => {
                debug!(
                    "Appending {} '{}'",
                    annotation.annotation_type(),
                    annotation.name()
                );
                self.annotations.push(annotation);
            }
        }
    }

    /// Decode and add annotation documents in the given order.
    ///
    /// Accepts an array of documents, a single document, or a JSON string of
    /// either. Every document is decoded before any is added, so a bad entry
    /// leaves the aggregate untouched. Returns the number of annotations added.
    pub fn add_annotations(&mut self, documents: Value) -> Result<usize, MetadataError> {
        let documents = match documents {
            Value::String(json) => serde_json::from_str(&json)?,
            other => other,
        };
        let decoded = match documents {
            Value::Array(items) => items
                .into_iter()
                .map(|item| decode_annotation(item, &self.limits))
                .collect::<Result<Vec<_>, _>>()?,
            Value::Object(_) => vec![decode_annotation(documents, &self.limits)?],
            other => {
                return Err(MetadataError::InvalidDocument(format!(
                    "expected an annotation or a list of annotations, found {}",
                    other
                )))
            }
        };

        let count = decoded.len();
        for annotation in decoded {
            self.add_annotation(annotation);
        }
        Ok(count)
    }

    /// Append a label entry
    pub fn add_label(&mut self, label: LabelAnnotation) {
        debug!("Adding label '{}' = '{}'", label.label(), label.value());
        self.labels.push(label);
    }

    /// Append label entries in the given order
    pub fn add_labels(&mut self, labels: impl IntoIterator<Item = LabelAnnotation>) {
        for label in labels {
            self.add_label(label);
        }
    }

    /// Append the incoming labels that are newer than the current entry of
    /// their key and change its state. Returns the number of entries appended.
    pub fn merge_labels<'a>(
        &mut self,
        incoming: impl IntoIterator<Item = &'a LabelAnnotation>,
    ) -> usize {
        let appended = labels::merge_labels(&mut self.labels, incoming);
        debug!("Merged {} label entries into '{}'", appended, self.dataset_name);
        appended
    }

    /// Remove an annotation by name.
    ///
    /// The first annotation log entry with that name is removed. If there is
    /// none, every label log entry for that label is removed and the latest
    /// of them is returned.
    pub fn remove_annotation(&mut self, name: &str) -> Option<Annotation> {
        if let Some(index) = self.annotations.iter().position(|a| a.name() == name) {
            debug!("Removing annotation '{}'", name);
            return Some(self.annotations.remove(index));
        }

        let mut removed = None;
        self.labels.retain(|label| {
            if label.label() == name || label.name() == name {
                removed = Some(label.clone());
                false
            } else {
                true
            }
        });
        if removed.is_some() {
            debug!("Removing label '{}'", name);
        }
        removed.map(Annotation::Label)
    }

    /// Drop the whole annotation log, returning it
    pub fn clear_annotations(&mut self) -> Vec<Annotation> {
        debug!("Clearing annotations of '{}'", self.dataset_name);
        std::mem::take(&mut self.annotations)
    }

    /// Look up an annotation log entry by name
    pub fn get_annotation(&self, name: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.name() == name)
    }

    /// Current state of a label
    pub fn get_label(&self, label: &str) -> Option<&LabelAnnotation> {
        self.labels.iter().rev().find(|l| l.label() == label)
    }

    /// Resolved labels, one per label key, most recently changed first.
    /// `active` filters on the resolved entry's flag.
    pub fn get_labels(&self, active: Option<bool>) -> Vec<&LabelAnnotation> {
        labels::filter_labels(&self.labels, active)
    }

    /// Label name → value for the active resolved labels
    pub fn label_values(&self) -> IndexMap<String, String> {
        labels::label_values(&self.labels)
    }

    /// Union of every field descriptor in the log, inactive included
    pub fn get_compiled_fields(&self) -> CompiledFields {
        schema::compile_fields(&self.annotations)
    }

    /// Names that have been required and active, in first-seen order
    pub fn get_required_fields(&self) -> IndexSet<String> {
        schema::compile_required(&self.annotations)
    }

    /// Effective JSON schema
    pub fn get_json_schema(&self) -> JsonSchema {
        self.get_json_schema_with_labels(self.label_values())
    }

    /// Effective JSON schema with a caller-resolved label view
    pub fn get_json_schema_with_labels(&self, labels: IndexMap<String, String>) -> JsonSchema {
        JsonSchema::new(
            &self.dataset_name,
            &self.description,
            self.dataset_version.unwrap_or(0),
            &self.get_compiled_fields(),
            self.get_required_fields(),
            labels,
        )
    }

    /// The annotation log as a JSON array
    pub fn annotations_value(&self) -> Result<Value, MetadataError> {
        Ok(serde_json::to_value(&self.annotations)?)
    }

    /// The annotation log as a JSON string
    pub fn get_annotations_json(&self) -> Result<String, MetadataError> {
        Ok(serde_json::to_string(&self.annotations)?)
    }

    /// Snapshot as a serializable document
    pub fn to_document(&self) -> MetadataDocument {
        self.clone().into()
    }

    /// Rebuild from a document
    pub fn from_document(doc: MetadataDocument) -> Self {
        if doc.metadata_version != METADATA_VERSION {
            warn!(
                "Metadata for '{}' has version {}, expected {}",
                doc.dataset_name, doc.metadata_version, METADATA_VERSION
            );
        }
        Self {
            dataset_name: doc.dataset_name,
            dataset_uuid: doc.dataset_uuid,
            description: doc.description,
            created_by: doc.created_by,
            created: doc.created,
            dataset_version: doc.dataset_version,
            synchronised_datetime: doc.synchronised_datetime,
            annotations: doc.annotations,
            labels: doc.labels,
            limits: ValidationLimits::default(),
        }
    }

    /// Serialize to a JSON string
    pub fn to_json(&self) -> Result<String, MetadataError> {
        Ok(serde_json::to_string(&self.to_document())?)
    }

    /// Serialize to a JSON value
    pub fn to_value(&self) -> Result<Value, MetadataError> {
        Ok(serde_json::to_value(self.to_document())?)
    }

    /// Parse a JSON string, validating annotations with default bounds
    pub fn from_json(json: &str) -> Result<Self, MetadataError> {
        Ok(Self::from_document(MetadataDocument::from_json(json)?))
    }

    /// Parse a JSON string, validating annotations with `limits`
    pub fn from_json_with_limits(
        json: &str,
        limits: &ValidationLimits,
    ) -> Result<Self, MetadataError> {
        Self::from_value(serde_json::from_str(json)?, limits)
    }

    /// Rebuild from a JSON value, validating annotations with `limits`
    pub fn from_value(mut value: Value, limits: &ValidationLimits) -> Result<Self, MetadataError> {
        let annotations = take_array(&mut value, "annotations")?
            .into_iter()
            .map(|item| decode_annotation(item, limits))
            .collect::<Result<Vec<_>, _>>()?;
        let labels = take_array(&mut value, "labels")?
            .into_iter()
            .map(|item| decode_label(item, limits))
            .collect::<Result<Vec<_>, _>>()?;

        let mut metadata = Self::from_document(serde_json::from_value(value)?);
        metadata.annotations = annotations;
        metadata.labels = labels;
        metadata.limits = *limits;
        Ok(metadata)
    }
}

fn take_array(value: &mut Value, key: &str) -> Result<Vec<Value>, MetadataError> {
    let Value::Object(map) = value else {
        return Err(MetadataError::InvalidDocument(
            "metadata must be a JSON object".to_string(),
        ));
    };
    match map.remove(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(MetadataError::InvalidDocument(format!(
            "`{}` must be a list",
            key
        ))),
    }
}

impl From<Metadata> for MetadataDocument {
    fn from(metadata: Metadata) -> Self {
        Self {
            dataset_name: metadata.dataset_name,
            dataset_uuid: metadata.dataset_uuid,
            description: metadata.description,
            created_by: metadata.created_by,
            created: metadata.created,
            metadata_version: METADATA_VERSION.to_string(),
            dataset_version: metadata.dataset_version,
            synchronised_datetime: metadata.synchronised_datetime,
            annotations: metadata.annotations,
            labels: metadata.labels,
        }
    }
}

impl From<MetadataDocument> for Metadata {
    fn from(doc: MetadataDocument) -> Self {
        Self::from_document(doc)
    }
}
