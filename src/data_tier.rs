//! # Data Tier
//!
//! Lifecycle transitions of dataset and version metadata. Every function takes
//! metadata documents and returns new documents together with their effective
//! [`JsonSchema`]; nothing is stored or mutated in place.
//!
//! | Function | Result |
//! |----------|--------|
//! | [`post_dataset_metadata`] | New dataset metadata |
//! | [`post_version_metadata`] | New version metadata derived from a dataset |
//! | [`patch_dataset_metadata`] / [`patch_version_metadata`] | Updated documents |
//! | [`get_version_schema`] | Version schema with the current dataset labels |
//! | [`get_travelling_metadata`] | Snapshot of a version plus dataset labels |
//! | [`post_travelling_metadata_to_new_dataset`] | Dataset + version from a snapshot |
//! | [`post_travelling_metadata_to_existing_dataset`] | Snapshot merged into a dataset |
//!
//! Dataset label changes reach a version schema only when it is recomputed with
//! [`get_version_schema`].

use chrono::Utc;
use log::debug;

use crate::annotation::{Annotation, LabelAnnotation};
use crate::metadata::{
    labels, JsonSchema, Metadata, MetadataDocument, MetadataError, DEFAULT_SYNC_TIME,
};

/// Optional inputs of the post and patch functions
#[derive(Debug, Clone, Default)]
pub struct MetadataParams {
    /// New description
    pub description: Option<String>,
    /// Annotations to add, in order
    pub annotations: Vec<Annotation>,
    /// Label entries to append, in order
    pub labels: Vec<LabelAnnotation>,
}

impl MetadataParams {
    /// No changes
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add an annotation
    pub fn with_annotation(mut self, annotation: impl Into<Annotation>) -> Self {
        self.annotations.push(annotation.into());
        self
    }

    /// Add a label entry
    pub fn with_label(mut self, label: LabelAnnotation) -> Self {
        self.labels.push(label);
        self
    }
}

/// Documents produced when travelling metadata is brought back
#[derive(Debug, Clone, PartialEq)]
pub struct Reintegration {
    /// Dataset metadata
    pub dataset: MetadataDocument,
    /// Dataset schema
    pub dataset_schema: JsonSchema,
    /// Version metadata
    pub version: MetadataDocument,
    /// Version schema, with the dataset labels
    pub version_schema: JsonSchema,
}

fn apply(metadata: &mut Metadata, params: MetadataParams) -> Result<(), MetadataError> {
    if let Some(description) = params.description {
        metadata.set_description(description)?;
    }
    for annotation in params.annotations {
        metadata.add_annotation(annotation);
    }
    metadata.add_labels(params.labels);
    Ok(())
}

fn with_schema(metadata: Metadata) -> (MetadataDocument, JsonSchema) {
    let schema = metadata.get_json_schema();
    (metadata.into(), schema)
}

/// Empty version metadata carrying the identity of `dataset`
fn version_of(dataset: &MetadataDocument, version: u32) -> Metadata {
    let mut metadata = Metadata::new(
        &dataset.dataset_name,
        &dataset.dataset_uuid,
        &dataset.description,
        &dataset.created_by,
    );
    metadata.set_dataset_version(Some(version));
    metadata
}

/// Schema of `version` with the dataset label log followed by the version's
fn version_schema(dataset_labels: &[LabelAnnotation], version: &Metadata) -> JsonSchema {
    let mut log = dataset_labels.to_vec();
    log.extend_from_slice(version.label_log());
    version.get_json_schema_with_labels(labels::label_values(&log))
}

/// Create metadata for a new dataset
pub fn post_dataset_metadata(
    dataset_name: &str,
    dataset_uuid: &str,
    description: &str,
    created_by: &str,
    params: MetadataParams,
) -> Result<(MetadataDocument, JsonSchema), MetadataError> {
    debug!("Creating metadata for dataset '{}' ({})", dataset_name, dataset_uuid);
    let mut metadata = Metadata::new(dataset_name, dataset_uuid, description, created_by);
    apply(&mut metadata, params)?;
    Ok(with_schema(metadata))
}

/// Create metadata for version `version` of a dataset
pub fn post_version_metadata(
    dataset: &MetadataDocument,
    version: u32,
    params: MetadataParams,
) -> Result<(MetadataDocument, JsonSchema), MetadataError> {
    debug!("Creating metadata for '{}' version {}", dataset.dataset_name, version);
    let mut metadata = version_of(dataset, version);
    apply(&mut metadata, params)?;
    let schema = version_schema(&dataset.labels, &metadata);
    Ok((metadata.into(), schema))
}

/// Apply changes to dataset metadata
pub fn patch_dataset_metadata(
    dataset: &MetadataDocument,
    params: MetadataParams,
) -> Result<(MetadataDocument, JsonSchema), MetadataError> {
    debug!("Patching metadata for dataset '{}'", dataset.dataset_name);
    let mut metadata = Metadata::from_document(dataset.clone());
    apply(&mut metadata, params)?;
    Ok(with_schema(metadata))
}

/// Recompute a version schema against the current dataset metadata
pub fn get_version_schema(dataset: &MetadataDocument, version: &MetadataDocument) -> JsonSchema {
    version_schema(&dataset.labels, &Metadata::from_document(version.clone()))
}

/// Apply changes to version metadata
pub fn patch_version_metadata(
    dataset: &MetadataDocument,
    version: &MetadataDocument,
    params: MetadataParams,
) -> Result<(MetadataDocument, JsonSchema), MetadataError> {
    debug!(
        "Patching metadata for '{}' version {:?}",
        version.dataset_name, version.dataset_version
    );
    let mut metadata = Metadata::from_document(version.clone());
    apply(&mut metadata, params)?;
    let schema = version_schema(&dataset.labels, &metadata);
    Ok((metadata.into(), schema))
}

/// Snapshot a version with the dataset labels, stamped with the current time
pub fn get_travelling_metadata(
    dataset: &MetadataDocument,
    version: &MetadataDocument,
) -> (MetadataDocument, JsonSchema) {
    let mut travelling = version.clone();
    travelling.labels = dataset
        .labels
        .iter()
        .chain(version.labels.iter())
        .cloned()
        .collect();
    travelling.synchronised_datetime = Utc::now().to_rfc3339();
    debug!(
        "Travelling metadata for '{}' version {:?} at {}",
        travelling.dataset_name, travelling.dataset_version, travelling.synchronised_datetime
    );
    with_schema(Metadata::from_document(travelling))
}

/// Apply changes to travelling metadata
pub fn patch_travelling_metadata(
    travelling: &MetadataDocument,
    params: MetadataParams,
) -> Result<(MetadataDocument, JsonSchema), MetadataError> {
    let mut metadata = Metadata::from_document(travelling.clone());
    apply(&mut metadata, params)?;
    Ok(with_schema(metadata))
}

/// Version metadata holding the travelling annotations
fn reintegrated_version(
    dataset: &Metadata,
    travelling: &MetadataDocument,
    version: u32,
) -> Metadata {
    let mut metadata = Metadata::new(
        dataset.dataset_name(),
        dataset.dataset_uuid(),
        dataset.description(),
        dataset.created_by(),
    );
    metadata.set_dataset_version(Some(version));
    for annotation in &travelling.annotations {
        metadata.add_annotation(annotation.clone());
    }
    metadata
}

fn reintegrate(mut dataset: Metadata, travelling: &MetadataDocument, version: u32) -> Reintegration {
    dataset.clear_annotations();
    dataset.set_dataset_version(None);
    dataset.set_synchronised_datetime(DEFAULT_SYNC_TIME);

    let version_metadata = reintegrated_version(&dataset, travelling, version);
    let schema = version_schema(dataset.label_log(), &version_metadata);
    let dataset_schema = dataset.get_json_schema();

    Reintegration {
        dataset: dataset.into(),
        dataset_schema,
        version: version_metadata.into(),
        version_schema: schema,
    }
}

/// Create a dataset and its version `version` from travelling metadata
pub fn post_travelling_metadata_to_new_dataset(
    travelling: &MetadataDocument,
    version: u32,
) -> Reintegration {
    debug!(
        "Creating dataset '{}' version {} from travelling metadata",
        travelling.dataset_name, version
    );
    let dataset = Metadata::from_document(travelling.clone());
    reintegrate(dataset, travelling, version)
}

/// Merge travelling metadata into an existing dataset as version `version`
pub fn post_travelling_metadata_to_existing_dataset(
    travelling: &MetadataDocument,
    dataset: &MetadataDocument,
    version: u32,
) -> Reintegration {
    debug!(
        "Merging travelling metadata into '{}' as version {}",
        dataset.dataset_name, version
    );
    let mut existing = Metadata::from_document(dataset.clone());
    existing.merge_labels(&travelling.labels);
    reintegrate(existing, travelling, version)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(text: &str, value: &str) -> LabelAnnotation {
        LabelAnnotation::new(text, value).unwrap()
    }

    #[test]
    fn test_params_builder() {
        let params = MetadataParams::new()
            .with_description("new description")
            .with_label(label("label1", "value1"));
        assert_eq!(params.description.as_deref(), Some("new description"));
        assert_eq!(params.labels.len(), 1);
        assert!(params.annotations.is_empty());
    }

    #[test]
    fn test_version_labels_win() {
        let (dataset, _) = post_dataset_metadata(
            "test dataset",
            "dataset-1",
            "description",
            "Fred",
            MetadataParams::new().with_label(label("label1", "value1")),
        )
        .unwrap();
        let (version, schema) = post_version_metadata(
            &dataset,
            1,
            MetadataParams::new().with_label(label("label1", "version")),
        )
        .unwrap();

        assert_eq!(version.labels.len(), 1);
        assert_eq!(schema.version, 1);
        assert_eq!(schema.labels["label1"], "version");
        assert_eq!(get_version_schema(&dataset, &version), schema);
    }

    #[test]
    fn test_new_dataset_keeps_identity() {
        let (dataset, _) = post_dataset_metadata(
            "test dataset",
            "dataset-1",
            "description",
            "Fred",
            MetadataParams::new(),
        )
        .unwrap();
        let (version, _) = post_version_metadata(&dataset, 1, MetadataParams::new()).unwrap();
        let (travelling, _) = get_travelling_metadata(&dataset, &version);

        let result = post_travelling_metadata_to_new_dataset(&travelling, 2);
        assert_eq!(result.dataset.dataset_uuid, "dataset-1");
        assert_eq!(result.dataset.dataset_version, None);
        assert_eq!(result.version.dataset_version, Some(2));
        assert_eq!(result.version_schema.version, 2);
    }
}
