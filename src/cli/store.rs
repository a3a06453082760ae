//! Annotations file kept next to a results file.

use anyhow::{Context, Result};
use log::{debug, info};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use dm_metadata::annotation::utils::annotation_filename;
use dm_metadata::annotation::Annotation;
use dm_metadata::config::ValidationLimits;
use dm_metadata::metadata::Metadata;

/// Path of the annotations file belonging to `file`
pub fn annotations_path(file: &Path) -> PathBuf {
    file.with_file_name(annotation_filename(file))
}

/// Load the existing annotations of `file` into a holder aggregate
fn load(path: &Path, limits: &ValidationLimits) -> Result<Metadata> {
    let mut holder = Metadata::new("dm", "dm", "dm", "dm").with_limits(*limits);
    if path.exists() {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read annotations file: {}", path.display()))?;
        let documents: serde_json::Value = serde_json::from_str(&text)
            .with_context(|| format!("Invalid JSON in annotations file: {}", path.display()))?;
        let count = holder
            .add_annotations(documents)
            .with_context(|| format!("Invalid annotation in {}", path.display()))?;
        debug!("Loaded {} annotations from {}", count, path.display());
    }
    Ok(holder)
}

/// Append `annotation` to the annotations file of `file`.
///
/// The file holds one JSON array: the annotation log followed by the label log.
pub fn append(file: &Path, annotation: Annotation, limits: &ValidationLimits) -> Result<PathBuf> {
    let path = annotations_path(file);
    let mut holder = load(&path, limits)?;

    let kind = annotation.annotation_type();
    let name = annotation.name().to_string();
    holder.add_annotation(annotation);

    let mut documents = Vec::with_capacity(holder.annotations().len() + holder.label_log().len());
    for annotation in holder.annotations() {
        documents.push(serde_json::to_value(annotation)?);
    }
    for label in holder.label_log() {
        documents.push(serde_json::to_value(label)?);
    }

    let json = serde_json::to_string_pretty(&documents)?;
    write_atomic(&path, json.as_bytes())
        .with_context(|| format!("Failed to write annotations file: {}", path.display()))?;

    info!("Added {} '{}' to {}", kind, name, path.display());
    Ok(path)
}

/// Write through a temp file in the same directory, then rename over `path`
fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp_file = NamedTempFile::new_in(dir)?;
    temp_file.write_all(contents)?;
    temp_file.as_file().sync_all()?;
    temp_file.persist(path).map_err(|e| e.error)?;
    Ok(())
}
