use anyhow::{Context, Result};
use std::path::Path;

use dm_metadata::annotation::LabelAnnotation;
use dm_metadata::config::ValidationLimits;

use super::store;

/// Add a label annotation to the annotations file of `file`
pub fn run(
    file: &Path,
    label: String,
    value: Option<String>,
    reference: Option<String>,
    active: bool,
    limits: &ValidationLimits,
) -> Result<()> {
    let mut builder = LabelAnnotation::builder(label)
        .value(value.unwrap_or_default())
        .active(active)
        .limits(limits);
    if let Some(reference) = reference {
        builder = builder.reference(reference);
    }
    let annotation = builder.build().context("Invalid label")?;

    let path = store::append(file, annotation.into(), limits)?;
    println!("Label written to {}", path.display());
    Ok(())
}
