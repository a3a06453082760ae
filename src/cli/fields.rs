use anyhow::{bail, Context, Result};
use std::path::Path;

use dm_metadata::annotation::{FieldSpec, FieldsDescriptorAnnotation};
use dm_metadata::config::ValidationLimits;

use super::store;

/// Parse `name,type,description[,required[,active[,semantic_type]]]`
pub fn parse_field(text: &str) -> Result<(String, FieldSpec)> {
    let parts: Vec<&str> = text.splitn(6, ',').map(str::trim).collect();
    if parts.len() < 3 {
        bail!(
            "Field '{}' must be given as name,type,description[,required[,active[,semantic_type]]]",
            text
        );
    }

    let mut spec = FieldSpec::new(parts[1], parts[2]);
    if let Some(required) = parts.get(3) {
        spec = spec.required(parse_flag(required).context("Invalid required flag")?);
    }
    if let Some(active) = parts.get(4) {
        spec = spec.active(parse_flag(active).context("Invalid active flag")?);
    }
    if let Some(semantic_type) = parts.get(5).filter(|s| !s.is_empty()) {
        spec = spec.semantic_type(*semantic_type);
    }
    Ok((parts[0].to_string(), spec))
}

fn parse_flag(text: &str) -> Result<bool> {
    match text.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        other => bail!("expected true or false, found '{}'", other),
    }
}

/// Parse every `--field` argument, in order
pub fn parse_fields(fields: &[String]) -> Result<Vec<(String, FieldSpec)>> {
    fields.iter().map(|f| parse_field(f)).collect()
}

/// Add a fields descriptor annotation to the annotations file of `file`
pub fn run(
    file: &Path,
    origin: String,
    description: String,
    fields: &[String],
    name: Option<String>,
    limits: &ValidationLimits,
) -> Result<()> {
    let mut builder = FieldsDescriptorAnnotation::builder(origin, description)
        .fields(parse_fields(fields)?)
        .limits(limits);
    if let Some(name) = name {
        builder = builder.name(name);
    }
    let annotation = builder.build().context("Invalid fields descriptor")?;

    let path = store::append(file, annotation.into(), limits)?;
    println!("Fields descriptor written to {}", path.display());
    Ok(())
}
