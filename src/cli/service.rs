use anyhow::{Context, Result};
use std::path::Path;

use dm_metadata::annotation::{ServiceExecutionAnnotation, ServiceInfo};
use dm_metadata::config::ValidationLimits;

use super::fields::parse_fields;
use super::store;

/// Parse a `KEY=VALUE` service parameter
pub fn parse_param(text: &str) -> Result<(String, String)> {
    let (key, value) = text
        .split_once('=')
        .with_context(|| format!("Parameter '{}' must be given as KEY=VALUE", text))?;
    Ok((key.trim().to_string(), value.trim().to_string()))
}

/// Collect the service identity and its parameters
pub fn parse_service(
    service: String,
    service_version: String,
    service_user: String,
    service_description: String,
    service_ref: String,
    params: &[String],
) -> Result<ServiceInfo> {
    let params = params
        .iter()
        .map(|p| parse_param(p))
        .collect::<Result<Vec<_>>>()?;
    Ok(ServiceInfo::new(
        service,
        service_version,
        service_user,
        service_description,
        service_ref,
    )
    .with_parameters(params))
}

/// Add a service execution annotation to the annotations file of `file`
pub fn run(
    file: &Path,
    info: ServiceInfo,
    origin: String,
    description: String,
    fields: &[String],
    limits: &ValidationLimits,
) -> Result<()> {
    let annotation = ServiceExecutionAnnotation::builder(info, origin, description)
        .fields(parse_fields(fields)?)
        .limits(limits)
        .build()
        .context("Invalid service execution")?;

    let parameters = annotation
        .parameters_to_yaml()
        .context("Failed to render service parameters")?;
    log::debug!("Service parameters:\n{}", parameters);
    let path = store::append(file, annotation.into(), limits)?;
    println!("Service execution written to {}", path.display());
    Ok(())
}
