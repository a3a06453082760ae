use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use super::error::{AnnotationValidationError, DecodeError, ValidationResult};
use super::fields::{
    check_kind, FieldMap, FieldSpec, FieldsDescriptorAnnotation, FieldsDescriptorBuilder,
};
use super::rules::{self, AnnotationType};
use super::template::TemplateSpec;
use crate::config::ValidationLimits;

/// Identity of a service run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInfo {
    /// Service (job) name
    pub service: String,
    /// Service version
    pub service_version: String,
    /// User who ran the service
    pub service_user: String,
    /// What the service does
    pub service_description: String,
    /// Link to the service documentation
    pub service_ref: String,
    /// Parameters the service was run with
    #[serde(default)]
    pub service_parameters: IndexMap<String, String>,
}

impl ServiceInfo {
    /// Create service info without parameters
    pub fn new(
        service: impl Into<String>,
        service_version: impl Into<String>,
        service_user: impl Into<String>,
        service_description: impl Into<String>,
        service_ref: impl Into<String>,
    ) -> Self {
        Self {
            service: service.into(),
            service_version: service_version.into(),
            service_user: service_user.into(),
            service_description: service_description.into(),
            service_ref: service_ref.into(),
            service_parameters: IndexMap::new(),
        }
    }

    /// Add parameters, in order
    pub fn with_parameters<K, V>(mut self, parameters: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.service_parameters
            .extend(parameters.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    fn validate(&self, limits: &ValidationLimits) -> ValidationResult<()> {
        let checks = [
            (&self.service, rules::SERVICE),
            (&self.service_version, rules::SERVICE_VERSION),
            (&self.service_user, rules::SERVICE_USER),
            (&self.service_description, rules::SERVICE_DESCRIPTION),
            (&self.service_ref, rules::SERVICE_REF),
        ];
        for (value, code) in checks {
            if !ValidationLimits::within(value, limits.text_max) {
                return Err(AnnotationValidationError::rule(
                    AnnotationType::ServiceExecution,
                    code,
                    limits.text_max,
                ));
            }
        }
        Ok(())
    }
}

/// Record of a service run together with the fields it produced.
///
/// Everything a [`FieldsDescriptorAnnotation`] offers is available through
/// [`descriptor`](Self::descriptor) and [`descriptor_mut`](Self::descriptor_mut).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "ServiceExecutionDocument")]
pub struct ServiceExecutionAnnotation {
    service: ServiceInfo,
    descriptor: FieldsDescriptorAnnotation,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ServiceExecutionDocument {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    created: Option<DateTime<Utc>>,
    #[serde(default = "default_active")]
    active: bool,
    service: String,
    service_version: String,
    service_user: String,
    service_description: String,
    service_ref: String,
    #[serde(default)]
    service_parameters: IndexMap<String, String>,
    origin: String,
    description: String,
    #[serde(default)]
    fields: IndexMap<String, FieldSpec>,
}

fn default_active() -> bool {
    true
}

impl ServiceExecutionAnnotation {
    /// Create a service execution record from raw field entries
    pub fn new(
        service: ServiceInfo,
        origin: impl Into<String>,
        description: impl Into<String>,
        fields: IndexMap<String, FieldSpec>,
    ) -> ValidationResult<Self> {
        Self::builder(service, origin, description).fields(fields).build()
    }

    /// Start building a service execution record
    pub fn builder(
        service: ServiceInfo,
        origin: impl Into<String>,
        description: impl Into<String>,
    ) -> ServiceExecutionBuilder {
        ServiceExecutionBuilder {
            service,
            descriptor: FieldsDescriptorAnnotation::builder(origin, description),
            limits: ValidationLimits::default(),
        }
    }

    pub(crate) fn from_document(
        doc: ServiceExecutionDocument,
        limits: &ValidationLimits,
    ) -> Result<Self, DecodeError> {
        check_kind(doc.kind.as_deref(), AnnotationType::ServiceExecution)?;
        let service = ServiceInfo {
            service: doc.service,
            service_version: doc.service_version,
            service_user: doc.service_user,
            service_description: doc.service_description,
            service_ref: doc.service_ref,
            service_parameters: doc.service_parameters,
        };
        let mut builder = Self::builder(service, doc.origin, doc.description)
            .fields(doc.fields)
            .active(doc.active)
            .limits(limits);
        if let Some(name) = doc.name {
            builder = builder.name(name);
        }
        builder.descriptor = builder.descriptor.created(doc.created);
        Ok(builder.build()?)
    }

    /// Identity name in a metadata log
    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    /// Creation timestamp
    pub fn created(&self) -> DateTime<Utc> {
        self.descriptor.created()
    }

    /// Whether the annotation is active
    pub fn is_active(&self) -> bool {
        self.descriptor.is_active()
    }

    /// Name of the service
    pub fn get_service(&self) -> &str {
        &self.service.service
    }

    /// Full service identity
    pub fn service_info(&self) -> &ServiceInfo {
        &self.service
    }

    /// Parameters the service was run with
    pub fn get_service_parameters(&self) -> &IndexMap<String, String> {
        &self.service.service_parameters
    }

    /// Field part of the record
    pub fn descriptor(&self) -> &FieldsDescriptorAnnotation {
        &self.descriptor
    }

    /// Mutable field part of the record
    pub fn descriptor_mut(&mut self) -> &mut FieldsDescriptorAnnotation {
        &mut self.descriptor
    }

    /// All descriptors, including inactive ones
    pub fn fields(&self) -> &FieldMap {
        self.descriptor.fields()
    }

    /// Render the parameters as a YAML mapping
    pub fn parameters_to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&self.service.service_parameters)
    }
}

impl Serialize for ServiceExecutionAnnotation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ServiceExecutionAnnotation", 13)?;
        state.serialize_field("type", AnnotationType::ServiceExecution.as_str())?;
        self.descriptor.serialize_header(&mut state)?;
        state.serialize_field("service", &self.service.service)?;
        state.serialize_field("service_version", &self.service.service_version)?;
        state.serialize_field("service_user", &self.service.service_user)?;
        state.serialize_field("service_description", &self.service.service_description)?;
        state.serialize_field("service_ref", &self.service.service_ref)?;
        state.serialize_field("service_parameters", &self.service.service_parameters)?;
        self.descriptor.serialize_body(&mut state)?;
        state.end()
    }
}

impl TryFrom<ServiceExecutionDocument> for ServiceExecutionAnnotation {
    type Error = DecodeError;

    fn try_from(doc: ServiceExecutionDocument) -> Result<Self, Self::Error> {
        Self::from_document(doc, &ValidationLimits::default())
    }
}

/// Builder for [`ServiceExecutionAnnotation`]
#[derive(Debug, Clone)]
pub struct ServiceExecutionBuilder {
    service: ServiceInfo,
    descriptor: FieldsDescriptorBuilder,
    limits: ValidationLimits,
}

impl ServiceExecutionBuilder {
    /// Add one raw field entry
    pub fn field(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.descriptor = self.descriptor.field(name, spec);
        self
    }

    /// Add many raw field entries, in order
    pub fn fields(mut self, fields: impl IntoIterator<Item = (String, FieldSpec)>) -> Self {
        self.descriptor = self.descriptor.fields(fields);
        self
    }

    /// Variables used to resolve field expressions
    pub fn template(mut self, template: TemplateSpec) -> Self {
        self.descriptor = self.descriptor.template(template);
        self
    }

    /// Set the active flag (default true)
    pub fn active(mut self, active: bool) -> Self {
        self.descriptor = self.descriptor.active(active);
        self
    }

    /// Set the identity name (defaults to a fresh UUID)
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.descriptor = self.descriptor.name(name);
        self
    }

    /// Use custom validation bounds
    pub fn limits(mut self, limits: &ValidationLimits) -> Self {
        self.limits = *limits;
        self.descriptor = self.descriptor.limits(limits);
        self
    }

    /// Validate the service fields, then the field descriptors
    pub fn build(self) -> ValidationResult<ServiceExecutionAnnotation> {
        self.service.validate(&self.limits)?;
        Ok(ServiceExecutionAnnotation {
            service: self.service,
            descriptor: self.descriptor.build()?,
        })
    }
}
