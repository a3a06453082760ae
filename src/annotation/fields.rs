use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use super::error::{AnnotationValidationError, DecodeError, ValidationResult};
use super::rules::{self, AnnotationType};
use super::template::TemplateSpec;
use crate::config::ValidationLimits;

/// Data type of a dataset field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Free text
    String,
    /// Floating point number
    Number,
    /// Integer number
    Integer,
    /// True/false
    Boolean,
    /// List of values
    Array,
    /// Nested object
    Object,
    /// Explicit null
    Null,
    /// UUID string
    Uuid,
    /// SMILES molecule notation
    Smiles,
    /// MDL molfile block
    Molfile,
}

impl FieldType {
    /// All supported types
    pub const ALL: [FieldType; 10] = [
        FieldType::String,
        FieldType::Number,
        FieldType::Integer,
        FieldType::Boolean,
        FieldType::Array,
        FieldType::Object,
        FieldType::Null,
        FieldType::Uuid,
        FieldType::Smiles,
        FieldType::Molfile,
    ];

    /// Type name as written in documents
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Integer => "integer",
            FieldType::Boolean => "boolean",
            FieldType::Array => "array",
            FieldType::Object => "object",
            FieldType::Null => "null",
            FieldType::Uuid => "uuid",
            FieldType::Smiles => "smiles",
            FieldType::Molfile => "molfile",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// Unvalidated field entry, as supplied by callers and documents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Field type name
    #[serde(rename = "type", default = "default_type")]
    pub field_type: String,

    /// Human readable description
    #[serde(default)]
    pub description: String,

    /// Whether every record must carry the field
    #[serde(default)]
    pub required: bool,

    /// Whether the field is currently in use
    #[serde(default = "default_active")]
    pub active: bool,

    /// Optional semantic type (e.g. an ontology reference)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_type: Option<String>,

    /// Template that produces the real field name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
}

fn default_type() -> String {
    FieldType::String.as_str().to_string()
}

fn default_active() -> bool {
    true
}

impl FieldSpec {
    /// Create an active, optional field of the given type
    pub fn new(field_type: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            field_type: field_type.into(),
            description: description.into(),
            required: false,
            active: true,
            semantic_type: None,
            expression: None,
        }
    }

    /// Set the required flag
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Set the active flag
    pub fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Set the semantic type
    pub fn semantic_type(mut self, semantic_type: impl Into<String>) -> Self {
        self.semantic_type = Some(semantic_type.into());
        self
    }

    /// Set a field-name expression
    pub fn expression(mut self, expression: impl Into<String>) -> Self {
        self.expression = Some(expression.into());
        self
    }
}

/// Validated field descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Field type
    #[serde(rename = "type")]
    pub field_type: FieldType,

    /// Human readable description
    pub description: String,

    /// Whether every record must carry the field
    pub required: bool,

    /// Whether the field is currently in use
    pub active: bool,

    /// Optional semantic type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_type: Option<String>,

    /// Unresolved field-name expression
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
}

impl FieldDescriptor {
    /// Create an active, optional descriptor
    pub fn new(field_type: FieldType, description: impl Into<String>) -> Self {
        Self {
            field_type,
            description: description.into(),
            required: false,
            active: true,
            semantic_type: None,
            expression: None,
        }
    }

    /// True if the field is both required and active
    pub fn is_required(&self) -> bool {
        self.required && self.active
    }

    /// Convert back to an unvalidated entry
    pub fn to_spec(&self) -> FieldSpec {
        FieldSpec {
            field_type: self.field_type.as_str().to_string(),
            description: self.description.clone(),
            required: self.required,
            active: self.active,
            semantic_type: self.semantic_type.clone(),
            expression: self.expression.clone(),
        }
    }
}

/// Ordered mapping of field name to descriptor
pub type FieldMap = IndexMap<String, FieldDescriptor>;

/// Describes the fields of a dataset as declared by one producer (`origin`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "FieldsDescriptorDocument")]
pub struct FieldsDescriptorAnnotation {
    name: String,
    created: DateTime<Utc>,
    active: bool,
    origin: String,
    description: String,
    fields: FieldMap,
    limits: ValidationLimits,
}

/// Unvalidated fields descriptor document
#[derive(Debug, Deserialize)]
pub(crate) struct FieldsDescriptorDocument {
    #[serde(rename = "type", default)]
    pub(crate) kind: Option<String>,
    #[serde(default)]
    pub(crate) name: Option<String>,
    #[serde(default)]
    pub(crate) created: Option<DateTime<Utc>>,
    #[serde(default = "default_active")]
    pub(crate) active: bool,
    pub(crate) origin: String,
    pub(crate) description: String,
    #[serde(default)]
    pub(crate) fields: IndexMap<String, FieldSpec>,
}

impl FieldsDescriptorAnnotation {
    /// Create a descriptor from raw field entries
    pub fn new(
        origin: impl Into<String>,
        description: impl Into<String>,
        fields: IndexMap<String, FieldSpec>,
    ) -> ValidationResult<Self> {
        Self::builder(origin, description).fields(fields).build()
    }

    /// Start building a descriptor
    pub fn builder(
        origin: impl Into<String>,
        description: impl Into<String>,
    ) -> FieldsDescriptorBuilder {
        FieldsDescriptorBuilder {
            origin: origin.into(),
            description: description.into(),
            fields: IndexMap::new(),
            template: None,
            active: true,
            name: None,
            created: None,
            limits: ValidationLimits::default(),
        }
    }

    pub(crate) fn from_document(
        doc: FieldsDescriptorDocument,
        limits: &ValidationLimits,
    ) -> Result<Self, DecodeError> {
        check_kind(doc.kind.as_deref(), AnnotationType::FieldsDescriptor)?;
        let mut builder = Self::builder(doc.origin, doc.description)
            .fields(doc.fields)
            .active(doc.active)
            .limits(limits)
            .created(doc.created);
        builder.name = doc.name;
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

    /// Whether the annotation is active
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Producer of the fields
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Description of the producer's output
    pub fn description(&self) -> &str {
        &self.description
    }

    /// All descriptors, including inactive ones
    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    /// Upsert one field. The descriptor replaces any previous one wholesale.
    pub fn add_field(&mut self, name: impl Into<String>, spec: FieldSpec) -> ValidationResult<()> {
        let name = name.into();
        let descriptor = validate_field(&name, spec, &self.limits)?;
        self.fields.insert(name, descriptor);
        Ok(())
    }

    /// Upsert many fields in the given order
    pub fn add_fields<'a, I>(&mut self, fields: I) -> ValidationResult<()>
    where
        I: IntoIterator<Item = (&'a String, &'a FieldDescriptor)>,
    {
        for (name, descriptor) in fields {
            check_field_name(name, &self.limits)?;
            self.fields.insert(name.clone(), descriptor.clone());
        }
        Ok(())
    }

    /// Name and descriptor of one field
    pub fn get_field(&self, name: &str) -> Option<(&String, &FieldDescriptor)> {
        self.fields.get_key_value(name)
    }

    /// Descriptor of one field
    pub fn get_property(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.get(name)
    }

    /// Fields filtered by activity
    pub fn get_fields(&self, include_inactive: bool) -> FieldMap {
        self.fields
            .iter()
            .filter(|(_, d)| include_inactive || d.active)
            .map(|(n, d)| (n.clone(), d.clone()))
            .collect()
    }

    /// Delete a field, keeping the order of the rest
    pub fn remove_field(&mut self, name: &str) -> Option<FieldDescriptor> {
        self.fields.shift_remove(name)
    }

    pub(crate) fn serialize_body<S: SerializeStruct>(&self, state: &mut S) -> Result<(), S::Error> {
        state.serialize_field("origin", &self.origin)?;
        state.serialize_field("description", &self.description)?;
        state.serialize_field("fields", &self.fields)
    }

    pub(crate) fn serialize_header<S: SerializeStruct>(&self, state: &mut S) -> Result<(), S::Error> {
        state.serialize_field("name", &self.name)?;
        state.serialize_field("created", &self.created)?;
        state.serialize_field("active", &self.active)
    }
}

impl Serialize for FieldsDescriptorAnnotation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("FieldsDescriptorAnnotation", 7)?;
        state.serialize_field("type", AnnotationType::FieldsDescriptor.as_str())?;
        self.serialize_header(&mut state)?;
        self.serialize_body(&mut state)?;
        state.end()
    }
}

impl TryFrom<FieldsDescriptorDocument> for FieldsDescriptorAnnotation {
    type Error = DecodeError;

    fn try_from(doc: FieldsDescriptorDocument) -> Result<Self, Self::Error> {
        Self::from_document(doc, &ValidationLimits::default())
    }
}

pub(crate) fn check_kind(kind: Option<&str>, expected: AnnotationType) -> Result<(), DecodeError> {
    if let Some(kind) = kind {
        let found = kind
            .parse::<AnnotationType>()
            .map_err(DecodeError::UnknownAnnotationType)?;
        if found != expected {
            return Err(DecodeError::UnexpectedType { expected, found });
        }
    }
    Ok(())
}

fn check_field_name(name: &str, limits: &ValidationLimits) -> ValidationResult<()> {
    if ValidationLimits::within(name, limits.field_name_max) {
        Ok(())
    } else {
        Err(AnnotationValidationError::field_rule(
            AnnotationType::FieldsDescriptor,
            rules::FIELDS_NAME,
            name,
            rules::render(
                AnnotationType::FieldsDescriptor,
                rules::FIELDS_NAME,
                limits.field_name_max,
            ),
        ))
    }
}

fn validate_field(
    name: &str,
    spec: FieldSpec,
    limits: &ValidationLimits,
) -> ValidationResult<FieldDescriptor> {
    check_field_name(name, limits)?;
    let field_type = spec.field_type.parse::<FieldType>().map_err(|unknown| {
        AnnotationValidationError::field_rule(
            AnnotationType::FieldsDescriptor,
            rules::FIELDS_UNKNOWN_TYPE,
            name,
            format!("unknown field type: {}", unknown),
        )
    })?;

    Ok(FieldDescriptor {
        field_type,
        description: spec.description,
        required: spec.required,
        active: spec.active,
        semantic_type: spec.semantic_type,
        expression: spec.expression,
    })
}

/// Builder for [`FieldsDescriptorAnnotation`]
#[derive(Debug, Clone)]
pub struct FieldsDescriptorBuilder {
    origin: String,
    description: String,
    fields: IndexMap<String, FieldSpec>,
    template: Option<TemplateSpec>,
    active: bool,
    name: Option<String>,
    created: Option<DateTime<Utc>>,
    limits: ValidationLimits,
}

impl FieldsDescriptorBuilder {
    /// Add one raw field entry
    pub fn field(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.fields.insert(name.into(), spec);
        self
    }

    /// Add many raw field entries, in order
    pub fn fields(mut self, fields: impl IntoIterator<Item = (String, FieldSpec)>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Variables used to resolve field expressions
    pub fn template(mut self, template: TemplateSpec) -> Self {
        self.template = Some(template);
        self
    }

    /// Set the active flag (default true)
    pub fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Set the identity name (defaults to a fresh UUID)
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Use custom validation bounds
    pub fn limits(mut self, limits: &ValidationLimits) -> Self {
        self.limits = *limits;
        self
    }

    pub(crate) fn created(mut self, created: Option<DateTime<Utc>>) -> Self {
        self.created = created;
        self
    }

    /// Validate and build the annotation
    pub fn build(self) -> ValidationResult<FieldsDescriptorAnnotation> {
        let t = AnnotationType::FieldsDescriptor;
        let limits = self.limits;
        if !ValidationLimits::within(&self.origin, limits.text_max) {
            return Err(AnnotationValidationError::rule(t, rules::FIELDS_ORIGIN, limits.text_max));
        }
        if !ValidationLimits::within(&self.description, limits.text_max) {
            return Err(AnnotationValidationError::rule(
                t,
                rules::FIELDS_DESCRIPTION,
                limits.text_max,
            ));
        }

        let mut fields = FieldMap::with_capacity(self.fields.len());
        for (declared, mut spec) in self.fields {
            let name = match (spec.expression.take(), &self.template) {
                (Some(expression), Some(template)) => {
                    template.render(&expression).map_err(|variable| {
                        AnnotationValidationError::field_rule(
                            t,
                            rules::FIELDS_EXPRESSION,
                            &declared,
                            format!(
                                "{}: {}",
                                rules::render(t, rules::FIELDS_EXPRESSION, 0),
                                variable
                            ),
                        )
                    })?
                }
                (expression, _) => {
                    spec.expression = expression;
                    declared
                }
            };
            if fields.contains_key(&name) {
                return Err(AnnotationValidationError::field_rule(
                    t,
                    rules::FIELDS_DUPLICATE,
                    &name,
                    rules::render(t, rules::FIELDS_DUPLICATE, 0),
                ));
            }
            let descriptor = validate_field(&name, spec, &limits)?;
            fields.insert(name, descriptor);
        }

        Ok(FieldsDescriptorAnnotation {
            name: self
                .name
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            created: self.created.unwrap_or_else(Utc::now),
            active: self.active,
            origin: self.origin,
            description: self.description,
            fields,
            limits,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input_fields() -> IndexMap<String, FieldSpec> {
        IndexMap::from([
            (
                "smiles".to_string(),
                FieldSpec::new("string", "standardized smiles").required(true),
            ),
            (
                "uuid".to_string(),
                FieldSpec::new("string", "Molecule Identifier").required(true),
            ),
            ("id".to_string(), FieldSpec::new("string", "File Identifier")),
            (
                "dynamic".to_string(),
                FieldSpec::new("string", "A dynamically named field")
                    .expression("{{ dynamicFieldName }}"),
            ),
        ])
    }

    #[test]
    fn test_expression_resolves_field_name() {
        let annotation = FieldsDescriptorAnnotation::builder("Supplier 1", "A description")
            .fields(input_fields())
            .template(TemplateSpec::new().with_variable("dynamicFieldName", "my_name"))
            .build()
            .unwrap();

        let names: Vec<&str> = annotation.fields().keys().map(String::as_str).collect();
        assert_eq!(names, ["smiles", "uuid", "id", "my_name"]);
        let resolved = annotation.get_property("my_name").unwrap();
        assert_eq!(resolved.expression, None);
        assert_eq!(resolved.description, "A dynamically named field");
        assert!(annotation.get_property("dynamic").is_none());
    }

    #[test]
    fn test_expression_kept_without_template() {
        let annotation =
            FieldsDescriptorAnnotation::new("Supplier 1", "A description", input_fields()).unwrap();
        let field = annotation.get_property("dynamic").unwrap();
        assert_eq!(field.expression.as_deref(), Some("{{ dynamicFieldName }}"));
    }

    #[test]
    fn test_expression_undefined_variable() {
        let err = FieldsDescriptorAnnotation::builder("Supplier 1", "A description")
            .fields(input_fields())
            .template(TemplateSpec::new())
            .build()
            .unwrap_err();
        assert_eq!(err.code, rules::FIELDS_EXPRESSION);
        assert!(err.message.contains("dynamicFieldName"));
    }

    #[test]
    fn test_expression_colliding_with_declared_field() {
        let err = FieldsDescriptorAnnotation::builder("Supplier 1", "A description")
            .fields(input_fields())
            .template(TemplateSpec::new().with_variable("dynamicFieldName", "smiles"))
            .build()
            .unwrap_err();
        assert_eq!(err.annotation_type, AnnotationType::FieldsDescriptor);
        assert_eq!(err.code, rules::FIELDS_DUPLICATE);
        assert_eq!(
            err.message,
            "Field name: smiles, field name is declared more than once"
        );
    }

    #[test]
    fn test_add_field_overwrites_descriptor() {
        let mut annotation =
            FieldsDescriptorAnnotation::new("Supplier 1", "A description", input_fields()).unwrap();
        let original = annotation.get_property("id").unwrap().clone();

        annotation
            .add_field("id", FieldSpec::new("number", ""))
            .unwrap();
        assert_ne!(annotation.get_property("id").unwrap(), &original);
        assert_eq!(annotation.get_property("id").unwrap().field_type, FieldType::Number);

        annotation
            .add_field("id", FieldSpec::new("string", "").active(false))
            .unwrap();
        assert_eq!(annotation.get_fields(false).len(), 3);
        assert_eq!(annotation.get_fields(true).len(), 4);

        // Position is kept on overwrite
        assert_eq!(annotation.fields().get_index_of("id"), Some(2));
    }

    #[test]
    fn test_transfer_fields() {
        let mut source =
            FieldsDescriptorAnnotation::new("Supplier 1", "A description", input_fields()).unwrap();
        source
            .add_field("id", FieldSpec::new("string", "").active(false))
            .unwrap();

        let mut target =
            FieldsDescriptorAnnotation::new("Supplier 1", "A description", IndexMap::new())
                .unwrap();
        target.add_fields(&source.get_fields(false)).unwrap();
        assert_eq!(source.get_fields(false), target.get_fields(false));

        target.add_fields(source.fields()).unwrap();
        assert_eq!(source.get_fields(true), target.get_fields(true));
    }

    #[test]
    fn test_remove_field() {
        let mut annotation =
            FieldsDescriptorAnnotation::new("Supplier 1", "A description", input_fields()).unwrap();
        assert!(annotation.remove_field("uuid").is_some());
        assert!(annotation.remove_field("uuid").is_none());
        assert_eq!(annotation.get_field("id").map(|(n, _)| n.as_str()), Some("id"));
        assert_eq!(annotation.fields().get_index_of("id"), Some(1));
    }

    #[test]
    fn test_origin_and_description_bounds() {
        let invalid = "x".repeat(256);
        let err = FieldsDescriptorAnnotation::new(invalid.clone(), "A description", input_fields())
            .unwrap_err();
        assert_eq!(err.annotation_type, AnnotationType::FieldsDescriptor);
        assert_eq!(err.code, rules::FIELDS_ORIGIN);

        let err =
            FieldsDescriptorAnnotation::new("supplier 1", invalid, input_fields()).unwrap_err();
        assert_eq!(err.code, rules::FIELDS_DESCRIPTION);
    }

    #[test]
    fn test_field_name_bounds() {
        let long = format!("smilesvery{}", "x".repeat(53));
        let fields = IndexMap::from([(long.clone(), FieldSpec::new("string", "s"))]);
        let err = FieldsDescriptorAnnotation::new("Supplier x", "A description", fields)
            .unwrap_err();
        assert_eq!(err.code, rules::FIELDS_NAME);
        assert_eq!(
            err.message,
            format!("Field name: {}, length must be from 1 to 50 characters", long)
        );

        let fields = IndexMap::from([(String::new(), FieldSpec::new("string", "s"))]);
        let err = FieldsDescriptorAnnotation::new("Supplier x", "A description", fields)
            .unwrap_err();
        assert_eq!(err.code, rules::FIELDS_NAME);
    }

    #[test]
    fn test_unknown_field_type() {
        let fields = IndexMap::from([("smiles".to_string(), FieldSpec::new("blob", "s"))]);
        let err = FieldsDescriptorAnnotation::new("Supplier x", "A description", fields)
            .unwrap_err();
        assert_eq!(err.annotation_type, AnnotationType::FieldsDescriptor);
        assert_eq!(err.code, 4);
    }

    #[test]
    fn test_document_shape() {
        let annotation = FieldsDescriptorAnnotation::builder("Supplier 1", "A description")
            .name("fd1")
            .field("smiles", FieldSpec::new("smiles", "standardized smiles").required(true))
            .build()
            .unwrap();
        let value = serde_json::to_value(&annotation).unwrap();
        assert_eq!(value["type"], "FieldsDescriptorAnnotation");
        assert_eq!(value["name"], "fd1");
        assert_eq!(value["fields"]["smiles"]["type"], "smiles");
        assert_eq!(value["fields"]["smiles"]["required"], true);
        assert!(value["fields"]["smiles"].get("expression").is_none());

        let restored: FieldsDescriptorAnnotation = serde_json::from_value(value).unwrap();
        assert_eq!(restored, annotation);
    }

    #[test]
    fn test_field_spec_defaults() {
        let spec: FieldSpec = serde_json::from_str(r#"{"description": "test1", "required": true}"#)
            .unwrap();
        assert_eq!(spec.field_type, "string");
        assert!(spec.active);
        assert!(spec.required);
    }
}
