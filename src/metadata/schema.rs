//! Schema compiler.
//!
//! Pure functions over an annotation log. Fields are folded in log order into an
//! ordered map where a later descriptor replaces an earlier one of the same name
//! but keeps its first-seen position. Required names are collected into an
//! ordered set that only grows during the fold.

use indexmap::{IndexMap, IndexSet};
use log::trace;
use serde::{Deserialize, Serialize};

use crate::annotation::{Annotation, FieldDescriptor, FieldMap, FieldType};

/// JSON Schema dialect announced in `$schema`
pub const SCHEMA_DIALECT: &str = "http://json-schema.org/draft/2019-09/schema#";

/// Value of `$id` in every generated schema
pub const SCHEMA_ID: &str = "https://example.com/product.schema.json";

/// Last-writer-wins union of every field descriptor in a log, inactive included
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompiledFields {
    /// Field name → descriptor, in first-seen order
    pub fields: FieldMap,
}

impl CompiledFields {
    /// Active descriptors only
    pub fn active(&self) -> impl Iterator<Item = (&String, &FieldDescriptor)> {
        self.fields.iter().filter(|(_, descriptor)| descriptor.active)
    }

    /// Number of compiled fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True if no annotation declared a field
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Field entry of a JSON Schema: the projection of a descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaField {
    /// Field type
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Field description
    pub description: String,
}

/// Effective JSON Schema of a dataset or dataset version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonSchema {
    /// Schema dialect
    #[serde(rename = "$schema")]
    pub schema: String,
    /// Schema identifier
    #[serde(rename = "$id")]
    pub id: String,
    /// Dataset name
    pub title: String,
    /// Dataset description
    pub description: String,
    /// 0 for a dataset, the version number for a version
    pub version: u32,
    /// Always `"object"`
    #[serde(rename = "type")]
    pub schema_type: String,
    /// Active compiled fields
    pub fields: IndexMap<String, SchemaField>,
    /// Field names that have been required and active
    pub required: Vec<String>,
    /// Active labels, name → value
    pub labels: IndexMap<String, String>,
}

impl JsonSchema {
    /// Assemble a schema from compiled parts
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        version: u32,
        compiled: &CompiledFields,
        required: IndexSet<String>,
        labels: IndexMap<String, String>,
    ) -> Self {
        let fields = compiled
            .active()
            .map(|(name, descriptor)| {
                (
                    name.clone(),
                    SchemaField {
                        field_type: descriptor.field_type,
                        description: descriptor.description.clone(),
                    },
                )
            })
            .collect();

        Self {
            schema: SCHEMA_DIALECT.to_string(),
            id: SCHEMA_ID.to_string(),
            title: title.into(),
            description: description.into(),
            version,
            schema_type: "object".to_string(),
            fields,
            required: required.into_iter().collect(),
            labels,
        }
    }

    /// Serialize to a JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Fold every field-declaring annotation in log order
pub fn compile_fields<'a, I>(annotations: I) -> CompiledFields
where
    I: IntoIterator<Item = &'a Annotation>,
{
    let mut fields = FieldMap::new();
    for annotation in annotations {
        let Some(declared) = annotation.fields() else {
            continue;
        };
        trace!(
            "Folding {} fields from {} '{}'",
            declared.len(),
            annotation.annotation_type(),
            annotation.name()
        );
        for (name, descriptor) in declared {
            fields.insert(name.clone(), descriptor.clone());
        }
    }
    CompiledFields { fields }
}

/// Ordered set of names seen required and active while folding the log
pub fn compile_required<'a, I>(annotations: I) -> IndexSet<String>
where
    I: IntoIterator<Item = &'a Annotation>,
{
    let mut required = IndexSet::new();
    for declared in annotations.into_iter().filter_map(Annotation::fields) {
        for (name, descriptor) in declared {
            if descriptor.is_required() && !required.contains(name) {
                trace!("Field '{}' is required", name);
                required.insert(name.clone());
            }
        }
    }
    required
}
