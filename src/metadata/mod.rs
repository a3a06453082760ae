//! # Dataset Metadata
//!
//! The [`Metadata`] aggregate owns the identity of a dataset (or dataset
//! version), an ordered annotation log and an append-only label log. Everything
//! else is derived on demand:
//!
//! - [`Metadata::get_labels`] / [`Metadata::label_values`]: one resolved entry
//!   per label key, the most recently added entry winning
//! - [`Metadata::get_compiled_fields`]: last-writer-wins union of all field
//!   descriptors, in first-seen order
//! - [`Metadata::get_json_schema`]: the effective [`JsonSchema`]
//!
//! ## Serialization
//!
//! [`MetadataDocument`] is the stored shape. Reloading a document and writing
//! it again yields the same bytes:
//!
//! ```
//! use dm_metadata::metadata::Metadata;
//! use dm_metadata::annotation::LabelAnnotation;
//!
//! let mut metadata = Metadata::new("test", "0000-1111", "", "Bob");
//! metadata.add_label(LabelAnnotation::new("label1", "value1").unwrap());
//!
//! let json = metadata.to_json().unwrap();
//! let restored = Metadata::from_json(&json).unwrap();
//! assert_eq!(restored.to_json().unwrap(), json);
//! ```

mod dataset;
mod document;
mod error;
pub mod labels;
pub mod schema;

#[cfg(test)]
mod tests;

pub use dataset::Metadata;
pub use document::{MetadataDocument, DEFAULT_SYNC_TIME, METADATA_VERSION};
pub use error::MetadataError;
pub use schema::{CompiledFields, JsonSchema, SchemaField, SCHEMA_DIALECT, SCHEMA_ID};
