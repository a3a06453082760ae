//! # dm-metadata - Dataset Annotation Metadata
//!
//! `dm_metadata` tracks metadata about scientific datasets as an ordered log of
//! typed **annotations** and compiles that log into a JSON Schema that downstream
//! tools can consume.
//!
//! ## Key Features
//!
//! - **Validated annotations**: labels, field descriptors, service execution
//!   records and property changes are checked against a numbered rule table
//!   when they are built. Construction either succeeds or fails with
//!   `{annotation_type, code, message}`.
//!
//! - **Deterministic compilation**: field descriptors from many producers fold
//!   into one ordered, last-writer-wins field map. The required list is an
//!   append-once ordered set.
//!
//! - **Label history**: every label change is kept; the latest entry for a label
//!   is its current state.
//!
//! - **Byte-identical round trips**: a metadata document reloaded and written
//!   again is unchanged.
//!
//! ## Quick Start
//!
//! ```rust
//! use dm_metadata::prelude::*;
//!
//! let mut metadata = Metadata::new("test", "0000-1111", "", "Bob");
//!
//! let fields = FieldsDescriptorAnnotation::builder("Supplier 1", "A description")
//!     .field("smiles", FieldSpec::new("smiles", "").required(true))
//!     .field("uuid", FieldSpec::new("uuid", "").required(true))
//!     .field("id", FieldSpec::new("string", ""))
//!     .build()?;
//! metadata.add_annotation(fields);
//! metadata.add_annotation(LabelAnnotation::new("label1", "value1")?);
//!
//! let schema = metadata.get_json_schema();
//! assert_eq!(schema.required, vec!["smiles", "uuid"]);
//! assert_eq!(schema.labels["label1"], "value1");
//! # Ok::<(), dm_metadata::metadata::MetadataError>(())
//! ```
//!
//! ## Architecture
//!
//! The library is organized into the following modules:
//!
//! - [`annotation`]: annotation kinds, validation rules and document decoding
//! - [`metadata`]: the [`Metadata`](metadata::Metadata) aggregate and the schema compiler
//! - [`data_tier`]: dataset, version and travelling metadata lifecycle functions
//! - [`config`]: validation bounds and TOML configuration
//!
//! ## Document Shapes
//!
//! | Document | Keys |
//! |----------|------|
//! | Metadata | `dataset_name`, `dataset_uuid`, `description`, `created_by`, `created`, `metadata_version`, `dataset_version`?, `synchronised_datetime`, `annotations`, `labels` |
//! | JSON Schema | `$schema`, `$id`, `title`, `description`, `version`, `type`, `fields`, `required`, `labels` |

// Documentation lints - enforce complete documentation for publication
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

pub mod annotation;
pub mod config;
pub mod data_tier;
pub mod metadata;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::annotation::{
        decode_annotation, Annotation, AnnotationType, AnnotationValidationError, DecodeError,
        FieldDescriptor, FieldSpec, FieldType, FieldsDescriptorAnnotation, LabelAnnotation,
        LabelKind, PropertyChangeAnnotation, ServiceExecutionAnnotation, ServiceInfo,
        TemplateSpec,
    };
    pub use crate::config::{Config, ConfigError, ValidationLimits};
    pub use crate::data_tier::{MetadataParams, Reintegration};
    pub use crate::metadata::{
        CompiledFields, JsonSchema, Metadata, MetadataDocument, MetadataError, DEFAULT_SYNC_TIME,
        METADATA_VERSION,
    };
}
