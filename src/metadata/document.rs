use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::annotation::{Annotation, LabelAnnotation};

/// Version tag written into every metadata document
pub const METADATA_VERSION: &str = "0.0.1";

/// `synchronised_datetime` of metadata that has never been synchronised
pub const DEFAULT_SYNC_TIME: &str = "2000-01-01T00:00:00+00:00";

/// Serialized shape of a [`Metadata`](super::Metadata) aggregate.
///
/// Key order is the declaration order below and lists keep log order, so a
/// document re-serialized after a reload is byte-identical to the original.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataDocument {
    /// Dataset name
    pub dataset_name: String,

    /// Dataset identifier
    pub dataset_uuid: String,

    /// Dataset description
    #[serde(default)]
    pub description: String,

    /// Dataset owner
    #[serde(default)]
    pub created_by: String,

    /// Creation timestamp, the load time when the document has none
    #[serde(default = "Utc::now")]
    pub created: DateTime<Utc>,

    /// Document format version
    #[serde(default = "default_metadata_version")]
    pub metadata_version: String,

    /// Version number of version-scoped documents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_version: Option<u32>,

    /// Last synchronisation time, RFC 3339
    #[serde(default = "default_sync_time")]
    pub synchronised_datetime: String,

    /// Annotation log
    #[serde(default)]
    pub annotations: Vec<Annotation>,

    /// Label log
    #[serde(default)]
    pub labels: Vec<LabelAnnotation>,
}

fn default_metadata_version() -> String {
    METADATA_VERSION.to_string()
}

fn default_sync_time() -> String {
    DEFAULT_SYNC_TIME.to_string()
}

impl MetadataDocument {
    /// Serialize to a JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse a JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
