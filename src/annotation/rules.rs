//! Validation rule tables.
//!
//! Every annotation kind has a fixed, numbered list of constraints. The codes are
//! stable and the messages are surfaced verbatim to callers, with `{max}` replaced
//! by the bound that was in force when the rule fired.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Discriminator of an annotation document (`type` key)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnnotationType {
    /// Free-text label attached to a dataset
    #[serde(rename = "LabelAnnotation")]
    Label,
    /// Description of the fields present in a dataset
    #[serde(rename = "FieldsDescriptorAnnotation")]
    FieldsDescriptor,
    /// Record of a service run that produced or changed fields
    #[serde(rename = "ServiceExecutionAnnotation")]
    ServiceExecution,
    /// Record of a change to a metadata property
    #[serde(rename = "PropertyChangeAnnotation")]
    PropertyChange,
}

impl AnnotationType {
    /// All known discriminators, in dispatch order
    pub const ALL: [AnnotationType; 4] = [
        AnnotationType::Label,
        AnnotationType::FieldsDescriptor,
        AnnotationType::ServiceExecution,
        AnnotationType::PropertyChange,
    ];

    /// The discriminator string used in documents
    pub fn as_str(&self) -> &'static str {
        match self {
            AnnotationType::Label => "LabelAnnotation",
            AnnotationType::FieldsDescriptor => "FieldsDescriptorAnnotation",
            AnnotationType::ServiceExecution => "ServiceExecutionAnnotation",
            AnnotationType::PropertyChange => "PropertyChangeAnnotation",
        }
    }
}

impl fmt::Display for AnnotationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnnotationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// A single numbered constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    /// Stable error code
    pub code: u16,
    /// Message template (`{max}` is substituted)
    pub message: &'static str,
}

const fn rule(code: u16, message: &'static str) -> Rule {
    Rule { code, message }
}

/// Label rule: label length
pub const LABEL_LENGTH: u16 = 1;
/// Label rule: value length
pub const LABEL_VALUE_LENGTH: u16 = 2;
/// Label rule: reference without `@` prefix
pub const LABEL_REFERENCE: u16 = 3;

/// Fields descriptor rule: origin length
pub const FIELDS_ORIGIN: u16 = 1;
/// Fields descriptor rule: description length
pub const FIELDS_DESCRIPTION: u16 = 2;
/// Fields descriptor rule: field name length
pub const FIELDS_NAME: u16 = 3;
/// Fields descriptor rule: field type not in the enumeration
pub const FIELDS_UNKNOWN_TYPE: u16 = 4;
/// Fields descriptor rule: template variable missing
pub const FIELDS_EXPRESSION: u16 = 5;
/// Fields descriptor rule: two entries resolve to the same field name
pub const FIELDS_DUPLICATE: u16 = 6;

/// Service execution rules, in declaration order of the service fields
pub const SERVICE: u16 = 1;
/// Service execution rule: service version
pub const SERVICE_VERSION: u16 = 2;
/// Service execution rule: service user
pub const SERVICE_USER: u16 = 3;
/// Service execution rule: service description
pub const SERVICE_DESCRIPTION: u16 = 4;
/// Service execution rule: service reference
pub const SERVICE_REF: u16 = 5;

/// Property change rule: property name
pub const PROPERTY_NAME: u16 = 1;

/// Rule table: annotation type → numbered constraint → violation message
pub static ANNOTATION_ERRORS: &[(AnnotationType, &[Rule])] = &[
    (
        AnnotationType::Label,
        &[
            rule(LABEL_LENGTH, "Label must be from 1 to {max} characters"),
            rule(LABEL_VALUE_LENGTH, "Label value must be no more than {max} characters"),
            rule(LABEL_REFERENCE, "A label reference requires an '@' prefixed label"),
        ],
    ),
    (
        AnnotationType::FieldsDescriptor,
        &[
            rule(FIELDS_ORIGIN, "Origin must be from 1 to {max} characters"),
            rule(FIELDS_DESCRIPTION, "Description must be from 1 to {max} characters"),
            rule(FIELDS_NAME, "length must be from 1 to {max} characters"),
            rule(FIELDS_UNKNOWN_TYPE, "Unknown field type"),
            rule(FIELDS_EXPRESSION, "Expression refers to an undefined variable"),
            rule(FIELDS_DUPLICATE, "field name is declared more than once"),
        ],
    ),
    (
        AnnotationType::ServiceExecution,
        &[
            rule(SERVICE, "Service must be from 1 to {max} characters"),
            rule(SERVICE_VERSION, "Service version must be from 1 to {max} characters"),
            rule(SERVICE_USER, "Service user must be from 1 to {max} characters"),
            rule(
                SERVICE_DESCRIPTION,
                "Service description must be from 1 to {max} characters",
            ),
            rule(SERVICE_REF, "Service reference must be from 1 to {max} characters"),
        ],
    ),
    (
        AnnotationType::PropertyChange,
        &[rule(PROPERTY_NAME, "Property name must be from 1 to {max} characters")],
    ),
];

/// Look up a rule by annotation type and code
pub fn lookup(annotation_type: AnnotationType, code: u16) -> Option<&'static Rule> {
    ANNOTATION_ERRORS
        .iter()
        .find(|(t, _)| *t == annotation_type)
        .and_then(|(_, rules)| rules.iter().find(|r| r.code == code))
}

/// Render the message of a rule, substituting `{max}`
pub fn render(annotation_type: AnnotationType, code: u16, max: usize) -> String {
    match lookup(annotation_type, code) {
        Some(rule) => rule.message.replace("{max}", &max.to_string()),
        None => format!("Unknown validation rule {}", code),
    }
}
