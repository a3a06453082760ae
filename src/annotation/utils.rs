//! Helpers used by annotation producers.

use std::path::Path;

use super::fields::FieldType;

/// Extension of the annotations file kept next to a results file
pub const ANNOTATIONS_EXTENSION: &str = "annotations";

/// Guess the schema type of a field from one sample value
pub fn estimate_field_type(value: &str) -> FieldType {
    let value = value.trim();
    if value.parse::<i64>().is_ok() {
        FieldType::Integer
    } else if value.parse::<f64>().is_ok() {
        FieldType::Number
    } else if value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("false") {
        FieldType::Boolean
    } else if value.contains(',') {
        FieldType::Array
    } else {
        FieldType::String
    }
}

/// Name of the annotations file belonging to `file_name` (`<stem>.annotations`)
pub fn annotation_filename(file_name: impl AsRef<Path>) -> String {
    let stem = file_name
        .as_ref()
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{}.{}", stem, ANNOTATIONS_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_field_type() {
        assert_eq!(estimate_field_type("1"), FieldType::Integer);
        assert_eq!(estimate_field_type("1.1"), FieldType::Number);
        assert_eq!(estimate_field_type("True"), FieldType::Boolean);
        assert_eq!(estimate_field_type("False"), FieldType::Boolean);
        assert_eq!(
            estimate_field_type("O=C(CSCc1ccc(Cl)s1)N1CCC(O)CC1"),
            FieldType::String
        );
        assert_eq!(estimate_field_type("1,2,3"), FieldType::Array);
        assert_eq!(estimate_field_type("ID1234"), FieldType::String);
    }

    #[test]
    fn test_annotation_filename() {
        assert_eq!(annotation_filename("results.sdf"), "results.annotations");
        assert_eq!(annotation_filename("out/poses.sdf.gz"), "poses.sdf.annotations");
        assert_eq!(annotation_filename("plain"), "plain.annotations");
    }
}
