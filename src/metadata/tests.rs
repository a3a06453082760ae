use super::*;
use crate::annotation::{
    Annotation, AnnotationType, FieldSpec, FieldType, FieldsDescriptorAnnotation,
    LabelAnnotation, ServiceExecutionAnnotation, ServiceInfo,
};
use serde_json::json;

fn supplier_fields() -> FieldsDescriptorAnnotation {
    FieldsDescriptorAnnotation::builder("Supplier 1", "A description")
        .field("smiles", FieldSpec::new("smiles", "").required(true))
        .field("uuid", FieldSpec::new("uuid", "").required(true))
        .field("id", FieldSpec::new("string", ""))
        .build()
        .unwrap()
}

fn label(text: &str, value: &str, active: bool) -> LabelAnnotation {
    LabelAnnotation::builder(text)
        .value(value)
        .active(active)
        .build()
        .unwrap()
}

fn test_metadata() -> Metadata {
    Metadata::new("test", "0000-1111", "", "Bob")
}

#[test]
fn test_json_schema_end_to_end() {
    let mut metadata = test_metadata();
    metadata.add_annotation(supplier_fields());
    metadata.add_annotation(LabelAnnotation::new("label1", "value1").unwrap());

    let schema = metadata.get_json_schema();
    assert_eq!(schema.title, "test");
    assert_eq!(schema.version, 0);
    let names: Vec<_> = schema.fields.keys().cloned().collect();
    assert_eq!(names, vec!["smiles", "uuid", "id"]);
    assert_eq!(schema.fields["smiles"].field_type, FieldType::Smiles);
    assert_eq!(schema.required, vec!["smiles", "uuid"]);
    assert_eq!(schema.labels.len(), 1);
    assert_eq!(schema.labels["label1"], "value1");

    let value = serde_json::to_value(&schema).unwrap();
    assert_eq!(value["fields"]["id"], json!({"type": "string", "description": ""}));
}

#[test]
fn test_label_resolution_sequence() {
    let mut metadata = test_metadata();
    metadata.add_label(label("label1", "value1", true));
    metadata.add_label(label("label2", "value2", true));
    assert_eq!(metadata.get_labels(None).len(), 2);
    assert_eq!(metadata.get_labels(Some(true)).len(), 2);

    metadata.add_label(label("label2", "value2", false));
    assert_eq!(metadata.get_labels(None).len(), 2);
    assert_eq!(metadata.get_labels(Some(true)).len(), 1);
    assert_eq!(metadata.get_labels(Some(false))[0].label(), "label2");

    metadata.add_label(label("label2", "valueX", true));
    assert_eq!(metadata.get_labels(None).len(), 2);
    assert_eq!(metadata.get_labels(Some(true)).len(), 2);
    assert_eq!(metadata.label_values()["label2"], "valueX");

    // history is kept
    assert_eq!(metadata.label_log().len(), 4);
}

#[test]
fn test_labels_most_recent_first() {
    let mut metadata = test_metadata();
    metadata.add_label(label("label1", "value1", true));
    metadata.add_label(label("label2", "value2", true));
    metadata.add_label(label("label1", "value3", true));

    let keys: Vec<_> = metadata.label_values().into_keys().collect();
    assert_eq!(keys, vec!["label1", "label2"]);
}

#[test]
fn test_required_list_monotonic() {
    let mut metadata = test_metadata();
    metadata.add_annotation(supplier_fields());
    metadata.add_annotation(
        FieldsDescriptorAnnotation::builder("Supplier 2", "Another description")
            .field("smiles", FieldSpec::new("smiles", "").active(false))
            .field("test1", FieldSpec::new("string", "").required(true))
            .build()
            .unwrap(),
    );
    metadata.add_annotation(
        FieldsDescriptorAnnotation::builder("Supplier 3", "Unrelated")
            .field("id", FieldSpec::new("integer", "changed"))
            .build()
            .unwrap(),
    );

    let schema = metadata.get_json_schema();
    assert_eq!(schema.required, vec!["smiles", "uuid", "test1"]);
    assert!(!schema.fields.contains_key("smiles"));
    assert_eq!(schema.fields["id"].field_type, FieldType::Integer);

    let compiled = metadata.get_compiled_fields();
    assert!(compiled.fields.contains_key("smiles"));
    assert!(!compiled.fields["smiles"].active);
}

#[test]
fn test_upsert_keeps_position() {
    let mut metadata = test_metadata();
    let first = FieldsDescriptorAnnotation::builder("Supplier 1", "A description")
        .name("supplier")
        .field("smiles", FieldSpec::new("smiles", ""))
        .build()
        .unwrap();
    let other = supplier_fields();
    let replacement = FieldsDescriptorAnnotation::builder("Supplier 1", "Updated")
        .name("supplier")
        .field("inchi", FieldSpec::new("string", ""))
        .build()
        .unwrap();

    metadata.add_annotation(first);
    metadata.add_annotation(other);
    metadata.add_annotation(replacement);

    assert_eq!(metadata.annotations().len(), 2);
    assert_eq!(metadata.annotations()[0].name(), "supplier");
    let fields = metadata.annotations()[0].fields().unwrap();
    assert!(fields.contains_key("inchi"));
    assert!(!fields.contains_key("smiles"));
}

#[test]
fn test_same_name_different_type_appends() {
    let mut metadata = test_metadata();
    metadata.add_annotation(
        FieldsDescriptorAnnotation::builder("Supplier 1", "A description")
            .name("run1")
            .build()
            .unwrap(),
    );
    metadata.add_annotation(
        ServiceExecutionAnnotation::builder(
            ServiceInfo::new("service", "1.0", "Bob", "A service", "http://service"),
            "Supplier 1",
            "A description",
        )
        .name("run1")
        .build()
        .unwrap(),
    );
    assert_eq!(metadata.annotations().len(), 2);
}

#[test]
fn test_add_annotations_from_json() {
    let mut metadata = test_metadata();
    let documents = json!([
        {"type": "LabelAnnotation", "label": "label1", "value": "value1", "active": true},
        {
            "type": "FieldsDescriptorAnnotation",
            "origin": "Supplier 1",
            "description": "A description",
            "fields": {"smiles": {"type": "smiles", "description": "", "required": true}}
        }
    ]);
    assert_eq!(metadata.add_annotations(documents).unwrap(), 2);
    assert_eq!(metadata.annotations().len(), 1);
    assert_eq!(metadata.label_log().len(), 1);

    let single = json!({"type": "LabelAnnotation", "label": "label2", "value": "value2"});
    assert_eq!(metadata.add_annotations(single).unwrap(), 1);

    let text = json!(r#"[{"type": "LabelAnnotation", "label": "label3"}]"#);
    assert_eq!(metadata.add_annotations(text).unwrap(), 1);
    assert_eq!(metadata.get_labels(None).len(), 3);
}

#[test]
fn test_add_annotations_fails_fast() {
    let mut metadata = test_metadata();
    let documents = json!([
        {"type": "LabelAnnotation", "label": "label1"},
        {"type": "MysteryAnnotation", "label": "label2"}
    ]);
    let err = metadata.add_annotations(documents).unwrap_err();
    assert!(matches!(err, MetadataError::Decode(_)));
    assert!(metadata.label_log().is_empty());

    assert!(matches!(
        metadata.add_annotations(json!(42)),
        Err(MetadataError::InvalidDocument(_))
    ));
}

#[test]
fn test_add_annotations_uses_limits() {
    let limits = crate::config::ValidationLimits {
        label_max: 20,
        ..Default::default()
    };
    let mut metadata = test_metadata().with_limits(limits);
    let doc = json!({"type": "LabelAnnotation", "label": "label1toolonganame"});
    assert_eq!(metadata.add_annotations(doc.clone()).unwrap(), 1);

    let mut strict = test_metadata();
    assert!(strict.add_annotations(doc).is_err());
}

#[test]
fn test_remove_annotation() {
    let mut metadata = test_metadata();
    let fields = FieldsDescriptorAnnotation::builder("Supplier 1", "A description")
        .name("supplier")
        .field("smiles", FieldSpec::new("smiles", "").required(true))
        .build()
        .unwrap();
    metadata.add_annotation(fields);
    metadata.add_label(label("label1", "value1", true));
    metadata.add_label(label("label1", "value2", true));

    let removed = metadata.remove_annotation("supplier").unwrap();
    assert_eq!(removed.annotation_type(), AnnotationType::FieldsDescriptor);
    assert!(metadata.get_json_schema().required.is_empty());

    let removed = metadata.remove_annotation("label1").unwrap();
    assert_eq!(removed.as_label().map(|l| l.value()), Some("value2"));
    assert!(metadata.label_log().is_empty());

    assert!(metadata.remove_annotation("missing").is_none());
}

#[test]
fn test_get_annotation() {
    let mut metadata = test_metadata();
    let fields = supplier_fields();
    let name = fields.name().to_string();
    metadata.add_annotation(fields);
    metadata.add_label(label("label1", "value1", true));

    assert!(matches!(
        metadata.get_annotation(&name),
        Some(Annotation::FieldsDescriptor(_))
    ));
    assert!(metadata.get_annotation("label1").is_none());
    assert_eq!(metadata.get_label("label1").map(|l| l.value()), Some("value1"));
}

#[test]
fn test_property_changes() {
    let mut metadata = test_metadata();
    metadata.set_description("test description").unwrap();
    metadata.set_created_by("Dick").unwrap();
    metadata.set_created_by("Dick").unwrap();

    assert_eq!(metadata.description(), "test description");
    assert_eq!(metadata.created_by(), "Dick");
    assert_eq!(metadata.annotations().len(), 2);
    match &metadata.annotations()[1] {
        Annotation::PropertyChange(change) => {
            assert_eq!(change.property(), "created_by");
            assert_eq!(change.previous_value(), "Bob");
            assert_eq!(change.new_value(), "Dick");
        }
        other => panic!("unexpected annotation: {:?}", other),
    }
    assert_eq!(metadata.get_json_schema().description, "test description");
}

#[test]
fn test_compilation_idempotent() {
    let mut metadata = test_metadata();
    metadata.add_annotation(supplier_fields());
    assert_eq!(metadata.get_compiled_fields(), metadata.get_compiled_fields());
    assert_eq!(metadata.get_json_schema(), metadata.get_json_schema());
}

#[test]
fn test_round_trip_byte_identical() {
    let mut metadata = test_metadata();
    metadata.add_annotation(supplier_fields());
    metadata.add_annotation(
        ServiceExecutionAnnotation::builder(
            ServiceInfo::new("service", "1.0", "Bob", "A service", "http://service")
                .with_parameters([("param1", "1"), ("param2", "two")]),
            "Supplier 2",
            "Service output",
        )
        .field("score", FieldSpec::new("number", "Docking score"))
        .build()
        .unwrap(),
    );
    metadata.add_label(label("label1", "value1", true));
    metadata.add_label(label("label1", "value1", false));
    metadata.set_description("described").unwrap();

    let json = metadata.to_json().unwrap();
    let restored = Metadata::from_json(&json).unwrap();
    assert_eq!(restored.to_json().unwrap(), json);
    assert_eq!(restored, metadata);
    assert_eq!(restored.get_json_schema(), metadata.get_json_schema());
}

#[test]
fn test_document_shape() {
    let mut metadata = test_metadata();
    metadata.add_label(label("label1", "value1", true));
    let value = metadata.to_value().unwrap();

    assert_eq!(value["dataset_name"], "test");
    assert_eq!(value["dataset_uuid"], "0000-1111");
    assert_eq!(value["metadata_version"], METADATA_VERSION);
    assert_eq!(value["synchronised_datetime"], DEFAULT_SYNC_TIME);
    assert!(value.get("dataset_version").is_none());
    assert_eq!(value["labels"][0]["type"], "LabelAnnotation");
    assert_eq!(value["annotations"], json!([]));
}

#[test]
fn test_from_value_with_limits() {
    let limits = crate::config::ValidationLimits {
        label_max: 20,
        ..Default::default()
    };
    let mut metadata = test_metadata().with_limits(limits);
    metadata
        .add_annotations(json!({"type": "LabelAnnotation", "label": "label1toolonganame"}))
        .unwrap();
    let value = metadata.to_value().unwrap();

    assert!(Metadata::from_json(&value.to_string()).is_err());
    let restored = Metadata::from_value(value, &limits).unwrap();
    assert_eq!(restored.get_labels(None).len(), 1);
    assert_eq!(restored.limits(), &limits);

    assert!(matches!(
        Metadata::from_value(json!({"dataset_name": "x", "labels": {}}), &limits),
        Err(MetadataError::InvalidDocument(_))
    ));
}

#[test]
fn test_round_trip_with_custom_limits() {
    let limits = crate::config::ValidationLimits {
        label_max: 20,
        field_name_max: 80,
        ..Default::default()
    };
    let mut metadata = test_metadata().with_limits(limits);
    metadata.add_label(
        LabelAnnotation::builder("a_fifteen_chars")
            .value("value1")
            .limits(&limits)
            .build()
            .unwrap(),
    );
    metadata.add_annotation(
        FieldsDescriptorAnnotation::builder("Supplier 1", "A description")
            .field(
                "a_field_name_that_is_longer_than_fifty_characters_x",
                FieldSpec::new("string", "").required(true),
            )
            .limits(&limits)
            .build()
            .unwrap(),
    );

    let json = metadata.to_json().unwrap();
    let restored = Metadata::from_json_with_limits(&json, &limits).unwrap();
    assert_eq!(restored.to_json().unwrap(), json);
    assert_eq!(restored.limits(), &limits);
    assert_eq!(restored.get_json_schema(), metadata.get_json_schema());
}

#[test]
fn test_from_json_minimal_document() {
    let json = r#"{"dataset_name":"test","dataset_uuid":"0000-1111","description":"","created_by":"Bob","annotations":[],"labels":[]}"#;
    let metadata = Metadata::from_json(json).unwrap();

    assert_eq!(metadata.dataset_name(), "test");
    assert_eq!(metadata.created_by(), "Bob");
    assert_eq!(metadata.get_metadata_version(), METADATA_VERSION);
    assert_eq!(metadata.synchronised_datetime(), DEFAULT_SYNC_TIME);
    assert!(metadata.annotations().is_empty());

    // once written, the document reloads unchanged
    let written = metadata.to_json().unwrap();
    assert!(written.contains(r#""created":"#));
    assert_eq!(Metadata::from_json(&written).unwrap().to_json().unwrap(), written);
}

#[test]
fn test_from_json_minimal_document_with_annotations() {
    let json = json!({
        "dataset_name": "test",
        "dataset_uuid": "0000-1111",
        "description": "",
        "created_by": "Bob",
        "annotations": [{
            "type": "FieldsDescriptorAnnotation",
            "origin": "Supplier 1",
            "description": "A description",
            "fields": {"smiles": {"type": "string", "description": "", "required": true}}
        }],
        "labels": [{"type": "LabelAnnotation", "label": "label1", "value": "value1"}]
    });
    let metadata = Metadata::from_json(&json.to_string()).unwrap();
    let schema = metadata.get_json_schema();
    assert_eq!(schema.required, vec!["smiles"]);
    assert_eq!(schema.labels["label1"], "value1");
}

#[test]
fn test_metadata_version() {
    assert_eq!(test_metadata().get_metadata_version(), "0.0.1");
}
