#![no_main]

use dm_metadata::config::ValidationLimits;
use dm_metadata::metadata::Metadata;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    // Decoding may fail but must never panic
    if let Ok(metadata) = Metadata::from_json(text) {
        // Anything that loads must compile and survive a second round trip
        let _ = metadata.get_json_schema();
        let json = metadata.to_json().expect("loaded metadata serializes");
        let restored = Metadata::from_json(&json).expect("serialized metadata reloads");
        assert_eq!(restored.to_json().ok(), Some(json));
    }

    // Bulk import of arbitrary annotation lists
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(text) {
        let mut holder = Metadata::new("dm", "dm", "dm", "dm").with_limits(ValidationLimits::default());
        let _ = holder.add_annotations(value);
        let _ = holder.get_compiled_fields();
    }
});
