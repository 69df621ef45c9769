//! The packed table and its metadata travel together as JSON.

use cellwidth::{
    CascadeBuilder, CascadeConfig, CascadeLayout, PackedCascade, TableEncoder, WidthTable,
    LAYOUT_VERSION,
};

use crate::fixtures::unicode_classes;

#[test]
fn test_layout_describes_default_tables() {
    let table = CascadeBuilder::default().encode(unicode_classes()).unwrap();
    let layout = table.layout();

    assert_eq!(layout.version, LAYOUT_VERSION);
    assert_eq!(layout.depth(), 3);
    assert_eq!(layout.levels[0].stride, 256);
    assert_eq!(layout.levels[0].groups, 1);
    // All 256 top-level keys are stored, including those past the domain end.
    assert_eq!(layout.levels[0].byte_len, 256);
    assert_eq!(layout.levels[1].stride, 128);
    assert_eq!(layout.levels[2].stride, 64);
    assert_eq!(layout.levels[2].offset_width, 2);
    assert_eq!(layout.byte_len(), table.encoded_size());
}

#[test]
fn test_json_handoff() {
    let classes = unicode_classes();
    let table = CascadeBuilder::default().encode(classes).unwrap();

    let json = serde_json::to_string(&table).unwrap();
    let restored: PackedCascade = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, table);
    restored.verify(classes).unwrap();

    let layout_json = serde_json::to_string(&table.layout()).unwrap();
    let layout: CascadeLayout = serde_json::from_str(&layout_json).unwrap();
    assert_eq!(layout, table.layout());
}

#[test]
fn test_json_rejects_mismatched_config() {
    let table = CascadeBuilder::default().encode(unicode_classes()).unwrap();
    let mut value = serde_json::to_value(&table).unwrap();

    // Claim a narrower final offset width than the bytes were packed with.
    value["config"]["levels"][1]["offset_width"] = serde_json::json!(4);
    assert!(serde_json::from_value::<PackedCascade>(value).is_err());
}

#[test]
fn test_config_round_trips_through_json() {
    let config = CascadeConfig::default();
    let json = serde_json::to_string(&config).unwrap();
    let restored: CascadeConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, config);
    restored.validate().unwrap();
}
