//! Integration tests for the option tree
//!
//! These tests verify:
//! - Overrides change only the options they name
//! - Flat and structured views agree with the compiled-in defaults
//! - Reset restores defaults after arbitrary overrides
//! - Stored override lists survive a JSON round trip

use proptest::prelude::*;
use vrmodkit::options::{ConfigEntry, OptionRecord, OptionTree, OptionValue, defaults};

fn value_of(records: &[OptionRecord], key: &str, parent: Option<&str>) -> OptionValue {
    records
        .iter()
        .find(|r| r.key == key && r.parent.as_deref() == parent)
        .map(|r| r.value.clone())
        .unwrap()
}

#[test]
fn test_override_changes_only_named_option() {
    let mut tree = OptionTree::new(defaults::fsr);
    let applied = tree.apply_overrides(&[OptionRecord::new(
        "enabled",
        None,
        OptionValue::Bool(false),
    )]);
    assert_eq!(applied, 1);

    let flat = tree.to_flat_list(false);
    assert_eq!(value_of(&flat, "enabled", None), OptionValue::Bool(false));
    assert_eq!(value_of(&flat, "renderScale", None), OptionValue::Float(0.77));
}

#[test]
fn test_unknown_and_mistyped_overrides_are_skipped() {
    let mut tree = OptionTree::new(defaults::fsr);
    let overrides = vec![
        OptionRecord::new("noSuchOption", None, OptionValue::Bool(true)),
        OptionRecord::new("renderScale", None, OptionValue::Text("big".to_string())),
        OptionRecord::new("toggleUseNIS", Some("hotkeys"), OptionValue::Int(120)),
    ];

    assert_eq!(tree.apply_overrides(&overrides), 1);
    assert_eq!(
        tree.value("toggleUseNIS", Some("hotkeys")),
        Some(&OptionValue::Int(120))
    );
    assert_eq!(tree.value("renderScale", None), Some(&OptionValue::Float(0.77)));
}

#[test]
fn test_same_key_under_different_parents() {
    let mut tree = OptionTree::new(defaults::foveated);
    assert!(tree.set_value("enabled", Some("sharpen"), OptionValue::Bool(false)));

    assert_eq!(tree.value("enabled", None), Some(&OptionValue::Bool(true)));
    assert_eq!(
        tree.value("enabled", Some("sharpen")),
        Some(&OptionValue::Bool(false))
    );
}

#[test]
fn test_structured_map_nests_children() {
    let tree = OptionTree::new(defaults::vrperfkit);
    let map = tree.to_structured_map();

    let Some(ConfigEntry::Group(upscaling)) = map.get("upscaling") else {
        panic!("upscaling should be a group");
    };
    assert_eq!(upscaling.get("renderScale"), Some(&OptionValue::Float(70.0)));
    assert_eq!(
        map.get("debugMode"),
        Some(&ConfigEntry::Value(OptionValue::Bool(false)))
    );
}

#[test]
fn test_redacted_flat_list_drops_metadata() {
    let tree = OptionTree::new(defaults::vrperfkit);

    assert!(tree.to_flat_list(true).iter().all(|r| r.meta.is_none()));
    assert!(tree.to_flat_list(false).iter().all(|r| r.meta.is_some()));
}

#[test]
fn test_flat_list_json_round_trip() {
    let mut tree = OptionTree::new(defaults::vrperfkit);
    tree.set_value("method", Some("upscaling"), OptionValue::Text("fsr".to_string()));

    let json = serde_json::to_string(&tree.to_flat_list(true)).unwrap();
    let records: Vec<OptionRecord> = serde_json::from_str(&json).unwrap();

    let mut restored = OptionTree::new(defaults::vrperfkit);
    restored.apply_overrides(&records);
    assert_eq!(restored.to_flat_list(false), tree.to_flat_list(false));
}

proptest! {
    #[test]
    fn prop_reset_restores_defaults(scale in 0.1f64..3.0, sharpness in 0.1f64..3.0, enabled: bool) {
        let mut tree = OptionTree::new(defaults::fsr);
        let pristine = tree.to_flat_list(false);

        tree.apply_overrides(&[
            OptionRecord::new("renderScale", None, OptionValue::Float(scale)),
            OptionRecord::new("sharpness", None, OptionValue::Float(sharpness)),
            OptionRecord::new("enabled", None, OptionValue::Bool(enabled)),
        ]);
        tree.reset_to_defaults();

        prop_assert_eq!(tree.to_flat_list(false), pristine);
    }

    #[test]
    fn prop_override_is_read_back(scale in 0.1f64..999.0) {
        let mut tree = OptionTree::new(defaults::vrperfkit);
        tree.apply_overrides(&[OptionRecord::new(
            "renderScale",
            Some("upscaling"),
            OptionValue::Float(scale),
        )]);

        prop_assert_eq!(
            tree.value("renderScale", Some("upscaling")),
            Some(&OptionValue::Float(scale))
        );
        prop_assert_eq!(tree.len(), defaults::vrperfkit().len());
    }
}
