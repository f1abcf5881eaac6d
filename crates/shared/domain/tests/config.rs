use casefile_domain::config::{CasefileConfig, CompressionKind, InflateStrategy};
use serde_json::json;
use std::path::PathBuf;

#[test]
fn config_defaults_are_sane() {
    let cfg = CasefileConfig::default();
    assert_eq!(cfg.storage.data_dir, PathBuf::from("./casefile-data"));
    assert_eq!(cfg.storage.compression, CompressionKind::None);
    assert!(cfg.archive.lenient_index);
    assert_eq!(cfg.inflate.strategies, vec![InflateStrategy::Native, InflateStrategy::Software]);
    assert!(cfg.registry.activate_on_import);
    assert!(cfg.registry.default_types.is_none());
    assert_eq!(cfg.logging.level, "info");
    assert!(!cfg.logging.json);
}

#[test]
fn config_deserializes_partial_sections() {
    let raw = json!({
        "storage": { "data_dir": "/tmp/casefile", "compression": "lz4" },
        "archive": { "lenient_index": false },
        "inflate": { "strategies": ["software"] },
        "logging": { "json": true }
    });

    let cfg: CasefileConfig = serde_json::from_value(raw).expect("config deserialize");
    assert_eq!(cfg.storage.data_dir, PathBuf::from("/tmp/casefile"));
    assert_eq!(cfg.storage.compression, CompressionKind::Lz4);
    assert!(!cfg.archive.lenient_index);
    assert_eq!(cfg.inflate.strategies, vec![InflateStrategy::Software]);
    assert!(cfg.registry.activate_on_import);
    assert!(cfg.logging.json);
    assert_eq!(cfg.logging.level, "info");
}

#[test]
fn config_mutation_does_not_leak_into_clones() {
    let original = CasefileConfig::default();
    let mut edited = original.clone();
    edited.archive.lenient_index = false;

    assert!(original.archive.lenient_index);
    assert!(!edited.archive.lenient_index);
}

#[test]
fn unknown_strategy_is_rejected() {
    let raw = json!({ "inflate": { "strategies": ["zopfli"] } });
    assert!(serde_json::from_value::<CasefileConfig>(raw).is_err());
}
