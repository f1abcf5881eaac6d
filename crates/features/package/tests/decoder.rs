mod fixtures;

use casefile_domain::config::{CasefileConfig, InflateStrategy};
use casefile_package::{ArchiveReader, DecompressionError, ImportError, InflateDispatcher, PackageDecoder};
use fixtures::{PNG, ZipBuilder};
use serde_json::json;

fn decoder() -> PackageDecoder {
    PackageDecoder::default()
}

#[test]
fn decodes_minimal_stored_package() {
    let zip = ZipBuilder::new()
        .stored("acme/meta.json", br#"{"name":"Acme"}"#)
        .stored("acme/widget.json", br##"{"color":"#fff"}"##)
        .finish();

    let pkg = decoder().decode(&zip).unwrap();
    assert_eq!(pkg.folder_name, "acme");
    assert_eq!(pkg.domain_key, "acme");
    assert_eq!(pkg.display_name, "Acme");
    assert_eq!(pkg.description, "");
    assert_eq!(pkg.type_definitions.len(), 1);
    assert_eq!(pkg.type_definitions["widget"].get("color"), Some(&json!("#fff")));
    assert!(pkg.warnings.is_empty(), "{:?}", pkg.warnings);
}

#[test]
fn invalid_definition_is_a_warning_when_others_survive() {
    let zip = ZipBuilder::new()
        .stored("acme/meta.json", br#"{"name":"Acme"}"#)
        .stored("acme/widget.json", b"{not json")
        .deflated("acme/gadget.json", br#"{"shape":"hex"}"#)
        .finish();

    let pkg = decoder().decode(&zip).unwrap();
    assert!(!pkg.type_definitions.contains_key("widget"));
    assert!(pkg.type_definitions.contains_key("gadget"));
    assert_eq!(pkg.warnings.len(), 1);
    assert!(pkg.warnings[0].starts_with("acme/widget.json"));
}

#[test]
fn invalid_sole_definition_is_an_empty_package() {
    let zip = ZipBuilder::new()
        .stored("acme/meta.json", br#"{"name":"Acme"}"#)
        .stored("acme/widget.json", b"{not json")
        .finish();

    let err = decoder().decode(&zip).unwrap_err();
    assert!(matches!(&err, ImportError::EmptyPackage { folder, .. } if folder == "acme"));
    assert_eq!(err.warnings().len(), 1);
}

#[test]
fn counts_types_and_icons() {
    let zip = ZipBuilder::new()
        .stored("intel/", b"")
        .deflated("intel/types/server.json", br#"{"icon":"server.png"}"#)
        .stored("intel/types/host.json", br#"{"icon":"icons/host.svg"}"#)
        .stored("intel/icons/server.png", PNG)
        .deflated("intel/icons/host.svg", b"<svg/>")
        .stored("intel/icons/legacy.BMP", b"BM")
        .stored("intel/readme.txt", b"hello")
        .finish();

    let pkg = decoder().decode(&zip).unwrap();
    assert_eq!(pkg.type_definitions.len(), 2);
    assert_eq!(pkg.icon_assets.len(), 3);
    let svg = pkg.icon_assets.iter().find(|i| i.relative_path == "icons/host.svg").unwrap();
    assert_eq!(svg.mime_type, "image/svg+xml");
    assert_eq!(svg.bytes, b"<svg/>");
    assert!(pkg.warnings.is_empty(), "{:?}", pkg.warnings);
}

#[test]
fn display_name_falls_back_to_title_cased_folder() {
    let zip = ZipBuilder::new()
        .stored("threat-intel/meta.json", br#"{"description":"Feeds"}"#)
        .stored("threat-intel/ioc.json", b"{}")
        .finish();

    let pkg = decoder().decode(&zip).unwrap();
    assert_eq!(pkg.domain_key, "threat_intel");
    assert_eq!(pkg.display_name, "Threat Intel");
    assert_eq!(pkg.description, "Feeds");
}

#[test]
fn skips_macosx_foreign_folders_and_traversal() {
    let zip = ZipBuilder::new()
        .stored("__MACOSX/acme/._widget.json", b"\0\0")
        .stored("acme/widget.json", b"{}")
        .stored("other/gadget.json", b"{}")
        .stored("acme/../evil.json", b"{}")
        .finish();

    let pkg = decoder().decode(&zip).unwrap();
    assert_eq!(pkg.type_definitions.keys().collect::<Vec<_>>(), ["widget"]);
    assert_eq!(pkg.warnings.len(), 2);
    assert!(pkg.warnings.iter().any(|w| w.contains("other/gadget.json")));
    assert!(pkg.warnings.iter().any(|w| w.contains("path traversal")));
}

#[test]
fn duplicate_basenames_keep_the_last() {
    let zip = ZipBuilder::new()
        .stored("acme/a/widget.json", br#"{"v":1}"#)
        .stored("acme/b/widget.json", br#"{"v":2}"#)
        .finish();

    let pkg = decoder().decode(&zip).unwrap();
    assert_eq!(pkg.type_definitions["widget"].get("v"), Some(&json!(2)));
    assert_eq!(pkg.warnings.len(), 1);
}

#[test]
fn non_object_definitions_are_rejected() {
    let zip = ZipBuilder::new()
        .stored("acme/list.json", b"[1,2]")
        .stored("acme/widget.json", b"{}")
        .finish();

    let pkg = decoder().decode(&zip).unwrap();
    assert!(!pkg.type_definitions.contains_key("list"));
    assert!(pkg.warnings[0].contains("not a JSON object"));
}

#[test]
fn missing_inflater_fails_on_type_definitions() {
    let decoder = PackageDecoder::new(ArchiveReader::default(), InflateDispatcher::new(&[]));
    let zip = ZipBuilder::new()
        .stored("acme/plain.json", b"{}")
        .deflated("acme/packed.json", b"{}")
        .finish();

    let err = decoder.decode(&zip).unwrap_err();
    assert!(matches!(
        err,
        ImportError::Decompression { source: DecompressionError::DecompressionUnsupported { .. }, .. }
    ));
}

#[test]
fn missing_inflater_only_skips_icons() {
    let decoder = PackageDecoder::new(ArchiveReader::default(), InflateDispatcher::new(&[]));
    let zip = ZipBuilder::new()
        .stored("acme/plain.json", b"{}")
        .deflated("acme/icon.svg", b"<svg/>")
        .finish();

    let pkg = decoder.decode(&zip).unwrap();
    assert!(pkg.icon_assets.is_empty());
    assert_eq!(pkg.warnings.len(), 1);
}

#[test]
fn flat_archives_use_the_fallback_name() {
    let zip = ZipBuilder::new().stored("widget.json", b"{}").finish();

    let err = decoder().decode(&zip).unwrap_err();
    assert_eq!(err.kind(), "EmptyPackage");

    let pkg = decoder().decode_with_fallback(&zip, "Field Kit").unwrap();
    assert_eq!(pkg.domain_key, "field_kit");
    assert_eq!(pkg.display_name, "Field Kit");

    let pkg = PackageDecoder::default().with_fallback_name("kit").decode(&zip).unwrap();
    assert_eq!(pkg.domain_key, "kit");
}

#[test]
fn unusable_folder_name_is_rejected() {
    let zip = ZipBuilder::new().stored("+++/widget.json", b"{}").finish();
    let err = decoder().decode(&zip).unwrap_err();
    assert!(matches!(err, ImportError::InvalidDomainKey { .. }));
}

#[test]
fn unreadable_archive_is_an_archive_error() {
    let err = decoder().decode(b"not a zip at all").unwrap_err();
    assert!(matches!(err, ImportError::Archive { .. }));
    assert!(err.to_string().contains("opening package archive"));
}

#[test]
fn strict_config_rejects_count_mismatch() {
    let mut config = CasefileConfig::default();
    config.archive.lenient_index = false;
    config.inflate.strategies = vec![InflateStrategy::Software];
    let zip = ZipBuilder::new().stored("acme/widget.json", b"{}").declared_entries(2).finish();

    assert!(PackageDecoder::default().decode(&zip).unwrap().warnings[0].contains("declares 2"));
    let err = PackageDecoder::from_config(&config).decode(&zip).unwrap_err();
    assert!(matches!(err, ImportError::Archive { .. }));
}
