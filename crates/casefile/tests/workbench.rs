mod fixtures;

use casefile::package::ImportError;
use casefile::registry::MemoryStore;
use casefile::{DirectoryManifestSource, Workbench, WorkbenchError};
use casefile::domain::registry::DomainState;
use fixtures::{config, zip};
use serde_json::json;
use std::fs;
use tempfile::tempdir;

fn acme() -> Vec<u8> {
    zip(
        &[
            ("acme_tools/meta.json", br#"{"description": "Acme widgets"}"#),
            ("acme_tools/widget.json", br#"{"label": "Widget", "icon": "widget.png"}"#),
            ("acme_tools/gadget.json", br#"{"label": "Gadget"}"#),
            ("acme_tools/widget.png", b"\x89PNG\r\n\x1a\n"),
        ],
        true,
    )
}

#[tokio::test]
async fn import_registers_and_activates() {
    let dir = tempdir().unwrap();
    let workbench = Workbench::open(config(dir.path())).await.unwrap();

    let outcome = workbench.import_package(&acme()).await.unwrap();
    assert_eq!(outcome.domain_key, "acme_tools");
    assert_eq!(outcome.display_name, "Acme Tools");
    assert!(outcome.persisted);
    assert!(outcome.warnings.is_empty(), "{:?}", outcome.warnings);

    let active = workbench.active_configuration();
    assert!(active.types.contains_key("widget"));
    assert!(active.types.contains_key("gadget"));
    let icon = active.types["widget"].icon().unwrap();
    assert!(icon.starts_with("data:image/png;base64,"));
    assert_eq!(active.types["widget"].icon_source(), Some("widget.png"));
}

#[tokio::test]
async fn duplicate_import_is_rejected() {
    let dir = tempdir().unwrap();
    let workbench = Workbench::open(config(dir.path())).await.unwrap();
    workbench.import_package(&acme()).await.unwrap();

    let err = workbench.import_package(&acme()).await.unwrap_err();
    assert!(matches!(err, ImportError::DomainAlreadyExists { ref key, .. } if key == "acme_tools"));
}

#[tokio::test]
async fn empty_package_leaves_registry_untouched() {
    let dir = tempdir().unwrap();
    let workbench = Workbench::open(config(dir.path())).await.unwrap();
    let archive = zip(&[("empty/readme.txt", b"nothing here")], false);

    let err = workbench.import_package(&archive).await.unwrap_err();
    assert_eq!(err.kind(), "EmptyPackage");
    assert_eq!(workbench.domains().await.len(), 1);
}

#[tokio::test]
async fn flat_archive_uses_fallback_name() {
    let dir = tempdir().unwrap();
    let workbench = Workbench::open(config(dir.path())).await.unwrap();
    let archive = zip(&[("probe.json", br#"{"kind": "probe"}"#)], false);

    let outcome = workbench.import_package_named(&archive, "Field Kit").await.unwrap();
    assert_eq!(outcome.domain_key, "field_kit");
    assert!(workbench.active_configuration().types.contains_key("probe"));
}

#[tokio::test]
async fn restart_recovers_virtual_domains_in_order() {
    let dir = tempdir().unwrap();
    {
        let workbench = Workbench::open(config(dir.path())).await.unwrap();
        workbench.import_package(&acme()).await.unwrap();
        let other = zip(&[("other/widget.json", br#"{"label": "Other widget"}"#)], false);
        workbench.import_package(&other).await.unwrap();
    }

    let workbench = Workbench::open(config(dir.path())).await.unwrap();
    let domains = workbench.domains().await;
    let keys: Vec<_> = domains.iter().map(|d| d.key.as_str()).collect();
    assert_eq!(keys, ["default", "acme_tools", "other"]);
    assert!(domains[1].is_virtual);
    assert_eq!(domains[1].state, DomainState::Active);

    let active = workbench.active_configuration();
    assert_eq!(active.types["widget"].get("label"), Some(&json!("Widget")));
    assert_eq!(active.conflicts.len(), 1);
    assert_eq!(active.conflicts[0].duplicate_domain, "other");
}

#[tokio::test]
async fn deleted_domain_stays_gone_after_restart() {
    let dir = tempdir().unwrap();
    {
        let workbench = Workbench::open(config(dir.path())).await.unwrap();
        workbench.import_package(&acme()).await.unwrap();
        assert!(workbench.delete_domain("acme_tools").await);
        assert!(!workbench.delete_domain("default").await);
    }

    let workbench = Workbench::open(config(dir.path())).await.unwrap();
    assert_eq!(workbench.domains().await.len(), 1);
    assert!(workbench.active_configuration().types.is_empty());
}

#[tokio::test]
async fn default_types_are_loaded_from_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("defaults.json");
    fs::write(&path, r#"{"widget": {"label": "Base"}, "broken": 3}"#).unwrap();

    let mut config = config(dir.path());
    config.registry.default_types = Some(path);
    let workbench = Workbench::with_store(config, MemoryStore::new()).await.unwrap();
    workbench.import_package(&acme()).await.unwrap();

    let active = workbench.active_configuration();
    assert_eq!(active.types["widget"].get("label"), Some(&json!("Base")));
    assert!(!active.types.contains_key("broken"));
    assert_eq!(active.conflicts[0].type_key, "widget");
    assert_eq!(active.conflicts[0].original_domain, "default");
}

#[tokio::test]
async fn missing_default_types_file_fails_open() {
    let dir = tempdir().unwrap();
    let mut config = config(dir.path());
    config.registry.default_types = Some(dir.path().join("absent.json"));

    let err = Workbench::with_store(config, MemoryStore::new()).await.unwrap_err();
    assert!(matches!(err, WorkbenchError::Io { .. }));
}

#[tokio::test]
async fn activation_on_import_can_be_disabled() {
    let dir = tempdir().unwrap();
    let mut config = config(dir.path());
    config.registry.activate_on_import = false;
    let workbench = Workbench::with_store(config, MemoryStore::new()).await.unwrap();

    workbench.import_package(&acme()).await.unwrap();
    assert!(workbench.active_configuration().types.is_empty());

    let active = workbench.activate("acme_tools").await.unwrap();
    assert_eq!(active.types.len(), 2);
    let active = workbench.deactivate("acme_tools").await.unwrap();
    assert!(active.types.is_empty());
}

fn write_manifest(root: &std::path::Path, label: &str) {
    fs::create_dir_all(root.join("net")).unwrap();
    fs::write(
        root.join("manifest.json"),
        json!({
            "domains": [
                { "key": "net", "name": "Network", "files": ["net/host.json", "net/missing.json"] }
            ]
        })
        .to_string(),
    )
    .unwrap();
    fs::write(root.join("net/host.json"), json!({ "label": label }).to_string()).unwrap();
}

#[tokio::test]
async fn sync_registers_new_domains_and_skips_fresh_ones() {
    let dir = tempdir().unwrap();
    let remote = dir.path().join("remote");
    write_manifest(&remote, "Host");
    let source = DirectoryManifestSource::new(&remote);
    let workbench = Workbench::with_store(config(dir.path()), MemoryStore::new()).await.unwrap();

    let report = workbench.sync_manifest(&source, false).await.unwrap();
    assert_eq!(report.refreshed, ["net"]);
    assert_eq!(report.warnings.len(), 1);
    let domains = workbench.domains().await;
    assert_eq!(domains[1].display_name, "Network");
    assert_eq!(workbench.active_configuration().types["host"].get("label"), Some(&json!("Host")));

    let report = workbench.sync_manifest(&source, false).await.unwrap();
    assert!(report.refreshed.is_empty());
    assert_eq!(report.skipped, ["net"]);
}

#[tokio::test]
async fn forced_sync_reloads_and_counts_changes() {
    let dir = tempdir().unwrap();
    let remote = dir.path().join("remote");
    write_manifest(&remote, "Host");
    let source = DirectoryManifestSource::new(&remote);
    let workbench = Workbench::with_store(config(dir.path()), MemoryStore::new()).await.unwrap();
    workbench.sync_manifest(&source, false).await.unwrap();

    write_manifest(&remote, "Renamed host");
    let report = workbench.sync_manifest(&source, true).await.unwrap();
    assert_eq!(report.refreshed, ["net"]);
    assert_eq!(report.changed_types, 1);
    assert_eq!(
        workbench.active_configuration().types["host"].get("label"),
        Some(&json!("Renamed host"))
    );
    assert!(!workbench.registry().cache().is_dirty("net").await);
}

#[tokio::test]
async fn manifest_paths_cannot_escape_root() {
    let dir = tempdir().unwrap();
    let remote = dir.path().join("remote");
    fs::create_dir_all(&remote).unwrap();
    fs::write(
        remote.join("manifest.json"),
        json!({ "domains": [ { "key": "evil", "files": ["../secret.json"] } ] }).to_string(),
    )
    .unwrap();
    fs::write(dir.path().join("secret.json"), r#"{"label": "secret"}"#).unwrap();

    let workbench = Workbench::with_store(config(dir.path()), MemoryStore::new()).await.unwrap();
    let report = workbench.sync_manifest(&DirectoryManifestSource::new(&remote), false).await.unwrap();
    assert!(report.refreshed.is_empty());
    assert!(!workbench.registry().contains("evil").await);
    assert_eq!(report.warnings.len(), 2);
}

#[tokio::test]
async fn forced_sync_keeps_imported_domains_usable_after_restart() {
    let dir = tempdir().unwrap();
    let remote = dir.path().join("remote");
    write_manifest(&remote, "Host");
    {
        let workbench = Workbench::open(config(dir.path())).await.unwrap();
        workbench.import_package(&acme()).await.unwrap();
        let report =
            workbench.sync_manifest(&DirectoryManifestSource::new(&remote), true).await.unwrap();
        assert_eq!(report.refreshed, ["net"]);
        assert!(!workbench.registry().cache().is_dirty("acme_tools").await);
    }

    let workbench = Workbench::open(config(dir.path())).await.unwrap();
    let summary = workbench.domains().await.into_iter().find(|d| d.key == "acme_tools").unwrap();
    assert_eq!(summary.state, DomainState::Active);
    assert_eq!(summary.type_count, 2);
    assert!(workbench.active_configuration().types.contains_key("widget"));
    workbench.deactivate("acme_tools").await.unwrap();
    workbench.activate("acme_tools").await.unwrap();
}

#[tokio::test]
async fn dirty_cache_entry_still_recovers_its_domain() {
    let dir = tempdir().unwrap();
    {
        let workbench = Workbench::open(config(dir.path())).await.unwrap();
        workbench.import_package(&acme()).await.unwrap();
        assert!(workbench.registry().cache().invalidate("acme_tools").await);
    }

    let workbench = Workbench::open(config(dir.path())).await.unwrap();
    assert!(workbench.registry().is_loaded("acme_tools").await);
    assert_eq!(workbench.active_configuration().types["gadget"].get("label"), Some(&json!("Gadget")));
}
