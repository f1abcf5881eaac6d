use casefile_domain::package::{DecodedPackage, DomainMeta, IconAsset};
use casefile_domain::registry::{ConflictRecord, DomainState};
use casefile_domain::types::{TypeDefinition, TypeMap};
use casefile_registry::{DomainCache, MemoryStore, RegistryError, TypeRegistry};
use serde_json::json;

fn types(pairs: &[(&str, serde_json::Value)]) -> TypeMap {
    pairs
        .iter()
        .map(|(name, value)| ((*name).to_owned(), TypeDefinition::from_value(value.clone()).unwrap()))
        .collect()
}

fn package(key: &str, definitions: TypeMap) -> DecodedPackage {
    DecodedPackage {
        folder_name: key.to_owned(),
        domain_key: key.to_owned(),
        display_name: key.to_uppercase(),
        description: String::new(),
        type_definitions: definitions,
        icon_assets: Vec::new(),
        warnings: Vec::new(),
    }
}

fn registry(default_types: TypeMap) -> (TypeRegistry<MemoryStore>, MemoryStore) {
    let store = MemoryStore::new();
    (TypeRegistry::new(DomainCache::new(store.clone()), default_types), store)
}

#[tokio::test]
async fn first_activated_domain_wins() {
    let (registry, _) = registry(TypeMap::new());
    registry.register_package(package("alpha", types(&[("server", json!({"from": "alpha"}))]))).await.unwrap();
    registry.register_package(package("beta", types(&[("server", json!({"from": "beta"}))]))).await.unwrap();

    registry.activate("alpha").await.unwrap();
    let config = registry.activate("beta").await.unwrap();

    assert_eq!(config.types["server"].get("from"), Some(&json!("alpha")));
    assert_eq!(
        config.conflicts,
        vec![ConflictRecord {
            type_key: "alpha.server".to_owned(),
            original_domain: "alpha".to_owned(),
            duplicate_domain: "beta".to_owned(),
        }]
    );
    assert_eq!(config.resolve("alpha.server"), config.types.get("server"));
    assert!(config.resolve("beta.server").is_none());
    assert_eq!(config.origin_of("server"), Some("alpha"));
}

#[tokio::test]
async fn tie_break_is_stable_across_rebuilds() {
    let (registry, _) = registry(TypeMap::new());
    registry.register_package(package("alpha", types(&[("k", json!({"v": "a"}))]))).await.unwrap();
    registry.register_package(package("beta", types(&[("k", json!({"v": "b"}))]))).await.unwrap();

    registry.activate("beta").await.unwrap();
    registry.activate("alpha").await.unwrap();
    for _ in 0..3 {
        let config = registry.rebuild().await.unwrap();
        assert_eq!(config.types["k"].get("v"), Some(&json!("b")));
        assert_eq!(config.conflicts.len(), 1);
    }
}

#[tokio::test]
async fn rebuild_is_idempotent() {
    let (registry, _) = registry(types(&[("host", json!({"shape": "box"}))]));
    registry
        .register_package(package("alpha", types(&[("host", json!({})), ("ip", json!({"icon": "x.svg"}))])))
        .await
        .unwrap();
    registry.activate("alpha").await.unwrap();

    let first = serde_json::to_vec(&*registry.rebuild().await.unwrap()).unwrap();
    let second = serde_json::to_vec(&*registry.rebuild().await.unwrap()).unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn default_domain_always_wins() {
    let (registry, _) = registry(types(&[("host", json!({"from": "default"}))]));
    registry.register_package(package("alpha", types(&[("host", json!({"from": "alpha"}))]))).await.unwrap();

    let config = registry.activate("alpha").await.unwrap();
    assert_eq!(config.types["host"].get("from"), Some(&json!("default")));
    assert_eq!(config.conflicts.len(), 1);
    assert_eq!(config.conflicts[0].type_key, "host");
    assert_eq!(config.conflicts[0].original_domain, "default");
    assert_eq!(config.conflicts[0].duplicate_domain, "alpha");
}

#[tokio::test]
async fn registration_rejects_known_keys() {
    let (registry, _) = registry(TypeMap::new());
    registry.register_package(package("alpha", types(&[("a", json!({}))]))).await.unwrap();

    let err = registry.register_package(package("alpha", types(&[("a", json!({}))]))).await.unwrap_err();
    assert!(matches!(err, RegistryError::DomainAlreadyExists { .. }));
    let err = registry.register_package(package("default", types(&[("a", json!({}))]))).await.unwrap_err();
    assert_eq!(err.kind(), "DomainAlreadyExists");
}

#[tokio::test]
async fn registered_domains_start_inactive() {
    let (registry, store) = registry(TypeMap::new());
    let persisted = registry.register_package(package("alpha", types(&[("a", json!({}))]))).await.unwrap();

    assert!(persisted);
    assert!(store.len() >= 2);
    assert!(registry.active_configuration().types.is_empty());
    let summary = registry.domains().await;
    assert_eq!(summary[0].key, "default");
    assert_eq!(summary[1].state, DomainState::Loaded);
    assert_eq!(summary[1].type_count, 1);
}

#[tokio::test]
async fn deactivation_rules() {
    let (registry, _) = registry(TypeMap::new());
    registry.register_package(package("alpha", types(&[("a", json!({}))]))).await.unwrap();
    registry.activate("alpha").await.unwrap();

    assert!(matches!(registry.deactivate("default").await, Err(RegistryError::DefaultDomainLocked { .. })));
    assert!(matches!(registry.deactivate("nope").await, Err(RegistryError::UnknownDomain { .. })));
    assert!(matches!(registry.activate("nope").await, Err(RegistryError::UnknownDomain { .. })));

    let config = registry.deactivate("alpha").await.unwrap();
    assert!(config.types.is_empty());
    assert!(registry.activate("default").await.is_ok());
}

#[tokio::test]
async fn delete_removes_types_and_cache() {
    let (registry, store) = registry(TypeMap::new());
    registry.register_package(package("alpha", types(&[("a", json!({}))]))).await.unwrap();
    registry.activate("alpha").await.unwrap();

    assert!(registry.delete_domain("alpha").await);
    assert!(registry.active_configuration().types.is_empty());
    assert!(!registry.contains("alpha").await);
    assert!(registry.cache().scan_domains().await.is_empty());
    assert_eq!(store.len(), 1, "only the activation order remains");

    assert!(!registry.delete_domain("alpha").await);
    assert!(!registry.delete_domain("default").await);
}

#[tokio::test]
async fn deleting_the_owner_lets_the_duplicate_in() {
    let (registry, _) = registry(TypeMap::new());
    registry.register_package(package("alpha", types(&[("server", json!({"from": "alpha"}))]))).await.unwrap();
    registry.register_package(package("beta", types(&[("server", json!({"from": "beta"}))]))).await.unwrap();
    registry.activate("alpha").await.unwrap();
    registry.activate("beta").await.unwrap();

    registry.delete_domain("alpha").await;
    let config = registry.active_configuration();
    assert_eq!(config.types["server"].get("from"), Some(&json!("beta")));
    assert!(config.conflicts.is_empty());
    assert_eq!(config.aliases.get("beta.server").map(String::as_str), Some("server"));
}

#[tokio::test]
async fn icons_are_embedded_and_extracted() {
    let (registry, _) = registry(TypeMap::new());
    let mut pkg = package("alpha", types(&[("server", json!({"icon": "icons/server.png"}))]));
    pkg.icon_assets.push(IconAsset {
        relative_path: "icons/server.png".to_owned(),
        bytes: vec![0xff, 0x00],
        mime_type: "image/png",
    });
    registry.register_package(pkg).await.unwrap();

    let config = registry.activate("alpha").await.unwrap();
    assert_eq!(config.icons["server"], "data:image/png;base64,/wA=");
    assert_eq!(config.types["server"].icon_source(), Some("icons/server.png"));
}

#[tokio::test]
async fn virtual_domains_participate_once_loaded() {
    let (registry, _) = registry(TypeMap::new());
    let meta = |key: &str| DomainMeta { key: key.to_owned(), display_name: key.to_owned(), description: String::new() };

    registry.recover_domain(meta("ghost"), None).await.unwrap();
    registry.recover_domain(meta("cached"), Some(types(&[("c", json!({}))]))).await.unwrap();

    assert!(matches!(registry.activate("ghost").await, Err(RegistryError::DomainNotLoaded { .. })));
    let config = registry
        .restore_activation(&["ghost".to_owned(), "cached".to_owned(), "missing".to_owned()])
        .await
        .unwrap();
    assert!(config.types.contains_key("c"));
    assert_eq!(registry.active_domains().await, ["cached"]);

    let summary = registry.domains().await;
    let ghost = summary.iter().find(|d| d.key == "ghost").unwrap();
    assert_eq!(ghost.state, DomainState::Pending);
    assert!(ghost.is_virtual);

    registry.reload_domain("ghost", types(&[("g", json!({}))])).await.unwrap();
    assert!(registry.is_loaded("ghost").await);
    assert!(!registry.domains().await.iter().any(|d| d.key == "ghost" && d.is_virtual));
}

#[tokio::test]
async fn reload_replaces_types_wholesale() {
    let (registry, _) = registry(TypeMap::new());
    registry.register_package(package("alpha", types(&[("a", json!({})), ("b", json!({}))]))).await.unwrap();
    registry.activate("alpha").await.unwrap();

    let config = registry.reload_domain("alpha", types(&[("c", json!({}))])).await.unwrap();
    assert_eq!(config.types.keys().collect::<Vec<_>>(), ["c"]);
    assert_eq!(registry.cache().load("alpha").await.unwrap().len(), 1);

    assert!(matches!(
        registry.reload_domain("default", TypeMap::new()).await,
        Err(RegistryError::DefaultDomainLocked { .. })
    ));
}

#[tokio::test]
async fn bare_name_matching_a_canonical_alias_conflicts() {
    let (registry, _) = registry(TypeMap::new());
    registry.register_package(package("alpha", types(&[("server", json!({"from": "alpha"}))]))).await.unwrap();
    registry
        .register_package(package("beta", types(&[("alpha.server", json!({"from": "beta"}))])))
        .await
        .unwrap();
    registry.activate("alpha").await.unwrap();

    let config = registry.activate("beta").await.unwrap();
    assert_eq!(config.resolve("alpha.server").and_then(|d| d.get("from")), Some(&json!("alpha")));
    assert_eq!(config.conflicts.len(), 1);
}

#[tokio::test]
async fn canonical_key_taken_as_bare_name_conflicts_in_either_order() {
    let (registry, _) = registry(TypeMap::new());
    registry.register_package(package("alpha", types(&[("server", json!({"from": "alpha"}))]))).await.unwrap();
    registry
        .register_package(package("beta", types(&[("alpha.server", json!({"from": "beta"}))])))
        .await
        .unwrap();
    registry.activate("beta").await.unwrap();

    let config = registry.activate("alpha").await.unwrap();
    assert_eq!(config.resolve("alpha.server").and_then(|d| d.get("from")), Some(&json!("beta")));
    assert!(!config.types.contains_key("server"));
    assert_eq!(
        config.conflicts,
        vec![ConflictRecord {
            type_key: "alpha.server".to_owned(),
            original_domain: "beta".to_owned(),
            duplicate_domain: "alpha".to_owned(),
        }]
    );

    let again = registry.rebuild().await.unwrap();
    assert_eq!(again.conflicts, config.conflicts);
}
