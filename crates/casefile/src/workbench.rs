use crate::error::{WorkbenchError, WorkbenchErrorExt};
use crate::manifest::{ManifestDomain, ManifestSource};
use casefile_domain::DEFAULT_DOMAIN;
use casefile_domain::config::{CasefileConfig, CompressionKind};
use casefile_domain::naming;
use casefile_domain::package::DecodedPackage;
use casefile_domain::registry::{ActiveConfiguration, DomainSummary};
use casefile_domain::types::{TypeDefinition, TypeMap};
use casefile_package::{ImportError, PackageDecoder};
use casefile_registry::{DomainCache, KeyValueStore, RegistryError, TypeRegistry};
use casefile_storage::{Compression, NamespacedStorage, Storage};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Storage namespace holding the domain cache.
pub const CACHE_NAMESPACE: &str = "cache";

/// Result of a successful import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOutcome {
    pub domain_key: String,
    pub display_name: String,
    /// Whether the domain reached persistent storage; `false` means this session only.
    pub persisted: bool,
    pub warnings: Vec<String>,
}

/// What a manifest sync did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub refreshed: Vec<String>,
    /// Domains whose cached copy was still valid.
    pub skipped: Vec<String>,
    /// Types added, removed or modified compared with the stale cache (forced sync only).
    pub changed_types: usize,
    pub warnings: Vec<String>,
}

/// Application context: decoder, registry and cache wired from one configuration.
#[derive(Debug)]
pub struct Workbench<S: KeyValueStore = NamespacedStorage> {
    config: CasefileConfig,
    decoder: PackageDecoder,
    registry: TypeRegistry<S>,
}

impl Workbench<NamespacedStorage> {
    /// Connects the on-disk cache under `storage.data_dir` and recovers earlier domains.
    ///
    /// # Errors
    /// Fails if the data directory cannot be opened or the default types cannot be loaded.
    pub async fn open(config: CasefileConfig) -> Result<Self, WorkbenchError> {
        let compression = match config.storage.compression {
            CompressionKind::None => Compression::None,
            CompressionKind::Lz4 => Compression::Lz4,
        };
        let storage = Storage::builder()
            .root(config.storage.data_dir.clone())
            .create(true)
            .compression(compression)
            .connect()
            .await
            .context("opening data directory")?;
        let store = storage.namespace(CACHE_NAMESPACE)?;
        Self::with_store(config, store).await
    }
}

impl<S: KeyValueStore> Workbench<S> {
    /// Builds a workbench over any store, then runs [`Self::recover`].
    ///
    /// # Errors
    /// Fails if the default types cannot be loaded or recovery cannot publish a configuration.
    pub async fn with_store(config: CasefileConfig, store: S) -> Result<Self, WorkbenchError> {
        let default_types = match &config.registry.default_types {
            Some(path) => load_default_types(path).await?,
            None => TypeMap::new(),
        };
        let workbench = Self {
            decoder: PackageDecoder::from_config(&config),
            registry: TypeRegistry::new(DomainCache::new(store), default_types),
            config,
        };
        workbench.recover().await?;
        Ok(workbench)
    }

    pub const fn config(&self) -> &CasefileConfig {
        &self.config
    }

    pub const fn registry(&self) -> &TypeRegistry<S> {
        &self.registry
    }

    pub fn active_configuration(&self) -> Arc<ActiveConfiguration> {
        self.registry.active_configuration()
    }

    pub async fn domains(&self) -> Vec<DomainSummary> {
        self.registry.domains().await
    }

    /// Decodes a package archive and registers it as a new domain.
    ///
    /// # Errors
    /// Any [`ImportError`]; the registry is unchanged on failure.
    pub async fn import_package(&self, archive: &[u8]) -> Result<ImportOutcome, ImportError> {
        let package = self.decoder.decode(archive)?;
        self.register(package).await
    }

    /// Like [`Self::import_package`]; `fallback_name` names flat archives without a folder.
    ///
    /// # Errors
    /// Any [`ImportError`]; the registry is unchanged on failure.
    pub async fn import_package_named(
        &self,
        archive: &[u8],
        fallback_name: &str,
    ) -> Result<ImportOutcome, ImportError> {
        let package = self.decoder.decode_with_fallback(archive, fallback_name)?;
        self.register(package).await
    }

    async fn register(&self, package: DecodedPackage) -> Result<ImportOutcome, ImportError> {
        let domain_key = package.domain_key.clone();
        let display_name = package.display_name.clone();
        let warnings = package.warnings.clone();

        let persisted = self.registry.register_package(package).await.map_err(|err| match err {
            RegistryError::DomainAlreadyExists { key, .. } => {
                ImportError::DomainAlreadyExists { key, context: None }
            }
            other => ImportError::Internal { message: other.to_string().into(), context: None },
        })?;

        if self.config.registry.activate_on_import
            && let Err(err) = self.registry.activate(&domain_key).await
        {
            warn!(domain = %domain_key, error = %err, "Imported domain could not be activated");
        }

        info!(domain = %domain_key, persisted, warnings = warnings.len(), "Package imported");
        Ok(ImportOutcome { domain_key, display_name, persisted, warnings })
    }

    /// Registers every domain found in the cache as virtual and restores the activation order.
    /// A dirty cache entry is still used, since nothing else backs a recovered domain.
    /// Domains already in the registry are left alone. Returns how many were recovered.
    ///
    /// # Errors
    /// [`WorkbenchError::Registry`] if the restored configuration cannot be published.
    pub async fn recover(&self) -> Result<usize, WorkbenchError> {
        let cache = self.registry.cache();
        let mut recovered = 0;

        for meta in cache.scan_domains().await {
            if self.registry.contains(&meta.key).await {
                continue;
            }
            let types = match cache.load(&meta.key).await {
                Some(types) => Some(types),
                None => {
                    let stale = cache.load_stale(&meta.key).await;
                    if stale.is_some() {
                        warn!(domain = %meta.key, "Recovering domain from a dirty cache entry");
                    }
                    stale
                }
            };
            self.registry.recover_domain(meta, types).await?;
            recovered += 1;
        }

        let order = cache.load_active().await.unwrap_or_default();
        self.registry.restore_activation(&order).await.context("restoring activation order")?;
        info!(recovered, active = order.len(), "Cached domains recovered");
        Ok(recovered)
    }

    /// Pulls every domain listed by `source`.
    ///
    /// Without `force`, domains that are loaded and still have a clean cache entry are
    /// skipped. With `force`, the whole cache is invalidated first, every listed domain is
    /// re-fetched and the difference to the stale cached copy is counted and logged. Cached
    /// domains the sync did not refresh get their dirty flag cleared afterwards.
    ///
    /// # Errors
    /// Fails if the manifest itself cannot be fetched or a rebuild is rejected. Unreadable
    /// files only produce warnings.
    pub async fn sync_manifest<M: ManifestSource>(
        &self,
        source: &M,
        force: bool,
    ) -> Result<SyncReport, WorkbenchError> {
        let manifest = source.fetch_manifest().await.context("fetching manifest")?;
        let cache = self.registry.cache();
        let mut report = SyncReport::default();

        if force {
            let invalidated = cache.invalidate_all().await;
            info!(invalidated, "Cache invalidated for forced sync");
        }

        for entry in manifest.domains {
            let key = naming::domain_key(&entry.key);
            if key.is_empty() || key == DEFAULT_DOMAIN {
                warn!(key = %entry.key, "Manifest domain key rejected");
                report.warnings.push(format!("manifest domain '{}' has an unusable key", entry.key));
                continue;
            }
            if !force && self.registry.is_loaded(&key).await && cache.load(&key).await.is_some() {
                report.skipped.push(key);
                continue;
            }

            let types = fetch_types(source, &entry, &mut report.warnings).await;
            if types.is_empty() {
                report.warnings.push(format!("manifest domain '{key}' yielded no type definitions"));
                continue;
            }

            if force {
                let stale = cache.load_stale(&key).await.unwrap_or_default();
                let changed = count_changes(&stale, &types);
                info!(domain = %key, changed, "Forced reload compared with cached copy");
                report.changed_types += changed;
            }

            if self.registry.contains(&key).await {
                self.registry.reload_domain(&key, types).await?;
            } else {
                let package = DecodedPackage {
                    folder_name: entry.key.clone(),
                    display_name: entry
                        .name
                        .clone()
                        .unwrap_or_else(|| naming::display_name(&entry.key)),
                    description: entry.description.clone().unwrap_or_default(),
                    domain_key: key.clone(),
                    type_definitions: types,
                    icon_assets: Vec::new(),
                    warnings: Vec::new(),
                };
                self.registry.register_package(package).await?;
                if self.config.registry.activate_on_import {
                    self.registry.activate(&key).await?;
                }
            }
            report.refreshed.push(key);
        }

        if force {
            let restored = self.restore_unsynced(&report.refreshed).await;
            info!(restored, "Domains outside the manifest kept their cached types");
        }

        info!(
            refreshed = report.refreshed.len(),
            skipped = report.skipped.len(),
            changed = report.changed_types,
            "Manifest sync finished"
        );
        Ok(report)
    }

    /// Clears the dirty flag of every cached domain a forced sync did not refresh. Their
    /// cached types are the only copy, so they are stored back unchanged.
    async fn restore_unsynced(&self, refreshed: &[String]) -> usize {
        let cache = self.registry.cache();
        let mut restored = 0;
        for key in cache.cached_domains().await {
            if refreshed.contains(&key) || !cache.is_dirty(&key).await {
                continue;
            }
            if let Some(types) = cache.load_stale(&key).await
                && cache.store(&key, &types).await
            {
                restored += 1;
            }
        }
        restored
    }

    /// # Errors
    /// See [`TypeRegistry::activate`].
    pub async fn activate(&self, key: &str) -> Result<Arc<ActiveConfiguration>, WorkbenchError> {
        Ok(self.registry.activate(key).await?)
    }

    /// # Errors
    /// See [`TypeRegistry::deactivate`].
    pub async fn deactivate(&self, key: &str) -> Result<Arc<ActiveConfiguration>, WorkbenchError> {
        Ok(self.registry.deactivate(key).await?)
    }

    /// Returns `false` for unknown keys and `default`.
    pub async fn delete_domain(&self, key: &str) -> bool {
        self.registry.delete_domain(key).await
    }
}

async fn fetch_types<M: ManifestSource>(
    source: &M,
    entry: &ManifestDomain,
    warnings: &mut Vec<String>,
) -> TypeMap {
    let mut types = TypeMap::new();
    for file in &entry.files {
        let name = file.rsplit('/').next().unwrap_or(file).trim_end_matches(".json");
        let definition = match source.fetch_file(file).await {
            Ok(bytes) => serde_json::from_slice(&bytes).ok().and_then(TypeDefinition::from_value),
            Err(err) => {
                warnings.push(format!("{file}: {err}"));
                continue;
            }
        };
        match definition {
            Some(definition) if !name.is_empty() => {
                types.insert(name.to_owned(), definition);
            }
            _ => warnings.push(format!("{file}: not a JSON object type definition")),
        }
    }
    types
}

/// Definitions added, removed or modified between two type maps.
fn count_changes(stale: &TypeMap, fresh: &TypeMap) -> usize {
    let removed = stale.keys().filter(|name| !fresh.contains_key(*name)).count();
    let changed = fresh.iter().filter(|(name, def)| stale.get(*name) != Some(*def)).count();
    removed + changed
}

/// Reads a JSON object of default-domain type definitions.
async fn load_default_types(path: &Path) -> Result<TypeMap, WorkbenchError> {
    let bytes = tokio::fs::read(path)
        .await
        .context(format!("reading default types {}", path.display()))?;
    let raw: serde_json::Map<String, serde_json::Value> =
        serde_json::from_slice::<serde_json::Map<String, serde_json::Value>>(&bytes)
            .context("parsing default types")?;

    let mut types = TypeMap::new();
    for (name, value) in raw {
        match TypeDefinition::from_value(value) {
            Some(definition) => {
                types.insert(name, definition);
            }
            None => warn!(r#type = %name, "Default type is not a JSON object, skipped"),
        }
    }
    info!(types = types.len(), path = %path.display(), "Default types loaded");
    Ok(types)
}
