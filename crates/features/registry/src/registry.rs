use crate::cache::DomainCache;
use crate::error::RegistryError;
use crate::icons::embed_icons;
use crate::merge::merge;
use crate::store::KeyValueStore;
use casefile_domain::DEFAULT_DOMAIN;
use casefile_domain::naming::canonical_key;
use casefile_domain::package::{DecodedPackage, DomainMeta};
use casefile_domain::registry::{ActiveConfiguration, DomainState, DomainSummary};
use casefile_domain::types::TypeMap;
use fxhash::FxHashMap;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// One registered, non-default domain.
#[derive(Debug)]
pub(crate) struct Domain {
    pub(crate) meta: DomainMeta,
    /// `None` until decoded or loaded from the cache.
    pub(crate) types: Option<TypeMap>,
    /// Recovered from cache metadata; its source is not confirmed to exist.
    pub(crate) is_virtual: bool,
}

/// Everything `rebuild` reads. Guarded by the registry mutex.
#[derive(Debug, Default)]
pub(crate) struct RegistryState {
    pub(crate) default_types: TypeMap,
    pub(crate) domains: BTreeMap<String, Domain>,
    /// Activation order of non-default domains.
    pub(crate) active: Vec<String>,
    /// Canonical key ledger: canonical name to owning domain, released only on delete.
    pub(crate) owners: FxHashMap<String, String>,
}

impl RegistryState {
    fn assign_owners(&mut self, domain: &str, types: &TypeMap) {
        for name in types.keys() {
            let canonical = canonical_key(domain, name);
            let owner = self.owners.entry(canonical).or_insert_with(|| domain.to_owned());
            if owner != domain {
                warn!(domain, r#type = %name, owner = %owner, "Canonical key already owned");
            }
        }
    }

    fn release_owners(&mut self, domain: &str) {
        self.owners.retain(|_, owner| owner != domain);
    }

    fn ensure_new(&self, key: &str) -> Result<(), RegistryError> {
        if key == DEFAULT_DOMAIN || self.domains.contains_key(key) {
            return Err(RegistryError::DomainAlreadyExists { key: key.to_owned(), context: None });
        }
        Ok(())
    }
}

/// The multi-domain type registry.
///
/// Mutations are serialized through an async mutex (they may await cache I/O); the merged
/// configuration is published behind a separate lock so readers never wait on a rebuild and
/// never observe a partial merge.
#[derive(Debug)]
pub struct TypeRegistry<S> {
    cache: DomainCache<S>,
    state: Mutex<RegistryState>,
    published: RwLock<Arc<ActiveConfiguration>>,
}

impl<S: KeyValueStore> TypeRegistry<S> {
    /// Creates a registry whose `default` domain holds `default_types`.
    pub fn new(cache: DomainCache<S>, default_types: TypeMap) -> Self {
        let state = RegistryState { default_types, ..RegistryState::default() };
        let initial = merge(&state).unwrap_or_else(|err| {
            error!(error = %err, "Default types failed to merge");
            ActiveConfiguration::default()
        });
        Self { cache, state: Mutex::new(state), published: RwLock::new(Arc::new(initial)) }
    }

    pub const fn cache(&self) -> &DomainCache<S> {
        &self.cache
    }

    /// The last successfully published configuration.
    pub fn active_configuration(&self) -> Arc<ActiveConfiguration> {
        Arc::clone(&self.published.read())
    }

    /// Registers a decoded package as a new, inactive domain and caches it.
    ///
    /// Icons referenced by the package's definitions are embedded as `data:` URIs and the raw
    /// bytes are dropped. Returns whether the domain reached persistent storage.
    ///
    /// # Errors
    /// [`RegistryError::DomainAlreadyExists`] if the key is `default` or already registered.
    pub async fn register_package(&self, package: DecodedPackage) -> Result<bool, RegistryError> {
        let mut state = self.state.lock().await;
        state.ensure_new(&package.domain_key)?;

        let meta = DomainMeta::from(&package);
        let DecodedPackage { mut type_definitions, icon_assets, .. } = package;
        let embedded = embed_icons(&mut type_definitions, &icon_assets);
        drop(icon_assets);

        let persisted = self.cache.store_meta(&meta).await
            & self.cache.store(&meta.key, &type_definitions).await;

        state.assign_owners(&meta.key, &type_definitions);
        info!(
            domain = %meta.key,
            types = type_definitions.len(),
            icons = embedded,
            persisted,
            "Domain registered"
        );
        state.domains.insert(
            meta.key.clone(),
            Domain { meta, types: Some(type_definitions), is_virtual: false },
        );
        Ok(persisted)
    }

    /// Registers a domain recovered from cached metadata. `types` is `None` on a cache miss.
    ///
    /// # Errors
    /// [`RegistryError::DomainAlreadyExists`] if the key is `default` or already registered.
    pub async fn recover_domain(
        &self,
        meta: DomainMeta,
        types: Option<TypeMap>,
    ) -> Result<(), RegistryError> {
        let mut state = self.state.lock().await;
        state.ensure_new(&meta.key)?;
        if let Some(types) = &types {
            state.assign_owners(&meta.key, types);
        }
        debug!(domain = %meta.key, loaded = types.is_some(), "Virtual domain recovered");
        state.domains.insert(meta.key.clone(), Domain { meta, types, is_virtual: true });
        Ok(())
    }

    /// Adds a domain to the end of the activation order and rebuilds.
    /// Activating `default` or an already active domain only rebuilds.
    ///
    /// # Errors
    /// - [`RegistryError::UnknownDomain`] / [`RegistryError::DomainNotLoaded`].
    /// - [`RegistryError::Inconsistent`] if the merge fails; nothing is published then.
    pub async fn activate(&self, key: &str) -> Result<Arc<ActiveConfiguration>, RegistryError> {
        let mut state = self.state.lock().await;
        if key != DEFAULT_DOMAIN {
            let domain = state
                .domains
                .get(key)
                .ok_or_else(|| RegistryError::UnknownDomain { key: key.to_owned(), context: None })?;
            if domain.types.is_none() {
                return Err(RegistryError::DomainNotLoaded { key: key.to_owned(), context: None });
            }
            if !state.active.iter().any(|active| active == key) {
                state.active.push(key.to_owned());
                self.cache.store_active(&state.active).await;
                info!(domain = key, position = state.active.len(), "Domain activated");
            }
        }
        self.publish(&state)
    }

    /// # Errors
    /// - [`RegistryError::DefaultDomainLocked`] for `default`.
    /// - [`RegistryError::UnknownDomain`] for unregistered keys.
    /// - [`RegistryError::Inconsistent`] if the merge fails.
    pub async fn deactivate(&self, key: &str) -> Result<Arc<ActiveConfiguration>, RegistryError> {
        if key == DEFAULT_DOMAIN {
            return Err(RegistryError::DefaultDomainLocked { context: None });
        }
        let mut state = self.state.lock().await;
        if !state.domains.contains_key(key) {
            return Err(RegistryError::UnknownDomain { key: key.to_owned(), context: None });
        }
        let before = state.active.len();
        state.active.retain(|active| active != key);
        if state.active.len() != before {
            self.cache.store_active(&state.active).await;
            info!(domain = key, "Domain deactivated");
        }
        self.publish(&state)
    }

    /// Restores a persisted activation order, skipping unknown or unloaded domains.
    ///
    /// # Errors
    /// [`RegistryError::Inconsistent`] if the merge fails.
    pub async fn restore_activation(
        &self,
        order: &[String],
    ) -> Result<Arc<ActiveConfiguration>, RegistryError> {
        let mut state = self.state.lock().await;
        let mut active = Vec::with_capacity(order.len());
        for key in order {
            let loaded = state.domains.get(key).is_some_and(|d| d.types.is_some());
            if loaded && !active.contains(key) {
                active.push(key.clone());
            } else {
                debug!(domain = %key, "Skipping unavailable domain in activation order");
            }
        }
        state.active = active;
        self.publish(&state)
    }

    /// Re-runs the merge over the current state and publishes the result.
    ///
    /// # Errors
    /// [`RegistryError::Inconsistent`] if the merge fails; the previous configuration stays.
    pub async fn rebuild(&self) -> Result<Arc<ActiveConfiguration>, RegistryError> {
        let state = self.state.lock().await;
        self.publish(&state)
    }

    /// Replaces a domain's types wholesale (forced reload), caches them and rebuilds.
    /// The domain stops being virtual.
    ///
    /// # Errors
    /// - [`RegistryError::DefaultDomainLocked`] for `default` (use [`Self::set_default_types`]).
    /// - [`RegistryError::UnknownDomain`] for unregistered keys.
    /// - [`RegistryError::Inconsistent`] if the merge fails.
    pub async fn reload_domain(
        &self,
        key: &str,
        types: TypeMap,
    ) -> Result<Arc<ActiveConfiguration>, RegistryError> {
        if key == DEFAULT_DOMAIN {
            return Err(RegistryError::DefaultDomainLocked { context: None });
        }
        let mut state = self.state.lock().await;
        if !state.domains.contains_key(key) {
            return Err(RegistryError::UnknownDomain { key: key.to_owned(), context: None });
        }

        self.cache.store(key, &types).await;
        state.assign_owners(key, &types);
        if let Some(domain) = state.domains.get_mut(key) {
            info!(domain = key, types = types.len(), "Domain reloaded");
            domain.types = Some(types);
            domain.is_virtual = false;
        }
        self.publish(&state)
    }

    /// Replaces the `default` domain's types and rebuilds.
    ///
    /// # Errors
    /// [`RegistryError::Inconsistent`] if the merge fails.
    pub async fn set_default_types(
        &self,
        types: TypeMap,
    ) -> Result<Arc<ActiveConfiguration>, RegistryError> {
        let mut state = self.state.lock().await;
        state.default_types = types;
        self.publish(&state)
    }

    /// Removes a domain from the registry and from the cache.
    /// Unknown keys and `default` are a silent no-op returning `false`.
    pub async fn delete_domain(&self, key: &str) -> bool {
        let mut state = self.state.lock().await;
        if key == DEFAULT_DOMAIN || state.domains.remove(key).is_none() {
            debug!(domain = key, "Delete ignored");
            return false;
        }
        state.active.retain(|active| active != key);
        state.release_owners(key);

        if let Err(err) = self.publish(&state) {
            error!(domain = key, error = %err, "Rebuild after delete failed");
        }
        self.cache.purge(key).await;
        self.cache.store_active(&state.active).await;
        info!(domain = key, "Domain deleted");
        true
    }

    /// Listing of every domain, `default` first.
    pub async fn domains(&self) -> Vec<DomainSummary> {
        let state = self.state.lock().await;
        let default = DomainSummary {
            key: DEFAULT_DOMAIN.to_owned(),
            display_name: "Default".to_owned(),
            description: String::new(),
            state: DomainState::Active,
            is_virtual: false,
            type_count: state.default_types.len(),
        };

        std::iter::once(default)
            .chain(state.domains.values().map(|domain| DomainSummary {
                key: domain.meta.key.clone(),
                display_name: domain.meta.display_name.clone(),
                description: domain.meta.description.clone(),
                state: if state.active.contains(&domain.meta.key) {
                    DomainState::Active
                } else if domain.types.is_some() {
                    DomainState::Loaded
                } else {
                    DomainState::Pending
                },
                is_virtual: domain.is_virtual,
                type_count: domain.types.as_ref().map_or(0, TypeMap::len),
            }))
            .collect()
    }

    pub async fn contains(&self, key: &str) -> bool {
        key == DEFAULT_DOMAIN || self.state.lock().await.domains.contains_key(key)
    }

    /// Whether `key` is registered with types available.
    pub async fn is_loaded(&self, key: &str) -> bool {
        self.state.lock().await.domains.get(key).is_some_and(|domain| domain.types.is_some())
    }

    /// Current activation order, excluding `default`.
    pub async fn active_domains(&self) -> Vec<String> {
        self.state.lock().await.active.clone()
    }

    fn publish(&self, state: &RegistryState) -> Result<Arc<ActiveConfiguration>, RegistryError> {
        let merged = Arc::new(merge(state).inspect_err(|err| {
            error!(error = %err, "Merge rejected, keeping previous configuration");
        })?);
        *self.published.write() = Arc::clone(&merged);
        info!(
            types = merged.types.len(),
            conflicts = merged.conflicts.len(),
            active = state.active.len(),
            "Configuration rebuilt"
        );
        for conflict in &merged.conflicts {
            warn!(
                type_key = %conflict.type_key,
                original = %conflict.original_domain,
                duplicate = %conflict.duplicate_domain,
                "Type conflict, keeping original"
            );
        }
        Ok(merged)
    }
}
