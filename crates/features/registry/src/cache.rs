//! Per-domain persistence with a dirty bit.
//!
//! Layout (owned here, callers never build keys):
//!
//! ```text
//! domains/<key>/meta    DomainMeta as JSON
//! domains/<key>/types   TypeMap as JSON
//! domains/<key>/dirty   present while the cached types must not be trusted
//! registry/active       activation order as a JSON array
//! ```

use crate::error::{CacheError, CacheErrorExt};
use crate::store::KeyValueStore;
use casefile_domain::package::DomainMeta;
use casefile_domain::types::TypeMap;
use serde_json::from_slice;
use std::collections::BTreeSet;
use tracing::{debug, warn};

const DOMAINS_PREFIX: &str = "domains/";
const ACTIVE_KEY: &str = "registry/active";
const DIRTY_MARKER: &[u8] = b"1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Meta,
    Types,
    Dirty,
}

impl Field {
    const ALL: [Self; 3] = [Self::Meta, Self::Types, Self::Dirty];

    const fn name(self) -> &'static str {
        match self {
            Self::Meta => "meta",
            Self::Types => "types",
            Self::Dirty => "dirty",
        }
    }

    fn key(self, domain: &str) -> String {
        format!("{DOMAINS_PREFIX}{domain}/{}", self.name())
    }
}

/// Domain cache over any [`KeyValueStore`].
///
/// No method returns an error: failed reads count as misses and failed writes are logged,
/// leaving the change in memory only. Write methods report whether the value was persisted.
#[derive(Debug, Clone)]
pub struct DomainCache<S> {
    store: S,
}

impl<S: KeyValueStore> DomainCache<S> {
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    pub const fn store_ref(&self) -> &S {
        &self.store
    }

    /// Cached types, or `None` on a miss or while the dirty flag is set.
    pub async fn load(&self, domain: &str) -> Option<TypeMap> {
        if self.is_dirty(domain).await {
            debug!(domain, "Cache entry dirty, treating as miss");
            return None;
        }
        self.load_stale(domain).await
    }

    /// Cached types regardless of the dirty flag.
    pub async fn load_stale(&self, domain: &str) -> Option<TypeMap> {
        degrade_read(domain, self.read_json(&Field::Types.key(domain)).await)
    }

    /// Writes the types and clears the dirty flag.
    pub async fn store(&self, domain: &str, types: &TypeMap) -> bool {
        let result = async {
            let bytes = serde_json::to_vec(types).context("encoding type map")?;
            self.store.set(&Field::Types.key(domain), &bytes).await.context("writing types")?;
            self.store.remove(&Field::Dirty.key(domain)).await.context("clearing dirty flag")?;
            Ok::<(), CacheError>(())
        }
        .await;
        degrade_write(domain, "store", result)
    }

    /// Marks the cached types stale without deleting them.
    pub async fn invalidate(&self, domain: &str) -> bool {
        let result = self
            .store
            .set(&Field::Dirty.key(domain), DIRTY_MARKER)
            .await
            .context("setting dirty flag");
        degrade_write(domain, "invalidate", result)
    }

    /// Dirties every domain that has cached types. Returns how many were marked.
    pub async fn invalidate_all(&self) -> usize {
        let mut marked = 0;
        for domain in self.cached_domains().await {
            if self.invalidate(&domain).await {
                marked += 1;
            }
        }
        debug!(marked, "All cache entries invalidated");
        marked
    }

    pub async fn is_dirty(&self, domain: &str) -> bool {
        match self.store.get(&Field::Dirty.key(domain)).await {
            Ok(flag) => flag.is_some(),
            Err(err) => {
                warn!(domain, error = %err, "Dirty flag unreadable, assuming dirty");
                true
            }
        }
    }

    pub async fn store_meta(&self, meta: &DomainMeta) -> bool {
        let result = async {
            let bytes = serde_json::to_vec(meta).context("encoding domain meta")?;
            self.store.set(&Field::Meta.key(&meta.key), &bytes).await.context("writing meta")?;
            Ok::<(), CacheError>(())
        }
        .await;
        degrade_write(&meta.key, "store_meta", result)
    }

    /// Metadata of every domain persisted by an earlier session, sorted by key.
    pub async fn scan_domains(&self) -> Vec<DomainMeta> {
        let mut metas = Vec::new();
        for domain in self.domain_keys(Field::Meta).await {
            let meta = degrade_read::<DomainMeta>(&domain, self.read_json(&Field::Meta.key(&domain)).await);
            match meta {
                Some(meta) if meta.key == domain => metas.push(meta),
                Some(meta) => warn!(domain, stored = %meta.key, "Cached meta key mismatch, skipped"),
                None => {}
            }
        }
        metas
    }

    /// Domains with cached types, sorted.
    pub async fn cached_domains(&self) -> Vec<String> {
        self.domain_keys(Field::Types).await
    }

    /// Removes every key of `domain`. Returns `false` if any removal failed.
    pub async fn purge(&self, domain: &str) -> bool {
        let mut purged = true;
        for field in Field::ALL {
            let result = self.store.remove(&field.key(domain)).await.context("purging domain");
            purged &= degrade_write(domain, "purge", result);
        }
        purged
    }

    /// Persists the activation order.
    pub async fn store_active(&self, keys: &[String]) -> bool {
        let result = async {
            let bytes = serde_json::to_vec(keys).context("encoding activation order")?;
            self.store.set(ACTIVE_KEY, &bytes).await.context("writing activation order")?;
            Ok::<(), CacheError>(())
        }
        .await;
        degrade_write("registry", "store_active", result)
    }

    pub async fn load_active(&self) -> Option<Vec<String>> {
        degrade_read("registry", self.read_json(ACTIVE_KEY).await)
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<T>, CacheError> {
        let Some(bytes) = self.store.get(key).await.context("reading")? else {
            return Ok(None);
        };
        Ok(Some(from_slice::<T>(&bytes).context(key.to_owned())?))
    }

    async fn domain_keys(&self, field: Field) -> Vec<String> {
        let keys = match self.store.keys_with_prefix(DOMAINS_PREFIX).await {
            Ok(keys) => keys,
            Err(err) => {
                warn!(error = %err, "Cache scan failed");
                return Vec::new();
            }
        };
        let suffix = format!("/{}", field.name());
        keys.iter()
            .filter_map(|key| key.strip_prefix(DOMAINS_PREFIX)?.strip_suffix(&suffix))
            .filter(|domain| !domain.is_empty() && !domain.contains('/'))
            .map(str::to_owned)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

fn degrade_read<T>(domain: &str, result: Result<Option<T>, CacheError>) -> Option<T> {
    result.unwrap_or_else(|err| {
        warn!(domain, error = %err, "Cache read failed, treating as miss");
        None
    })
}

fn degrade_write(domain: &str, operation: &'static str, result: Result<(), CacheError>) -> bool {
    match result {
        Ok(()) => true,
        Err(err) => {
            warn!(domain, operation, error = %err, "Cache write failed, change kept in memory only");
            false
        }
    }
}
