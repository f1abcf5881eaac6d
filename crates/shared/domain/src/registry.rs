//! Published registry output and listing types.

use crate::types::{IconReference, TypeDefinition, TypeMap};
use serde::Serialize;
use std::collections::BTreeMap;

/// A rejected definition: `duplicate_domain` tried to claim a key owned by `original_domain`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictRecord {
    pub type_key: String,
    pub original_domain: String,
    pub duplicate_domain: String,
}

/// The merged view handed to the renderer after every rebuild.
///
/// `types` is keyed by the original (bare) type name. `aliases` maps each canonical
/// key to the bare key it resolves to; `origins` maps each bare key to its owning domain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveConfiguration {
    pub types: TypeMap,
    pub icons: BTreeMap<String, IconReference>,
    pub aliases: BTreeMap<String, String>,
    pub origins: BTreeMap<String, String>,
    pub conflicts: Vec<ConflictRecord>,
}

impl ActiveConfiguration {
    /// Looks up a definition by bare or canonical key.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<&TypeDefinition> {
        self.types
            .get(name)
            .or_else(|| self.aliases.get(name).and_then(|bare| self.types.get(bare)))
    }

    #[must_use]
    pub fn origin_of(&self, name: &str) -> Option<&str> {
        let bare = if self.types.contains_key(name) { name } else { self.aliases.get(name)? };
        self.origins.get(bare).map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DomainState {
    /// Known from cached metadata, types not available yet.
    Pending,
    Loaded,
    Active,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainSummary {
    pub key: String,
    pub display_name: String,
    pub description: String,
    pub state: DomainState,
    #[serde(rename = "virtual")]
    pub is_virtual: bool,
    pub type_count: usize,
}
