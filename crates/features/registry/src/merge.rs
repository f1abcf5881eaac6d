//! The pure merge step behind `TypeRegistry::rebuild`.

use crate::error::RegistryError;
use crate::registry::RegistryState;
use casefile_domain::DEFAULT_DOMAIN;
use casefile_domain::naming::canonical_key;
use casefile_domain::registry::{ActiveConfiguration, ConflictRecord};
use fxhash::FxHashSet;

/// Builds the configuration for the current state. Does not touch published state.
pub(crate) fn merge(state: &RegistryState) -> Result<ActiveConfiguration, RegistryError> {
    let mut merged = ActiveConfiguration::default();
    let mut seen = FxHashSet::default();

    for (name, definition) in &state.default_types {
        merged.types.insert(name.clone(), definition.clone());
        merged.origins.insert(name.clone(), DEFAULT_DOMAIN.to_owned());
    }

    for key in &state.active {
        let Some(types) = state.domains.get(key).and_then(|domain| domain.types.as_ref()) else {
            continue;
        };

        for (name, definition) in types {
            let canonical = canonical_key(key, name);
            let aliased = |alias: &str| merged.aliases.get(alias).and_then(|bare| merged.origins.get(bare));
            let by_name = |owner: &String| (owner.clone(), canonical_key(owner, name));
            // A bare name taken by another domain may equal this type's canonical key.
            let owner = merged
                .origins
                .get(name)
                .map(by_name)
                .or_else(|| aliased(name).map(by_name))
                .or_else(|| aliased(&canonical).map(by_name))
                .or_else(|| merged.origins.get(&canonical).map(|owner| (owner.clone(), canonical.clone())))
                .filter(|(owner, _)| owner != key);

            if let Some((owner, type_key)) = owner {
                let record = ConflictRecord {
                    type_key,
                    original_domain: owner,
                    duplicate_domain: key.clone(),
                };
                if seen.insert(record.clone()) {
                    merged.conflicts.push(record);
                }
                continue;
            }

            merged.types.insert(name.clone(), definition.clone());
            merged.origins.insert(name.clone(), key.clone());
            if canonical != *name {
                merged.aliases.insert(canonical, name.clone());
            }
        }
    }

    for (name, definition) in &merged.types {
        if let Some(icon) = definition.icon() {
            merged.icons.insert(name.clone(), icon.to_owned());
        }
    }

    check_consistency(&merged, state)?;
    Ok(merged)
}

/// Every alias resolves, every type has an origin, conflicts only name known domains and
/// aliases agree with the canonical owner ledger.
fn check_consistency(
    merged: &ActiveConfiguration,
    state: &RegistryState,
) -> Result<(), RegistryError> {
    let known = |domain: &str| domain == DEFAULT_DOMAIN || state.domains.contains_key(domain);
    let inconsistent = |message: String| RegistryError::Inconsistent { message: message.into(), context: None };

    for (alias, bare) in &merged.aliases {
        if !merged.types.contains_key(bare) {
            return Err(inconsistent(format!("alias '{alias}' points at missing type '{bare}'")));
        }
        let origin = merged.origins.get(bare).map(String::as_str);
        if let Some(owner) = state.owners.get(alias)
            && Some(owner.as_str()) != origin
        {
            return Err(inconsistent(format!("alias '{alias}' is owned by '{owner}'")));
        }
    }
    for name in merged.types.keys() {
        match merged.origins.get(name) {
            Some(origin) if known(origin) => {}
            _ => return Err(inconsistent(format!("type '{name}' has no registered origin"))),
        }
    }
    if let Some(record) = merged
        .conflicts
        .iter()
        .find(|r| !known(&r.original_domain) || !known(&r.duplicate_domain))
    {
        return Err(inconsistent(format!("conflict on '{}' names a removed domain", record.type_key)));
    }
    Ok(())
}
