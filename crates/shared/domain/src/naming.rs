//! Naming rules shared by the decoder (domain keys) and the registry (canonical keys).

use crate::DEFAULT_DOMAIN;

/// Lowercases `folder` and collapses every run of non-alphanumeric characters into `_`.
/// Leading and trailing separators are dropped.
///
/// ```
/// use casefile_domain::naming::domain_key;
///
/// assert_eq!(domain_key("Acme Threat-Intel"), "acme_threat_intel");
/// assert_eq!(domain_key("--x--"), "x");
/// ```
#[must_use]
pub fn domain_key(folder: &str) -> String {
    let mut key = String::with_capacity(folder.len());
    let mut pending_separator = false;

    for c in folder.chars() {
        if c.is_alphanumeric() {
            if pending_separator && !key.is_empty() {
                key.push('_');
            }
            pending_separator = false;
            key.extend(c.to_lowercase());
        } else {
            pending_separator = true;
        }
    }

    key
}

/// Title-cases a folder name, treating `-`, `_`, `.` and whitespace as word breaks.
///
/// ```
/// use casefile_domain::naming::display_name;
///
/// assert_eq!(display_name("acme-threat_intel"), "Acme Threat Intel");
/// ```
#[must_use]
pub fn display_name(folder: &str) -> String {
    folder
        .split(|c: char| c == '-' || c == '_' || c == '.' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// The domain-qualified key used to detect cross-domain collisions.
///
/// ```
/// use casefile_domain::naming::canonical_key;
///
/// assert_eq!(canonical_key("alpha", "server"), "alpha.server");
/// assert_eq!(canonical_key("alpha", "alpha.server"), "alpha.server");
/// assert_eq!(canonical_key("default", "server"), "server");
/// ```
#[must_use]
pub fn canonical_key(domain: &str, type_name: &str) -> String {
    if domain == DEFAULT_DOMAIN {
        return type_name.to_owned();
    }
    let already_prefixed = type_name
        .strip_prefix(domain)
        .is_some_and(|rest| rest.starts_with('.'));
    if already_prefixed { type_name.to_owned() } else { format!("{domain}.{type_name}") }
}
