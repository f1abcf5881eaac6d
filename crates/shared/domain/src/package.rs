//! Output of the package decoder.

use crate::types::TypeMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An image shipped inside a package.
#[derive(Clone, PartialEq, Eq)]
pub struct IconAsset {
    /// Path relative to the package folder, e.g. `icons/server.png`.
    pub relative_path: String,
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
}

impl IconAsset {
    /// Last path segment.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.relative_path.rsplit('/').next().unwrap_or(&self.relative_path)
    }

    /// Whether a type definition's `icon` value points at this asset.
    #[must_use]
    pub fn matches(&self, reference: &str) -> bool {
        let reference = reference.trim_start_matches("./");
        reference == self.relative_path || reference == self.file_name()
    }
}

impl fmt::Debug for IconAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IconAsset")
            .field("relative_path", &self.relative_path)
            .field("bytes", &self.bytes.len())
            .field("mime_type", &self.mime_type)
            .finish()
    }
}

/// Optional `meta.json` document at the package root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PackageMeta {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// One decoded archive, ready to become a domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPackage {
    pub folder_name: String,
    pub domain_key: String,
    pub display_name: String,
    pub description: String,
    pub type_definitions: TypeMap,
    pub icon_assets: Vec<IconAsset>,
    pub warnings: Vec<String>,
}

/// Persisted identity of a domain, used to recover it after a restart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainMeta {
    pub key: String,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
}

impl From<&DecodedPackage> for DomainMeta {
    fn from(pkg: &DecodedPackage) -> Self {
        Self {
            key: pkg.domain_key.clone(),
            display_name: pkg.display_name.clone(),
            description: pkg.description.clone(),
        }
    }
}
