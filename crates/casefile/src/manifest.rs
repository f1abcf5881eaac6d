//! Remote (or local) manifests of already-known domains.
//!
//! A manifest lists domains and the type-definition files that make them up:
//!
//! ```json
//! { "domains": [ { "key": "acme", "name": "Acme", "files": ["acme/widget.json"] } ] }
//! ```

use crate::error::{WorkbenchError, WorkbenchErrorExt};
use serde::Deserialize;
use std::future::Future;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Manifest {
    pub domains: Vec<ManifestDomain>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ManifestDomain {
    pub key: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Type-definition documents, relative to the manifest root.
    #[serde(default)]
    pub files: Vec<String>,
}

/// Where manifests and their files come from.
pub trait ManifestSource: Send + Sync {
    fn fetch_manifest(&self) -> impl Future<Output = Result<Manifest, WorkbenchError>> + Send;

    fn fetch_file(&self, path: &str) -> impl Future<Output = Result<Vec<u8>, WorkbenchError>> + Send;
}

/// A manifest laid out in a local directory, `manifest.json` at its root.
#[derive(Debug, Clone)]
pub struct DirectoryManifestSource {
    root: PathBuf,
}

impl DirectoryManifestSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, relative: &str) -> Result<PathBuf, WorkbenchError> {
        let path = Path::new(relative);
        if !path.components().all(|c| matches!(c, Component::Normal(_) | Component::CurDir)) {
            return Err(WorkbenchError::UnsafePath { path: relative.to_owned(), context: None });
        }
        Ok(self.root.join(path))
    }
}

impl ManifestSource for DirectoryManifestSource {
    async fn fetch_manifest(&self) -> Result<Manifest, WorkbenchError> {
        let path = self.root.join(MANIFEST_FILE);
        let bytes = fs::read(&path).await.context(format!("reading {}", path.display()))?;
        serde_json::from_slice::<Manifest>(&bytes).context(format!("parsing {}", path.display()))
    }

    async fn fetch_file(&self, path: &str) -> Result<Vec<u8>, WorkbenchError> {
        let resolved = self.resolve(path)?;
        fs::read(&resolved).await.context(format!("reading {}", resolved.display()))
    }
}
