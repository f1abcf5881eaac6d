//! Core storage engine: sandboxed, atomic and optionally compressed file I/O.

use crate::builder::StorageBuilder;
use crate::error::{StorageError, StorageErrorExt};
use crate::listing;
use crate::maintenance;
use crate::namespace::{NamespaceName, NamespacedStorage};
use crate::security;
use std::io::ErrorKind;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Marker embedded in temp file names; the maintenance sweep looks for it.
pub(crate) const TMP_MARKER: &str = ".cftmp.";

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub enum Compression {
    #[default]
    None,
    Lz4,
}

impl Compression {
    fn compress(self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::None => data.to_vec(),
            Self::Lz4 => lz4_flex::compress_prepend_size(data),
        }
    }

    fn decompress(self, data: Vec<u8>) -> Result<Vec<u8>, StorageError> {
        match self {
            Self::None => Ok(data),
            Self::Lz4 => {
                lz4_flex::decompress_size_prepended(&data).context("Lz4 decompression failed")
            },
        }
    }
}

/// The shared state behind a [`Storage`] handle.
#[derive(Debug)]
pub struct StorageInner {
    /// Canonical physical root; every resolved path must stay below it.
    pub(crate) root: PathBuf,
    pub(crate) compression: Compression,
    /// Source of unique temp file suffixes.
    pub(crate) tmp_counter: AtomicU64,
}

/// A cheaply cloneable handle to the storage engine.
///
/// Data is only reachable through a [`NamespacedStorage`] view obtained from
/// [`Storage::namespace`]; the root itself is reserved for namespace directories.
#[derive(Debug, Clone)]
pub struct Storage {
    pub(crate) inner: Arc<StorageInner>,
}

impl Deref for Storage {
    type Target = StorageInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl Storage {
    #[must_use = "The storage engine is not initialized until you call .connect()"]
    pub fn builder() -> StorageBuilder {
        StorageBuilder::new()
    }

    /// Returns a namespaced view of the storage engine.
    ///
    /// Names are lowercased and must be non-empty ASCII alphanumerics or underscores.
    ///
    /// # Errors
    /// Returns [`StorageError::PathTraversalAttempt`] if the name is empty or
    /// contains illegal characters.
    pub fn namespace<N>(&self, name: N) -> Result<NamespacedStorage, StorageError>
    where
        N: TryInto<NamespaceName, Error = StorageError>,
    {
        let ns = name.try_into()?;
        Ok(NamespacedStorage::new(self.clone(), ns.0))
    }

    /// Resolves a relative path against the root without namespace or sharding.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::PathTraversalAttempt`] if the path tries to escape the sandbox.
    pub fn resolve(&self, path: impl AsRef<Path>) -> Result<PathBuf, StorageError> {
        security::resolve_path(&self.root, path)
    }

    /// Removes temp files older than the staleness threshold left behind by crashed writers.
    pub async fn purge_tmp(&self) {
        maintenance::purge_tmp(&self.root).await;
    }

    pub(crate) fn resolve_internal(
        &self,
        namespace: &str,
        path: impl AsRef<Path>,
    ) -> Result<PathBuf, StorageError> {
        security::resolve_sharding(&self.root, Some(namespace), path)
    }

    pub(crate) async fn read_internal(
        &self,
        namespace: &str,
        path: impl AsRef<Path>,
    ) -> Result<Vec<u8>, StorageError> {
        let resolved = self.resolve_internal(namespace, path)?;

        let data = match fs::read(&resolved).await {
            Ok(data) => data,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(StorageError::FileNotFound {
                    message: resolved.display().to_string().into(),
                    context: None,
                });
            },
            Err(err) => {
                return Err(StorageError::Io {
                    source: err,
                    context: Some(format!("Read failed: {}", resolved.display()).into()),
                });
            },
        };

        self.compression.decompress(data)
    }

    pub(crate) async fn write_internal(
        &self,
        namespace: &str,
        path: impl AsRef<Path>,
        data: &[u8],
    ) -> Result<(), StorageError> {
        let resolved = self.resolve_internal(namespace, path)?;

        if let Some(parent) = resolved.parent() {
            fs::create_dir_all(parent)
                .await
                .context(format!("Failed to create shards for {}", resolved.display()))?;
        }

        let temp = unique_tmp_path(&resolved, &self.tmp_counter);
        let payload = self.compression.compress(data);

        {
            let mut file = fs::OpenOptions::new()
                .create_new(true)
                .write(true)
                .open(&temp)
                .await
                .context(format!("Temp creation failed: {}", temp.display()))?;
            file.write_all(&payload).await.context("Write failed")?;
            file.sync_all().await.context("Hardware sync failed")?;
        }

        if let Err(err) = fs::rename(&temp, &resolved).await {
            // Some platforms refuse to rename over an existing file.
            if err.kind() != ErrorKind::AlreadyExists {
                let _ = fs::remove_file(&temp).await;
                return Err(StorageError::Io {
                    source: err,
                    context: Some(format!("Atomic swap failed: {}", resolved.display()).into()),
                });
            }
            fs::remove_file(&resolved)
                .await
                .context(format!("Failed to replace existing file: {}", resolved.display()))?;
            fs::rename(&temp, &resolved)
                .await
                .context(format!("Atomic swap failed: {}", resolved.display()))?;
        }

        if let Some(parent) = resolved.parent() {
            sync_dir(parent).await;
        }

        debug!(path = %resolved.display(), bytes = data.len(), "Value stored atomically");
        Ok(())
    }

    /// Returns `Ok(false)` when there was nothing to delete.
    pub(crate) async fn delete_internal(
        &self,
        namespace: &str,
        path: impl AsRef<Path>,
    ) -> Result<bool, StorageError> {
        let resolved = self.resolve_internal(namespace, path)?;
        match fs::remove_file(&resolved).await {
            Ok(()) => {
                debug!(path = %resolved.display(), "Value deleted");
                Ok(true)
            },
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(StorageError::Io {
                source: err,
                context: Some(format!("Failed to delete: {}", resolved.display()).into()),
            }),
        }
    }

    pub(crate) async fn list_internal(
        &self,
        namespace: &str,
        prefix: &str,
    ) -> Result<Vec<String>, StorageError> {
        let base = self.root.join(namespace);
        let prefix = prefix.to_owned();

        tokio::task::spawn_blocking(move || listing::logical_keys(&base, &prefix))
            .await
            .context("Listing task panicked")
    }
}

async fn sync_dir(path: &Path) {
    match fs::File::open(path).await {
        Ok(dir) => {
            if let Err(err) = dir.sync_all().await {
                warn!(path = %path.display(), error = %err, "Directory sync failed");
            }
        },
        Err(err) => warn!(path = %path.display(), error = %err, "Directory open failed"),
    }
}

fn unique_tmp_path(target: &Path, counter: &AtomicU64) -> PathBuf {
    let counter = counter.fetch_add(1, Ordering::Relaxed);
    let file_name = target.file_name().and_then(|s| s.to_str()).unwrap_or("value");
    target.with_file_name(format!("{file_name}{TMP_MARKER}{counter}"))
}
