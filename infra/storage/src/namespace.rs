use crate::engine::Storage;
use crate::error::StorageError;
use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamespaceName(pub String);

impl TryFrom<String> for NamespaceName {
    type Error = StorageError;

    fn try_from(value: String) -> Result<Self, StorageError> {
        Self::try_from(value.as_str())
    }
}

impl TryFrom<&str> for NamespaceName {
    type Error = StorageError;

    fn try_from(value: &str) -> Result<Self, StorageError> {
        let name = value.to_lowercase();

        if name.is_empty() {
            return Err(StorageError::PathTraversalAttempt {
                message: "EMPTY".into(),
                context: Some("Namespace cannot be empty".into()),
            });
        }

        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(StorageError::PathTraversalAttempt {
                message: name.into(),
                context: Some("Namespace contains illegal characters".into()),
            });
        }

        Ok(Self(name))
    }
}

impl fmt::Display for NamespaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A scoped view of the storage engine.
///
/// Keys are relative, `/`-separated paths. They are stored below `<root>/<namespace>/`
/// with the final filename sharded; [`NamespacedStorage::list`] hides the sharding again.
/// Cloning is cheap.
#[derive(Debug, Clone)]
pub struct NamespacedStorage {
    storage: Storage,
    namespace: Arc<Cow<'static, str>>,
}

impl NamespacedStorage {
    pub(crate) fn new(storage: Storage, namespace: impl Into<Cow<'static, str>>) -> Self {
        Self { storage, namespace: Arc::new(namespace.into()) }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.namespace
    }

    /// Resolves a key to its sharded physical path inside the sandbox.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::PathTraversalAttempt`] if the key tries to escape the sandbox
    /// and [`StorageError::FileNotFound`] if it has no filename component.
    pub fn resolve(&self, key: impl AsRef<Path>) -> Result<PathBuf, StorageError> {
        self.storage.resolve_internal(&self.namespace, key)
    }

    /// Reads a value, decompressing it if the engine was built with compression.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::FileNotFound`] if the key does not exist and
    /// [`StorageError::Decompress`] if the stored bytes are not valid for the configured codec.
    pub async fn read(&self, key: impl AsRef<Path>) -> Result<Vec<u8>, StorageError> {
        self.storage.read_internal(&self.namespace, key).await
    }

    /// Writes a value atomically (temp file, `fsync`, rename).
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::PathTraversalAttempt`] if the key escapes the sandbox and
    /// [`StorageError::Io`] on disk failures.
    pub async fn write(&self, key: impl AsRef<Path>, data: &[u8]) -> Result<(), StorageError> {
        self.storage.write_internal(&self.namespace, key, data).await
    }

    /// Deletes a value. Returns `Ok(false)` if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the file exists but cannot be removed.
    pub async fn delete(&self, key: impl AsRef<Path>) -> Result<bool, StorageError> {
        self.storage.delete_internal(&self.namespace, key).await
    }

    /// Checks whether a key exists.
    ///
    /// # Errors
    ///
    /// Fails only if key resolution fails.
    pub fn exists(&self, key: impl AsRef<Path>) -> Result<bool, StorageError> {
        Ok(self.resolve(key)?.is_file())
    }

    /// Lists every stored key that starts with `prefix`, in lexicographic order.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Task`] if the blocking directory walk panicked.
    pub async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        self.storage.list_internal(&self.namespace, prefix).await
    }
}
