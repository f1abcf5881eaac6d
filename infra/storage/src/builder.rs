use crate::engine::{Compression, Storage, StorageInner};
use crate::error::{StorageError, StorageErrorExt};
use private::Sealed;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use tokio::fs;
use tracing::info;

#[derive(Debug, Clone, Copy)]
struct StorageConfig {
    compression: Compression,
    create: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { compression: Compression::None, create: true }
    }
}

#[derive(Debug, Default)]
pub struct NoRoot;
#[derive(Debug)]
pub struct WithRoot(PathBuf);

mod private {
    pub(super) trait Sealed {}
}
impl Sealed for NoRoot {}
impl Sealed for WithRoot {}

#[allow(private_bounds)]
#[derive(Debug, Default)]
pub struct StorageBuilder<S: Sealed = NoRoot> {
    state: S,
    config: StorageConfig,
}

#[allow(private_bounds)]
impl<S: Sealed> StorageBuilder<S> {
    #[must_use = "Sets compression for the storage engine"]
    pub const fn compression(mut self, compression: Compression) -> Self {
        self.config.compression = compression;
        self
    }

    #[must_use = "Sets whether the root directory should be created if it does not exist"]
    pub const fn create(mut self, enable: bool) -> Self {
        self.config.create = enable;
        self
    }
}

impl StorageBuilder<NoRoot> {
    #[must_use = "Creates a new storage builder with default configuration"]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "Sets the root directory path for the storage engine"]
    pub fn root(self, path: impl Into<PathBuf>) -> StorageBuilder<WithRoot> {
        StorageBuilder { state: WithRoot(path.into()), config: self.config }
    }
}

impl StorageBuilder<WithRoot> {
    /// Creates (optionally) and canonicalizes the root, purges stale temp files and
    /// returns the [`Storage`] handle.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the root is missing and `create` is false, or if it
    /// cannot be created or resolved.
    pub async fn connect(self) -> Result<Storage, StorageError> {
        let root = &self.state.0;

        if self.config.create {
            fs::create_dir_all(root)
                .await
                .context(format!("Failed to bootstrap storage root: {}", root.display()))?;
        }

        let canonical = fs::canonicalize(root)
            .await
            .context(format!("Failed to resolve storage root: {}", root.display()))?;
        info!(path = %canonical.display(), compression = ?self.config.compression, "Storage connected");

        let storage = Storage {
            inner: Arc::new(StorageInner {
                root: canonical,
                compression: self.config.compression,
                tmp_counter: AtomicU64::new(1),
            }),
        };

        storage.purge_tmp().await;

        Ok(storage)
    }
}
