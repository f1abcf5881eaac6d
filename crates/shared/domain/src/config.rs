use serde::Deserialize;
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::Arc;

/// Top-level workbench configuration.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CasefileConfigInner {
    pub storage: StorageConfig,
    pub archive: ArchiveConfig,
    pub inflate: InflateConfig,
    pub registry: RegistryConfig,
    pub logging: LoggingConfig,
}

/// Thin Arc-wrapped config for inexpensive cloning into subsystems.
#[derive(Default, Debug, Clone, Deserialize)]
pub struct CasefileConfig {
    #[serde(flatten, default)]
    inner: Arc<CasefileConfigInner>,
}

impl Deref for CasefileConfig {
    type Target = CasefileConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for CasefileConfig {
    fn deref_mut(&mut self) -> &mut CasefileConfigInner {
        Arc::make_mut(&mut self.inner)
    }
}

/// Where domain caches live on disk.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub compression: CompressionKind,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionKind {
    #[default]
    None,
    Lz4,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Continue when the declared central-directory count disagrees with the parsed one.
    pub lenient_index: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InflateConfig {
    /// Preference order; strategies compiled out of the build are skipped.
    pub strategies: Vec<InflateStrategy>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InflateStrategy {
    Native,
    Software,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub activate_on_import: bool,
    /// JSON object of default-domain type definitions.
    pub default_types: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub directory: Option<PathBuf>,
    pub json: bool,
}

// --- Default ---

impl Default for StorageConfig {
    fn default() -> Self {
        Self { data_dir: PathBuf::from("./casefile-data"), compression: CompressionKind::None }
    }
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self { lenient_index: true }
    }
}

impl Default for InflateConfig {
    fn default() -> Self {
        Self { strategies: vec![InflateStrategy::Native, InflateStrategy::Software] }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self { activate_on_import: true, default_types: None }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_owned(), directory: None, json: false }
    }
}
