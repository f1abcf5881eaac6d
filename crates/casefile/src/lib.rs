//! Facade crate for casefile.
//! Re-exports the domain, kernel and feature crates and composes them into a [`Workbench`].
//! Keep this crate thin: wiring and orchestration only, the algorithms live in the features.
//!
//! ```rust,no_run
//! use casefile::Workbench;
//! use casefile::domain::config::CasefileConfig;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let workbench = Workbench::open(CasefileConfig::default()).await?;
//! let outcome = workbench.import_package(&std::fs::read("acme.zip")?).await?;
//! println!("imported {} ({} warnings)", outcome.domain_key, outcome.warnings.len());
//! # Ok(())
//! # }
//! ```

mod error;
pub mod manifest;
mod workbench;

pub use casefile_domain as domain;
pub use casefile_kernel as kernel;
pub use casefile_package as package;
pub use casefile_registry as registry;
pub use casefile_storage as storage;

pub use error::{WorkbenchError, WorkbenchErrorExt};
pub use manifest::{DirectoryManifestSource, Manifest, ManifestDomain, ManifestSource};
pub use workbench::{CACHE_NAMESPACE, ImportOutcome, SyncReport, Workbench};

/// Build-time enabled features (by Cargo feature).
pub const ENABLED: &[&str] = &[
    #[cfg(feature = "native-inflate")]
    "native-inflate",
    #[cfg(feature = "software-inflate")]
    "software-inflate",
];

#[must_use]
pub fn is_enabled(name: &str) -> bool {
    ENABLED.contains(&name)
}
