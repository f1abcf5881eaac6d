//! Sandboxed persistent byte storage for casefile.
//!
//! The domain cache persists decoded packages through this crate. Every key is a relative,
//! forward-slash path inside a sandbox root; the engine guarantees that nothing escapes that
//! root and that a reader never observes a half-written value.
//!
//! # Core Features
//!
//! - **Sandbox Security**: lexical `..` normalization plus canonical-path checks.
//! - **Atomic Writes**: unique temp file, `fsync`, then `rename` over the target.
//! - **Transparent Compression**: optional LZ4 block compression.
//! - **Namespaces & Sharding**: per-namespace directories with two-level filename sharding.
//! - **Prefix Listing**: [`NamespacedStorage::list`] reverses the sharding and returns the
//!   logical keys, so callers can scan everything stored under a prefix.
//! - **Self-Healing**: stale temp files from crashed writers are purged on connect.
//!
//! # Examples
//!
//! ```rust
//! use casefile_storage::{Compression, Storage, StorageError};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), StorageError> {
//!     # let tmp = tempfile::tempdir().unwrap();
//!     # let root = tmp.path().join("data");
//!     let storage = Storage::builder()
//!         .root(&root)
//!         .create(true)
//!         .compression(Compression::Lz4)
//!         .connect()
//!         .await?;
//!
//!     let cache = storage.namespace("cache")?;
//!     cache.write("domains/acme/types", br#"{"widget":{}}"#).await?;
//!
//!     assert_eq!(cache.read("domains/acme/types").await?, br#"{"widget":{}}"#);
//!     assert_eq!(cache.list("domains/").await?, vec!["domains/acme/types".to_owned()]);
//!     Ok(())
//! }
//! ```

mod builder;
mod engine;
mod error;
mod listing;
mod maintenance;
mod namespace;
mod security;

pub use builder::StorageBuilder;
pub use engine::{Compression, Storage};
pub use error::{StorageError, StorageErrorExt};
pub use namespace::NamespacedStorage;
