//! # Type registry
//!
//! Owns every known domain, merges the active ones into a single
//! [`ActiveConfiguration`](casefile_domain::registry::ActiveConfiguration) and keeps each
//! domain's decoded types in a [`DomainCache`] so restarts do not need the original packages.
//!
//! Merge policy, in order of precedence:
//! 1. The `default` domain always wins and is never checked for conflicts.
//! 2. Other active domains are merged in activation order; the first domain to claim a
//!    type name keeps it, later claims are recorded as conflicts and skipped.
//!
//! All mutations are serialized; readers only ever see a fully merged configuration.

pub mod cache;
pub mod error;
mod icons;
mod merge;
pub mod registry;
pub mod store;

pub use cache::DomainCache;
pub use error::{CacheError, CacheErrorExt, RegistryError, RegistryErrorExt};
pub use registry::TypeRegistry;
pub use store::{KeyValueStore, MemoryStore};
