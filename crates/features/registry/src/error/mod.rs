mod cache;
mod registry;

pub use cache::{CacheError, CacheErrorExt};
pub use registry::{RegistryError, RegistryErrorExt};
