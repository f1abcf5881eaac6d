//! Raw deflate (RFC 1951) decompression behind a strategy chosen once at construction.

#[cfg(feature = "native-inflate")]
mod native;
#[cfg(feature = "software-inflate")]
mod software;

#[cfg(feature = "native-inflate")]
pub use native::NativeInflater;
#[cfg(feature = "software-inflate")]
pub use software::SoftwareInflater;

use crate::error::DecompressionError;
use casefile_domain::config::InflateStrategy;
use std::fmt;
use tracing::{debug, warn};

/// Upper bound on the up-front allocation taken from a declared size.
const MAX_PREALLOC: usize = 16 * 1024 * 1024;

/// One raw deflate implementation.
pub trait Inflater: fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// Decompresses a complete raw deflate stream. `size_hint` is the expected output length.
    ///
    /// # Errors
    /// Returns [`DecompressionError`] if the stream is malformed or truncated.
    fn inflate(&self, compressed: &[u8], size_hint: usize) -> Result<Vec<u8>, DecompressionError>;
}

/// Holds the first available strategy from a preference list.
#[derive(Debug)]
pub struct InflateDispatcher {
    inflater: Option<Box<dyn Inflater>>,
}

impl Default for InflateDispatcher {
    fn default() -> Self {
        Self::new(&[InflateStrategy::Native, InflateStrategy::Software])
    }
}

impl InflateDispatcher {
    /// Picks the first strategy in `preferences` that this build provides.
    #[must_use]
    pub fn new(preferences: &[InflateStrategy]) -> Self {
        let inflater = preferences.iter().copied().find_map(build);
        match &inflater {
            Some(inflater) => debug!(strategy = inflater.name(), "Inflate strategy selected"),
            None => warn!(?preferences, "No inflate strategy available, deflate entries will be skipped"),
        }
        Self { inflater }
    }

    /// A dispatcher around a caller-provided implementation.
    #[must_use]
    pub fn with_inflater(inflater: Box<dyn Inflater>) -> Self {
        Self { inflater: Some(inflater) }
    }

    #[must_use]
    pub fn strategy(&self) -> Option<&'static str> {
        self.inflater.as_ref().map(|inflater| inflater.name())
    }

    /// # Errors
    /// - [`DecompressionError::DecompressionUnsupported`] when no strategy was selected.
    /// - Whatever the selected strategy reports for a bad stream; no other strategy is tried.
    pub fn inflate_raw(
        &self,
        compressed: &[u8],
        size_hint: usize,
    ) -> Result<Vec<u8>, DecompressionError> {
        let Some(inflater) = &self.inflater else {
            return Err(DecompressionError::DecompressionUnsupported { context: None });
        };
        inflater.inflate(compressed, size_hint.min(MAX_PREALLOC))
    }
}

fn build(strategy: InflateStrategy) -> Option<Box<dyn Inflater>> {
    match strategy {
        #[cfg(feature = "native-inflate")]
        InflateStrategy::Native => Some(Box::new(NativeInflater)),
        #[cfg(feature = "software-inflate")]
        InflateStrategy::Software => Some(Box::new(SoftwareInflater)),
        #[allow(unreachable_patterns)]
        _ => None,
    }
}
