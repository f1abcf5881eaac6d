//! One error enum per file: the error macro emits a module-level `format_context` helper.

mod archive;
mod decompression;
mod import;

pub use archive::{ArchiveError, ArchiveErrorExt};
pub use decompression::{DecompressionError, DecompressionErrorExt};
pub use import::{ImportError, ImportErrorExt};
