use std::borrow::Cow;

/// A specialized [`StorageError`] enum of this crate.
#[casefile_derive::casefile_error]
pub enum StorageError {
    #[error("File not found{}: {message}", format_context(.context))]
    FileNotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Path traversal security violation{}: {message}", format_context(.context))]
    PathTraversalAttempt { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Storage I/O failure{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },

    #[error("Decompression failure{}: {source}", format_context(.context))]
    Decompress { source: lz4_flex::block::DecompressError, context: Option<Cow<'static, str>> },

    #[error("Background task failure{}: {source}", format_context(.context))]
    Task { source: tokio::task::JoinError, context: Option<Cow<'static, str>> },
}
