use crate::error::{ArchiveError, DecompressionError};
use std::borrow::Cow;

/// The single error surfaced by a package import.
#[casefile_derive::casefile_error]
pub enum ImportError {
    #[error("Archive error{}: {source}", format_context(.context))]
    Archive { source: ArchiveError, context: Option<Cow<'static, str>> },

    #[error("Decompression error{}: {source}", format_context(.context))]
    Decompression { source: DecompressionError, context: Option<Cow<'static, str>> },

    /// Nothing usable survived; `warnings` explains what was skipped.
    #[error(
        "Package '{folder}' contains no usable type definitions{} ({} warnings)",
        format_context(.context),
        .warnings.len()
    )]
    EmptyPackage { folder: String, warnings: Vec<String>, context: Option<Cow<'static, str>> },

    #[error("Folder '{folder}' does not yield a valid domain key{}", format_context(.context))]
    InvalidDomainKey { folder: String, context: Option<Cow<'static, str>> },

    #[error("Domain '{key}' already exists{}", format_context(.context))]
    DomainAlreadyExists { key: String, context: Option<Cow<'static, str>> },

    #[error("Internal import error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl ImportError {
    /// Warnings collected before the import failed, if any.
    #[must_use]
    pub fn warnings(&self) -> &[String] {
        match self {
            Self::EmptyPackage { warnings, .. } => warnings,
            _ => &[],
        }
    }
}
