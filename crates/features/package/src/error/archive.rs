use std::borrow::Cow;

/// Failures while reading the archive container.
///
/// `MissingDirectory` and an unsupported archive layout are fatal for `open`; the
/// remaining variants are reported per entry so the caller can skip and continue.
#[casefile_derive::casefile_error]
#[derive(Clone, PartialEq, Eq)]
pub enum ArchiveError {
    #[error("End of central directory not found{}", format_context(.context))]
    MissingDirectory { context: Option<Cow<'static, str>> },

    #[error("Malformed central directory entry #{index}{}: {message}", format_context(.context))]
    MalformedEntry { index: usize, message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error(
        "Central directory declares {declared} entries but {parsed} were parsed{}",
        format_context(.context)
    )]
    IndexMismatch { declared: usize, parsed: usize, context: Option<Cow<'static, str>> },

    #[error("Corrupt entry '{path}'{}: {message}", format_context(.context))]
    CorruptEntry { path: String, message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Unsupported archive feature{}: {message}", format_context(.context))]
    UnsupportedFeature { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error(
        "Read of {wanted} bytes at offset {offset} exceeds buffer of {len} bytes{}",
        format_context(.context)
    )]
    OutOfBounds { offset: usize, wanted: usize, len: usize, context: Option<Cow<'static, str>> },

    #[error("Unsafe entry path '{path}'{}", format_context(.context))]
    UnsafePath { path: String, context: Option<Cow<'static, str>> },
}
