use std::borrow::Cow;

#[casefile_derive::casefile_error]
pub enum DecompressionError {
    /// No inflate strategy is compiled in or enabled.
    #[error("No raw deflate decoder available{}", format_context(.context))]
    DecompressionUnsupported { context: Option<Cow<'static, str>> },

    #[error("Corrupt deflate stream{}: {message}", format_context(.context))]
    Corrupt { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Inflate I/O error{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },
}

impl DecompressionError {
    pub(crate) fn corrupt(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Corrupt { message: message.into(), context: None }
    }
}
