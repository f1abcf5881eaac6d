use std::borrow::Cow;

#[casefile_derive::casefile_error]
pub enum RegistryError {
    #[error("Domain '{key}' already exists{}", format_context(.context))]
    DomainAlreadyExists { key: String, context: Option<Cow<'static, str>> },

    #[error("Unknown domain '{key}'{}", format_context(.context))]
    UnknownDomain { key: String, context: Option<Cow<'static, str>> },

    #[error("The default domain cannot be deactivated or replaced{}", format_context(.context))]
    DefaultDomainLocked { context: Option<Cow<'static, str>> },

    #[error("Domain '{key}' has no loaded types{}", format_context(.context))]
    DomainNotLoaded { key: String, context: Option<Cow<'static, str>> },

    /// A merge produced an unpublishable configuration; the previous one stays active.
    #[error("Registry invariant violated{}: {message}", format_context(.context))]
    Inconsistent { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
