use casefile_storage::StorageError;
use std::borrow::Cow;

/// Never leaves [`DomainCache`](crate::DomainCache): reads degrade to a miss, writes to a warning.
#[casefile_derive::casefile_error]
pub enum CacheError {
    #[error("Cache storage error{}: {source}", format_context(.context))]
    Storage { source: StorageError, context: Option<Cow<'static, str>> },

    #[error("Cache serialization error{}: {source}", format_context(.context))]
    Serialization { source: serde_json::Error, context: Option<Cow<'static, str>> },
}
