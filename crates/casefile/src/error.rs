use casefile_package::ImportError;
use casefile_registry::RegistryError;
use casefile_storage::StorageError;
use std::borrow::Cow;

#[casefile_derive::casefile_error]
pub enum WorkbenchError {
    #[error("Storage error{}: {source}", format_context(.context))]
    Storage { source: StorageError, context: Option<Cow<'static, str>> },

    #[error("Registry error{}: {source}", format_context(.context))]
    Registry { source: RegistryError, context: Option<Cow<'static, str>> },

    #[error("Import error{}: {source}", format_context(.context))]
    Import { source: ImportError, context: Option<Cow<'static, str>> },

    #[error("I/O error{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },

    #[error("JSON error{}: {source}", format_context(.context))]
    Serialization { source: serde_json::Error, context: Option<Cow<'static, str>> },

    #[error("Refusing path outside the manifest root{}: {path}", format_context(.context))]
    UnsafePath { path: String, context: Option<Cow<'static, str>> },

    #[error("Internal workbench error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
