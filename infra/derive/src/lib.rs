#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Procedural macros shared by the casefile workspace: the error-enum generator used by
//! every crate and the async entry point used by the command-line shell.
//!
//! See each macro's docstring for examples; they are `ignore`d to avoid compiling in this crate.

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, ItemFn, parse_macro_input};

/// Attribute macro to bootstrap a Tokio runtime around `async fn main`.
///
/// # Arguments
///
/// * `cli` - Current-thread scheduler for one-shot command-line invocations.
/// * `service` - Multi-threaded scheduler for long-running hosts.
/// * `default` - Same as `service` with auto-detected worker threads.
///
/// # Examples
///
/// ```rust,ignore
/// #[casefile_runtime::main(cli)]
/// async fn main() -> anyhow::Result<()> {
/// # Ok(())
/// }
/// ```
#[proc_macro_attribute]
pub fn main(args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);
    macros::runtime::expand_main(args.into(), input).into()
}

/// Turns an enum into a workspace error type.
///
/// # Generated Items
///
/// * `#[derive(Debug, thiserror::Error)]` unless already present.
/// * `<ErrorName>Ext` trait with `.context(...)` for `Result<T, ErrorName>` and, for every
///   variant holding a `source`, for `Result<T, SourceError>` as well.
/// * `From<SourceError>` for variants with a `source` field.
/// * `From<&'static str>` / `From<String>` when an `Internal { message, context }` variant exists.
/// * `kind(&self) -> &'static str` returning the variant name.
///
/// # Requirements
///
/// 1. Only enums are accepted, and every variant must use named fields.
/// 2. A variant with a source must also carry `context: Option<Cow<'static, str>>`.
///
/// # Example
///
/// ```rust,ignore
/// use casefile_derive::casefile_error;
/// use std::borrow::Cow;
///
/// #[casefile_error]
/// pub enum CacheError {
///     #[error("Storage failure{}: {source}", format_context(.context))]
///     Storage { source: casefile_storage::StorageError, context: Option<Cow<'static, str>> },
///
///     #[error("Internal fault{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
///
/// fn read(store: &Store) -> Result<Vec<u8>, CacheError> {
///     store.read("domains/acme/types").context("Reading cached types")
/// }
/// ```
#[proc_macro_attribute]
pub fn casefile_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand_derive(input).into()
}
