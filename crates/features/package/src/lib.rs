//! # Package decoding
//!
//! Turns the raw bytes of a domain package (a ZIP archive with one top-level folder)
//! into a [`DecodedPackage`](casefile_domain::package::DecodedPackage):
//!
//! - [`cursor::ByteCursor`]: bounds-checked little-endian reads.
//! - [`archive::ArchiveReader`]: end-of-central-directory search, central-directory walk
//!   and local header validation. Only the stored/deflate subset is supported.
//! - [`inflate::InflateDispatcher`]: raw deflate through the first available strategy.
//! - [`decoder::PackageDecoder`]: classification into metadata, type definitions and icons.
//!
//! Everything here is synchronous and works on an in-memory buffer.
//!
//! ```rust,no_run
//! use casefile_package::PackageDecoder;
//!
//! let bytes = std::fs::read("acme.zip").unwrap();
//! let package = PackageDecoder::default().decode(&bytes).unwrap();
//! println!("{} types", package.type_definitions.len());
//! ```

pub mod archive;
pub mod cursor;
pub mod decoder;
pub mod error;
pub mod inflate;

pub use archive::{ArchiveEntry, ArchiveHandle, ArchiveReader, CompressionMethod, EntryFlags};
pub use cursor::ByteCursor;
pub use decoder::PackageDecoder;
pub use error::{
    ArchiveError, ArchiveErrorExt, DecompressionError, DecompressionErrorExt, ImportError,
    ImportErrorExt,
};
pub use inflate::{InflateDispatcher, Inflater};
