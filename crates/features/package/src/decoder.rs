//! Classifies archive entries into package metadata, type definitions and icons.

use crate::archive::{ArchiveEntry, ArchiveHandle, ArchiveReader, CompressionMethod};
use crate::error::{ArchiveError, DecompressionError, ImportError, ImportErrorExt};
use crate::inflate::InflateDispatcher;
use casefile_domain::config::CasefileConfig;
use casefile_domain::naming;
use casefile_domain::package::{DecodedPackage, IconAsset, PackageMeta};
use casefile_domain::types::{TypeDefinition, TypeMap};
use std::borrow::Cow;
use tracing::{debug, info, warn};

/// File at the package root holding `name` and `description`.
pub const META_FILE: &str = "meta.json";

const IGNORED_FOLDER: &str = "__macosx";

/// Decodes package archives. Stateless between calls; one instance can serve many imports.
#[derive(Debug, Default)]
pub struct PackageDecoder {
    reader: ArchiveReader,
    inflater: InflateDispatcher,
    fallback_name: Option<String>,
}

impl PackageDecoder {
    #[must_use]
    pub const fn new(reader: ArchiveReader, inflater: InflateDispatcher) -> Self {
        Self { reader, inflater, fallback_name: None }
    }

    #[must_use]
    pub fn from_config(config: &CasefileConfig) -> Self {
        Self::new(
            ArchiveReader::new(config.archive.lenient_index),
            InflateDispatcher::new(&config.inflate.strategies),
        )
    }

    /// Folder name used when the archive has no top-level folder (e.g. the archive file stem).
    #[must_use]
    pub fn with_fallback_name(mut self, name: impl Into<String>) -> Self {
        self.fallback_name = Some(name.into());
        self
    }

    #[must_use]
    pub const fn inflater(&self) -> &InflateDispatcher {
        &self.inflater
    }

    /// # Errors
    /// - [`ImportError::Archive`] if the archive cannot be opened.
    /// - [`ImportError::Decompression`] if a type-definition document needs an unavailable inflater.
    /// - [`ImportError::InvalidDomainKey`] if the folder name yields an empty key.
    /// - [`ImportError::EmptyPackage`] if no type definition survives.
    pub fn decode(&self, archive: &[u8]) -> Result<DecodedPackage, ImportError> {
        self.decode_inner(archive, self.fallback_name.as_deref())
    }

    /// Like [`Self::decode`] with a per-call fallback folder name.
    ///
    /// # Errors
    /// See [`Self::decode`].
    pub fn decode_with_fallback(
        &self,
        archive: &[u8],
        fallback_name: &str,
    ) -> Result<DecodedPackage, ImportError> {
        self.decode_inner(archive, Some(fallback_name))
    }

    fn decode_inner(
        &self,
        archive: &[u8],
        fallback_name: Option<&str>,
    ) -> Result<DecodedPackage, ImportError> {
        let handle = self.reader.open(archive).context("opening package archive")?;
        let mut warnings = Vec::new();
        if let Some(mismatch) = handle.index_mismatch() {
            warnings.push(mismatch.to_string());
        }

        let entries = usable_entries(&handle, &mut warnings);
        let layout = Layout::infer(&entries, fallback_name);
        let folder = layout.folder().unwrap_or_default().to_owned();

        let domain_key = naming::domain_key(&folder);
        if layout.folder().is_some() && domain_key.is_empty() {
            return Err(ImportError::InvalidDomainKey { folder, context: None });
        }

        let mut meta = PackageMeta::default();
        let mut type_definitions = TypeMap::new();
        let mut icon_assets = Vec::new();

        for entry in entries {
            let Some(relative) = layout.relative(&entry.path) else {
                warn!(path = %entry.path, folder = %folder, "Entry outside the package folder skipped");
                warnings.push(format!("'{}' is outside package folder '{folder}'", entry.path));
                continue;
            };
            if relative.is_empty() || entry.is_dir() {
                continue;
            }

            match EntryKind::classify(relative) {
                EntryKind::Meta => match self.payload(&handle, entry, &mut warnings) {
                    Ok(bytes) => match serde_json::from_slice::<PackageMeta>(&bytes) {
                        Ok(parsed) => meta = parsed,
                        Err(err) => warnings.push(format!("{META_FILE}: {err}")),
                    },
                    Err(err) => warnings.push(format!("{META_FILE}: {err}")),
                },
                EntryKind::TypeDefinition(name) => {
                    let bytes = match self.payload(&handle, entry, &mut warnings) {
                        Ok(bytes) => bytes,
                        Err(err @ ImportError::Decompression {
                            source: DecompressionError::DecompressionUnsupported { .. },
                            ..
                        }) => return Err(err).context(format!("type definition '{}'", entry.path)),
                        Err(err) => {
                            warnings.push(format!("{}: {err}", entry.path));
                            continue;
                        }
                    };
                    match parse_definition(&bytes) {
                        Ok(definition) => {
                            debug!(path = %entry.path, name, "Type definition decoded");
                            if type_definitions.insert(name.to_owned(), definition).is_some() {
                                warnings.push(format!(
                                    "duplicate type '{name}' from '{}' replaces an earlier definition",
                                    entry.path
                                ));
                            }
                        }
                        Err(reason) => warnings.push(format!("{}: {reason}", entry.path)),
                    }
                }
                EntryKind::Icon(mime_type) => match self.payload(&handle, entry, &mut warnings) {
                    Ok(bytes) => icon_assets.push(IconAsset {
                        relative_path: relative.to_owned(),
                        bytes,
                        mime_type,
                    }),
                    Err(err) => warnings.push(format!("{}: {err}", entry.path)),
                },
                EntryKind::Other => debug!(path = %entry.path, "Ignoring non-package file"),
            }
        }

        if type_definitions.is_empty() {
            warn!(folder = %folder, warnings = warnings.len(), "Package has no usable type definitions");
            return Err(ImportError::EmptyPackage { folder, warnings, context: None });
        }

        let display_name = meta
            .name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| naming::display_name(&folder));
        info!(
            domain = %domain_key,
            types = type_definitions.len(),
            icons = icon_assets.len(),
            warnings = warnings.len(),
            "Package decoded"
        );

        Ok(DecodedPackage {
            folder_name: folder,
            domain_key,
            display_name,
            description: meta.description.unwrap_or_default(),
            type_definitions,
            icon_assets,
            warnings,
        })
    }

    /// Decompressed payload of one entry.
    fn payload(
        &self,
        handle: &ArchiveHandle<'_>,
        entry: &ArchiveEntry,
        warnings: &mut Vec<String>,
    ) -> Result<Vec<u8>, ImportError> {
        let raw = handle.read_entry(entry)?;
        let bytes = match entry.method {
            CompressionMethod::Stored => raw.to_vec(),
            CompressionMethod::Deflate => {
                self.inflater.inflate_raw(raw, entry.uncompressed_size as usize)?
            }
        };
        if bytes.len() != entry.uncompressed_size as usize {
            warn!(
                path = %entry.path,
                declared = entry.uncompressed_size,
                actual = bytes.len(),
                "Uncompressed size mismatch"
            );
            warnings.push(format!(
                "{}: declared {} bytes, got {}",
                entry.path,
                entry.uncompressed_size,
                bytes.len()
            ));
        }
        Ok(bytes)
    }
}

/// Entries worth classifying; per-entry archive failures become warnings.
fn usable_entries<'h>(handle: &'h ArchiveHandle<'_>, warnings: &mut Vec<String>) -> Vec<&'h ArchiveEntry> {
    handle
        .entries()
        .iter()
        .filter_map(|entry| match entry {
            Ok(entry) if is_ignored(&entry.path) => None,
            Ok(entry) => Some(entry),
            Err(ArchiveError::UnsafePath { path, .. }) => {
                warn!(path = %path, "Path traversal rejected");
                warnings.push(format!("path traversal rejected: '{path}'"));
                None
            }
            Err(err) => {
                warn!(error = %err, "Archive entry skipped");
                warnings.push(err.to_string());
                None
            }
        })
        .collect()
}

fn is_ignored(path: &str) -> bool {
    path.split('/').any(|segment| segment.eq_ignore_ascii_case(IGNORED_FOLDER))
}

/// Where entries live relative to the package root.
enum Layout<'a> {
    /// Everything under one top-level folder.
    Folder(&'a str),
    /// Flat archive; the fallback name stands in for the folder.
    Flat(&'a str),
    /// No folder could be inferred.
    Unknown,
}

impl<'a> Layout<'a> {
    fn infer(entries: &[&'a ArchiveEntry], fallback_name: Option<&'a str>) -> Self {
        let folder = entries.iter().find_map(|entry| {
            entry.path.split_once('/').map(|(top, _)| top).filter(|top| !top.is_empty())
        });
        match (folder, fallback_name) {
            (Some(folder), _) => Self::Folder(folder),
            (None, Some(name)) => Self::Flat(name),
            (None, None) => Self::Unknown,
        }
    }

    const fn folder(&self) -> Option<&'a str> {
        match self {
            Self::Folder(name) | Self::Flat(name) => Some(name),
            Self::Unknown => None,
        }
    }

    fn relative<'p>(&self, path: &'p str) -> Option<&'p str> {
        match self {
            Self::Folder(folder) => path
                .strip_prefix(folder)
                .and_then(|rest| if rest.is_empty() { Some(rest) } else { rest.strip_prefix('/') }),
            Self::Flat(_) => Some(path),
            Self::Unknown => None,
        }
    }
}

enum EntryKind<'a> {
    Meta,
    TypeDefinition(&'a str),
    Icon(&'static str),
    Other,
}

impl<'a> EntryKind<'a> {
    fn classify(relative: &'a str) -> Self {
        if relative == META_FILE {
            return Self::Meta;
        }
        let file_name = relative.rsplit('/').next().unwrap_or(relative);
        let Some((stem, extension)) = file_name.rsplit_once('.') else {
            return Self::Other;
        };
        let extension = extension.to_ascii_lowercase();
        if extension == "json" {
            return if stem.is_empty() { Self::Other } else { Self::TypeDefinition(stem) };
        }
        icon_mime_type(&extension).map_or(Self::Other, Self::Icon)
    }
}

fn icon_mime_type(extension: &str) -> Option<&'static str> {
    Some(match extension {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "svg" => "image/svg+xml",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        _ => return None,
    })
}

fn parse_definition(bytes: &[u8]) -> Result<TypeDefinition, Cow<'static, str>> {
    let value: serde_json::Value =
        serde_json::from_slice(bytes).map_err(|err| Cow::Owned(format!("invalid JSON: {err}")))?;
    TypeDefinition::from_value(value).ok_or(Cow::Borrowed("type definition is not a JSON object"))
}
