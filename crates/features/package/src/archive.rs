//! Read-only access to the stored/deflate subset of the ZIP container.

use crate::cursor::ByteCursor;
use crate::error::{ArchiveError, ArchiveErrorExt};
use bitflags::bitflags;
use std::borrow::Cow;
use tracing::{debug, warn};

pub const EOCD_SIGNATURE: u32 = 0x0605_4b50;
pub const CENTRAL_SIGNATURE: u32 = 0x0201_4b50;
pub const LOCAL_SIGNATURE: u32 = 0x0403_4b50;

/// Fixed size of the end-of-central-directory record (without comment).
pub const EOCD_LEN: usize = 22;
/// Longest possible trailing comment plus the record itself.
pub const EOCD_SEARCH_WINDOW: usize = EOCD_LEN + u16::MAX as usize;

const CENTRAL_HEADER_LEN: usize = 46;
const LOCAL_HEADER_LEN: usize = 30;

bitflags! {
    /// General purpose bit flags of a central-directory entry.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct EntryFlags: u16 {
        const ENCRYPTED = 1 << 0;
        const DATA_DESCRIPTOR = 1 << 3;
        const UTF8 = 1 << 11;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum CompressionMethod {
    Stored,
    Deflate,
}

impl CompressionMethod {
    #[must_use]
    pub const fn from_code(code: u16) -> Option<Self> {
        match code {
            0 => Some(Self::Stored),
            8 => Some(Self::Deflate),
            _ => None,
        }
    }
}

/// One central-directory record.
///
/// `path` is forward-slash separated with no leading slash and no `..` segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub path: String,
    pub method: CompressionMethod,
    pub flags: EntryFlags,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub local_header_offset: u32,
}

impl ArchiveEntry {
    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.path.is_empty() || self.path.ends_with('/')
    }
}

/// An opened archive: the buffer plus every central-directory record found in it.
#[derive(Debug)]
pub struct ArchiveHandle<'a> {
    buffer: &'a [u8],
    entries: Vec<Result<ArchiveEntry, ArchiveError>>,
    declared: usize,
    parsed: usize,
}

impl<'a> ArchiveHandle<'a> {
    /// Records in directory order. Unusable records are kept as per-entry errors.
    #[must_use]
    pub fn entries(&self) -> &[Result<ArchiveEntry, ArchiveError>] {
        &self.entries
    }

    #[must_use]
    pub const fn declared_count(&self) -> usize {
        self.declared
    }

    /// The tolerated count mismatch, if the directory disagreed with its own record.
    #[must_use]
    pub const fn index_mismatch(&self) -> Option<ArchiveError> {
        if self.declared == self.parsed {
            None
        } else {
            Some(ArchiveError::IndexMismatch {
                declared: self.declared,
                parsed: self.parsed,
                context: None,
            })
        }
    }

    /// Raw (possibly compressed) payload of `entry`.
    ///
    /// # Errors
    /// [`ArchiveError::CorruptEntry`] if the local header is missing or the payload runs
    /// past the end of the buffer.
    pub fn read_entry(&self, entry: &ArchiveEntry) -> Result<&'a [u8], ArchiveError> {
        let corrupt = |message: &'static str| ArchiveError::CorruptEntry {
            path: entry.path.clone(),
            message: Cow::Borrowed(message),
            context: None,
        };

        let mut cursor = ByteCursor::at(self.buffer, entry.local_header_offset as usize)
            .map_err(|_| corrupt("local header offset outside the archive"))?;
        if cursor.read_u32().ok() != Some(LOCAL_SIGNATURE) {
            return Err(corrupt("local file header signature mismatch"));
        }
        // version, flags, method, time, date, crc, sizes
        cursor.skip(22).map_err(|_| corrupt("truncated local file header"))?;
        let name_len = cursor.read_u16().map_err(|_| corrupt("truncated local file header"))?;
        let extra_len = cursor.read_u16().map_err(|_| corrupt("truncated local file header"))?;

        let data_start = entry.local_header_offset as usize
            + LOCAL_HEADER_LEN
            + usize::from(name_len)
            + usize::from(extra_len);
        ByteCursor::at(self.buffer, data_start)
            .and_then(|mut data| data.read_bytes(entry.compressed_size as usize))
            .map_err(|_| corrupt("payload exceeds archive bounds"))
    }
}

/// Parses archive containers from memory.
#[derive(Debug, Clone, Copy)]
pub struct ArchiveReader {
    lenient_index: bool,
}

impl Default for ArchiveReader {
    fn default() -> Self {
        Self { lenient_index: true }
    }
}

impl ArchiveReader {
    #[must_use]
    pub const fn new(lenient_index: bool) -> Self {
        Self { lenient_index }
    }

    /// Locates the central directory and enumerates it.
    ///
    /// # Errors
    /// - [`ArchiveError::MissingDirectory`] if no end record exists in the trailing window.
    /// - [`ArchiveError::UnsupportedFeature`] for multi-disk or ZIP64 archives.
    /// - [`ArchiveError::IndexMismatch`] when the reader is strict and the counts disagree.
    pub fn open<'a>(&self, buffer: &'a [u8]) -> Result<ArchiveHandle<'a>, ArchiveError> {
        let eocd_at = find_eocd(buffer).ok_or(ArchiveError::MissingDirectory { context: None })?;
        let eocd = EndRecord::parse(buffer, eocd_at).context("end of central directory")?;

        if eocd.disk != 0 || eocd.directory_disk != 0 || eocd.disk_entries != eocd.total_entries {
            return Err(ArchiveError::UnsupportedFeature {
                message: "multi-disk archives".into(),
                context: None,
            });
        }
        if eocd.total_entries == u16::MAX || eocd.offset == u32::MAX || eocd.size == u32::MAX {
            return Err(ArchiveError::UnsupportedFeature {
                message: "ZIP64 archives".into(),
                context: None,
            });
        }

        let directory = directory_slice(buffer, &eocd, eocd_at);
        let (entries, parsed) = walk_directory(directory);
        let declared = usize::from(eocd.total_entries);

        if parsed != declared {
            if !self.lenient_index {
                return Err(ArchiveError::IndexMismatch { declared, parsed, context: None });
            }
            warn!(declared, parsed, "Central directory count mismatch, continuing");
        }
        debug!(entries = entries.len(), declared, "Archive opened");

        Ok(ArchiveHandle { buffer, entries, declared, parsed })
    }
}

struct EndRecord {
    disk: u16,
    directory_disk: u16,
    disk_entries: u16,
    total_entries: u16,
    size: u32,
    offset: u32,
}

impl EndRecord {
    fn parse(buffer: &[u8], at: usize) -> Result<Self, ArchiveError> {
        let mut cursor = ByteCursor::at(buffer, at + 4)?;
        Ok(Self {
            disk: cursor.read_u16()?,
            directory_disk: cursor.read_u16()?,
            disk_entries: cursor.read_u16()?,
            total_entries: cursor.read_u16()?,
            size: cursor.read_u32()?,
            offset: cursor.read_u32()?,
        })
    }
}

/// Backward scan for the end record signature, bounded to the trailing window.
///
/// A candidate whose comment length reaches exactly the end of the buffer wins, so signature
/// bytes inside a comment cannot shadow the real record. Without such a candidate the last
/// signature seen is used, which tolerates trailing bytes after the archive.
fn find_eocd(buffer: &[u8]) -> Option<usize> {
    let last = buffer.len().checked_sub(EOCD_LEN)?;
    let first = buffer.len().saturating_sub(EOCD_SEARCH_WINDOW);
    let mut candidates = (first..=last).rev().filter(|&at| {
        ByteCursor::at(buffer, at).and_then(|c| c.peek_u32()).ok() == Some(EOCD_SIGNATURE)
    });
    let fallback = candidates.next()?;
    std::iter::once(fallback)
        .chain(candidates)
        .find(|&at| comment_ends_buffer(buffer, at))
        .or(Some(fallback))
}

fn comment_ends_buffer(buffer: &[u8], at: usize) -> bool {
    ByteCursor::at(buffer, at + EOCD_LEN - 2)
        .and_then(|mut c| c.read_u16())
        .is_ok_and(|len| at + EOCD_LEN + usize::from(len) == buffer.len())
}

/// The directory bytes, clamped to what precedes the end record.
fn directory_slice<'a>(buffer: &'a [u8], eocd: &EndRecord, eocd_at: usize) -> &'a [u8] {
    let start = (eocd.offset as usize).min(eocd_at);
    let end = start.saturating_add(eocd.size as usize).min(eocd_at);
    &buffer[start..end]
}

/// Returns every record plus the number of structurally complete ones.
fn walk_directory(directory: &[u8]) -> (Vec<Result<ArchiveEntry, ArchiveError>>, usize) {
    let mut cursor = ByteCursor::new(directory);
    let mut entries = Vec::new();
    let mut parsed = 0;

    while cursor.remaining() > 0 {
        let index = entries.len();
        if cursor.peek_u32().ok() != Some(CENTRAL_SIGNATURE) {
            entries.push(Err(ArchiveError::MalformedEntry {
                index,
                message: "central directory signature mismatch".into(),
                context: None,
            }));
            break;
        }
        match RawCentralEntry::parse(&mut cursor) {
            Ok(raw) => {
                parsed += 1;
                entries.push(raw.validate());
            }
            Err(err) => {
                entries.push(Err(ArchiveError::MalformedEntry {
                    index,
                    message: err.to_string().into(),
                    context: None,
                }));
                break;
            }
        }
    }

    (entries, parsed)
}

struct RawCentralEntry {
    name: String,
    method: u16,
    flags: EntryFlags,
    compressed_size: u32,
    uncompressed_size: u32,
    local_header_offset: u32,
}

impl RawCentralEntry {
    fn parse(cursor: &mut ByteCursor<'_>) -> Result<Self, ArchiveError> {
        let header = cursor.read_bytes(CENTRAL_HEADER_LEN)?;
        let mut fields = ByteCursor::at(header, 8)?;
        let flags = EntryFlags::from_bits_retain(fields.read_u16()?);
        let method = fields.read_u16()?;
        fields.skip(8)?; // time, date, crc
        let compressed_size = fields.read_u32()?;
        let uncompressed_size = fields.read_u32()?;
        let name_len = fields.read_u16()?;
        let extra_len = fields.read_u16()?;
        let comment_len = fields.read_u16()?;
        fields.skip(8)?; // disk start, internal and external attributes
        let local_header_offset = fields.read_u32()?;

        let name = String::from_utf8_lossy(cursor.read_bytes(usize::from(name_len))?).into_owned();
        cursor.skip(usize::from(extra_len) + usize::from(comment_len))?;

        Ok(Self { name, method, flags, compressed_size, uncompressed_size, local_header_offset })
    }

    fn validate(self) -> Result<ArchiveEntry, ArchiveError> {
        let path = normalize_path(&self.name)?;
        if self.flags.contains(EntryFlags::ENCRYPTED) {
            return Err(ArchiveError::UnsupportedFeature {
                message: format!("encrypted entry '{path}'").into(),
                context: None,
            });
        }
        let method = CompressionMethod::from_code(self.method).ok_or_else(|| {
            ArchiveError::UnsupportedFeature {
                message: format!("compression method {} for '{path}'", self.method).into(),
                context: None,
            }
        })?;

        Ok(ArchiveEntry {
            path,
            method,
            flags: self.flags,
            compressed_size: self.compressed_size,
            uncompressed_size: self.uncompressed_size,
            local_header_offset: self.local_header_offset,
        })
    }
}

/// Forward slashes, no leading slash, no `..` segment.
fn normalize_path(raw: &str) -> Result<String, ArchiveError> {
    let path = raw.replace('\\', "/");
    let path = path.trim_start_matches('/');
    if path.split('/').any(|segment| segment == "..") {
        return Err(ArchiveError::UnsafePath { path: raw.to_owned(), context: None });
    }
    Ok(path.to_owned())
}
