//! Minimal ZIP writer for building test archives in memory.
#![allow(dead_code, unreachable_pub)]

use flate2::Compression;
use flate2::write::DeflateEncoder;
use std::io::Write;

pub struct Entry {
    pub name: String,
    pub method: u16,
    pub flags: u16,
    pub payload: Vec<u8>,
    pub uncompressed_size: u32,
}

#[derive(Default)]
pub struct ZipBuilder {
    entries: Vec<Entry>,
    comment: Vec<u8>,
    declared_override: Option<u16>,
    disk: u16,
}

impl ZipBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stored(mut self, name: &str, data: &[u8]) -> Self {
        self.entries.push(Entry {
            name: name.to_owned(),
            method: 0,
            flags: 0,
            payload: data.to_vec(),
            uncompressed_size: data.len() as u32,
        });
        self
    }

    pub fn deflated(mut self, name: &str, data: &[u8]) -> Self {
        self.entries.push(Entry {
            name: name.to_owned(),
            method: 8,
            flags: 0,
            payload: deflate(data),
            uncompressed_size: data.len() as u32,
        });
        self
    }

    pub fn raw(mut self, entry: Entry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn comment(mut self, comment: &[u8]) -> Self {
        self.comment = comment.to_vec();
        self
    }

    pub fn declared_entries(mut self, count: u16) -> Self {
        self.declared_override = Some(count);
        self
    }

    pub fn disk(mut self, disk: u16) -> Self {
        self.disk = disk;
        self
    }

    pub fn finish(self) -> Vec<u8> {
        let mut out = Vec::new();
        let mut central = Vec::new();

        for entry in &self.entries {
            let offset = out.len() as u32;
            let name = entry.name.as_bytes();

            out.extend_from_slice(&0x0403_4b50u32.to_le_bytes());
            out.extend_from_slice(&20u16.to_le_bytes());
            out.extend_from_slice(&entry.flags.to_le_bytes());
            out.extend_from_slice(&entry.method.to_le_bytes());
            out.extend_from_slice(&[0u8; 8]); // time, date, crc
            out.extend_from_slice(&(entry.payload.len() as u32).to_le_bytes());
            out.extend_from_slice(&entry.uncompressed_size.to_le_bytes());
            out.extend_from_slice(&(name.len() as u16).to_le_bytes());
            out.extend_from_slice(&0u16.to_le_bytes());
            out.extend_from_slice(name);
            out.extend_from_slice(&entry.payload);

            central.extend_from_slice(&0x0201_4b50u32.to_le_bytes());
            central.extend_from_slice(&20u16.to_le_bytes());
            central.extend_from_slice(&20u16.to_le_bytes());
            central.extend_from_slice(&entry.flags.to_le_bytes());
            central.extend_from_slice(&entry.method.to_le_bytes());
            central.extend_from_slice(&[0u8; 8]);
            central.extend_from_slice(&(entry.payload.len() as u32).to_le_bytes());
            central.extend_from_slice(&entry.uncompressed_size.to_le_bytes());
            central.extend_from_slice(&(name.len() as u16).to_le_bytes());
            central.extend_from_slice(&0u16.to_le_bytes()); // extra
            central.extend_from_slice(&0u16.to_le_bytes()); // comment
            central.extend_from_slice(&[0u8; 8]); // disk, attrs
            central.extend_from_slice(&offset.to_le_bytes());
            central.extend_from_slice(name);
        }

        let directory_offset = out.len() as u32;
        out.extend_from_slice(&central);

        let count = self.declared_override.unwrap_or(self.entries.len() as u16);
        out.extend_from_slice(&0x0605_4b50u32.to_le_bytes());
        out.extend_from_slice(&self.disk.to_le_bytes());
        out.extend_from_slice(&self.disk.to_le_bytes());
        out.extend_from_slice(&count.to_le_bytes());
        out.extend_from_slice(&count.to_le_bytes());
        out.extend_from_slice(&(central.len() as u32).to_le_bytes());
        out.extend_from_slice(&directory_offset.to_le_bytes());
        out.extend_from_slice(&(self.comment.len() as u16).to_le_bytes());
        out.extend_from_slice(&self.comment);
        out
    }
}

pub fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).expect("deflate write");
    encoder.finish().expect("deflate finish")
}

/// Smallest valid PNG-looking payload; the decoder only looks at the extension.
pub const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
