//! Minimal ZIP writer for building test archives.

#![allow(dead_code)]

use std::io::Write;
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};
use flate2::Compression;
use flate2::write::DeflateEncoder;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Method {
    Stored,
    Deflate,
}

struct Item {
    name: String,
    content: Vec<u8>,
    method: Method,
    bad_crc: bool,
    /// Sizes recorded in a ZIP64 extra field instead of the real ones.
    zip64_sizes: Option<(u64, u64)>,
}

#[derive(Default)]
pub struct ZipBuilder {
    items: Vec<Item>,
    comment: Vec<u8>,
}

impl ZipBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// DEFLATE-compressed file entry.
    pub fn file(self, name: &str, content: &[u8]) -> Self {
        self.push(name, content, Method::Deflate, false)
    }

    /// STORED file entry.
    pub fn stored(self, name: &str, content: &[u8]) -> Self {
        self.push(name, content, Method::Stored, false)
    }

    /// Directory marker; `name` must end in `/`.
    pub fn dir(self, name: &str) -> Self {
        assert!(name.ends_with('/'));
        self.push(name, b"", Method::Stored, false)
    }

    /// File entry whose recorded CRC-32 does not match its content.
    pub fn corrupt(self, name: &str, content: &[u8]) -> Self {
        self.push(name, content, Method::Deflate, true)
    }

    /// DEFLATE entry whose central directory header claims the given
    /// uncompressed and compressed sizes through a ZIP64 extra field.
    pub fn zip64_sizes(
        mut self,
        name: &str,
        content: &[u8],
        uncompressed: u64,
        compressed: u64,
    ) -> Self {
        self = self.push(name, content, Method::Deflate, false);
        if let Some(item) = self.items.last_mut() {
            item.zip64_sizes = Some((uncompressed, compressed));
        }
        self
    }

    pub fn comment(mut self, comment: &str) -> Self {
        self.comment = comment.as_bytes().to_vec();
        self
    }

    fn push(mut self, name: &str, content: &[u8], method: Method, bad_crc: bool) -> Self {
        self.items.push(Item {
            name: name.to_string(),
            content: content.to_vec(),
            method,
            bad_crc,
            zip64_sizes: None,
        });
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        let mut central = Vec::new();

        for item in &self.items {
            let mut crc = flate2::Crc::new();
            crc.update(&item.content);
            let crc = if item.bad_crc { crc.sum() ^ 0xdead_beef } else { crc.sum() };

            let data = match item.method {
                Method::Stored => item.content.clone(),
                Method::Deflate => {
                    let mut enc = DeflateEncoder::new(Vec::new(), Compression::default());
                    enc.write_all(&item.content).unwrap();
                    enc.finish().unwrap()
                }
            };
            let method = match item.method {
                Method::Stored => 0u16,
                Method::Deflate => 8u16,
            };
            let offset = out.len() as u32;
            let name = item.name.as_bytes();

            out.write_all(b"PK\x03\x04").unwrap();
            out.write_u16::<LittleEndian>(20).unwrap();
            out.write_u16::<LittleEndian>(0).unwrap();
            out.write_u16::<LittleEndian>(method).unwrap();
            out.write_u16::<LittleEndian>(0).unwrap();
            out.write_u16::<LittleEndian>(0x21).unwrap();
            out.write_u32::<LittleEndian>(crc).unwrap();
            out.write_u32::<LittleEndian>(data.len() as u32).unwrap();
            out.write_u32::<LittleEndian>(item.content.len() as u32).unwrap();
            out.write_u16::<LittleEndian>(name.len() as u16).unwrap();
            out.write_u16::<LittleEndian>(0).unwrap();
            out.write_all(name).unwrap();
            out.write_all(&data).unwrap();

            central.write_all(b"PK\x01\x02").unwrap();
            central.write_u16::<LittleEndian>(20).unwrap();
            central.write_u16::<LittleEndian>(20).unwrap();
            central.write_u16::<LittleEndian>(0).unwrap();
            central.write_u16::<LittleEndian>(method).unwrap();
            central.write_u16::<LittleEndian>(0).unwrap();
            central.write_u16::<LittleEndian>(0x21).unwrap();
            let mut extra = Vec::new();
            let (cd_compressed, cd_uncompressed) = match item.zip64_sizes {
                Some((uncompressed, compressed)) => {
                    extra.write_u16::<LittleEndian>(0x0001).unwrap();
                    extra.write_u16::<LittleEndian>(16).unwrap();
                    extra.write_u64::<LittleEndian>(uncompressed).unwrap();
                    extra.write_u64::<LittleEndian>(compressed).unwrap();
                    (u32::MAX, u32::MAX)
                }
                None => (data.len() as u32, item.content.len() as u32),
            };

            central.write_u32::<LittleEndian>(crc).unwrap();
            central.write_u32::<LittleEndian>(cd_compressed).unwrap();
            central.write_u32::<LittleEndian>(cd_uncompressed).unwrap();
            central.write_u16::<LittleEndian>(name.len() as u16).unwrap();
            central.write_u16::<LittleEndian>(extra.len() as u16).unwrap();
            central.write_u16::<LittleEndian>(0).unwrap();
            central.write_u16::<LittleEndian>(0).unwrap();
            central.write_u16::<LittleEndian>(0).unwrap();
            central.write_u32::<LittleEndian>(0).unwrap();
            central.write_u32::<LittleEndian>(offset).unwrap();
            central.write_all(name).unwrap();
            central.write_all(&extra).unwrap();
        }

        let cd_offset = out.len() as u32;
        out.write_all(&central).unwrap();

        out.write_all(b"PK\x05\x06").unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(self.items.len() as u16).unwrap();
        out.write_u16::<LittleEndian>(self.items.len() as u16).unwrap();
        out.write_u32::<LittleEndian>(central.len() as u32).unwrap();
        out.write_u32::<LittleEndian>(cd_offset).unwrap();
        out.write_u16::<LittleEndian>(self.comment.len() as u16).unwrap();
        out.write_all(&self.comment).unwrap();
        out
    }

    pub fn write_to(&self, path: &Path) {
        std::fs::write(path, self.build()).unwrap();
    }
}

/// Snapshot of every file under `root` as (relative path, content), sorted.
pub fn snapshot(root: &Path) -> Vec<(String, Vec<u8>)> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for item in std::fs::read_dir(&dir).unwrap() {
            let path = item.unwrap().path();
            if path.is_dir() {
                pending.push(path);
            } else {
                let rel = path.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/");
                files.push((rel, std::fs::read(&path).unwrap()));
            }
        }
    }
    files.sort();
    files
}
