use std::path::{Component, Path, PathBuf};

use crate::error::ArchiveError;

use super::structures::CompressionMethod;

/// One item of a ZIP archive: a file, or a directory marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub(crate) name: String,
    pub(crate) compression: CompressionMethod,
    pub(crate) flags: u16,
    pub(crate) compressed_size: u64,
    pub(crate) uncompressed_size: u64,
    pub(crate) crc32: u32,
    pub(crate) lfh_offset: u64,
}

impl ArchiveEntry {
    /// Path as stored in the archive, `/`-separated.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// An entry is a directory marker when its base name is empty.
    pub fn is_dir(&self) -> bool {
        self.name.ends_with('/')
    }

    pub fn compression(&self) -> CompressionMethod {
        self.compression
    }

    pub fn compressed_size(&self) -> u64 {
        self.compressed_size
    }

    pub fn uncompressed_size(&self) -> u64 {
        self.uncompressed_size
    }

    pub fn crc32(&self) -> u32 {
        self.crc32
    }

    /// Map the stored name onto a relative platform path.
    ///
    /// Names that are absolute or climb out with `..` are rejected, so the
    /// result is always safe to join onto an extraction root. A directory
    /// marker such as `./` maps to the empty path, the root itself.
    pub fn relative_path(&self) -> Result<PathBuf, ArchiveError> {
        let unsafe_path = || ArchiveError::UnsafePath(self.name.clone());

        if self.name.starts_with('/') || self.name.starts_with('\\') {
            return Err(unsafe_path());
        }

        let mut path = PathBuf::new();
        for part in self.name.split('/') {
            if part.is_empty() || part == "." {
                continue;
            }
            let mut components = Path::new(part).components();
            match (components.next(), components.next()) {
                (Some(Component::Normal(c)), None) => path.push(c),
                _ => return Err(unsafe_path()),
            }
        }

        if path.as_os_str().is_empty() && !self.is_dir() {
            return Err(unsafe_path());
        }
        Ok(path)
    }
}
