use std::io::{Cursor, Read};
use std::sync::Arc;

use flate2::Crc;
use flate2::read::DeflateDecoder;

use crate::error::ArchiveError;
use crate::io::ReadAt;

use super::entry::ArchiveEntry;
use super::parser::ZipParser;
use super::structures::{CompressionMethod, FLAG_ENCRYPTED};

/// Uncompressed content of one entry, readable as a stream.
pub type EntryReader = Cursor<Vec<u8>>;

/// A ZIP archive opened read-only over a [`ReadAt`] source.
///
/// The central directory is parsed once on [`Archive::open`]; entry content
/// is fetched on demand and can be opened any number of times.
pub struct Archive<R: ReadAt> {
    parser: ZipParser<R>,
    entries: Vec<ArchiveEntry>,
}

impl<R: ReadAt> Archive<R> {
    pub async fn open(reader: Arc<R>) -> Result<Self, ArchiveError> {
        let parser = ZipParser::new(reader);
        let entries = parser.entries().await?;
        Ok(Self { parser, entries })
    }

    /// Entries in archive order.
    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    /// Open an entry's uncompressed bytes.
    ///
    /// The result is checked against the declared size and CRC-32 before it
    /// is handed out.
    pub async fn open_entry(&self, entry: &ArchiveEntry) -> Result<EntryReader, ArchiveError> {
        if entry.flags & FLAG_ENCRYPTED != 0 {
            return Err(ArchiveError::Unsupported {
                name: entry.name.clone(),
                reason: "encrypted entries are not supported".to_string(),
            });
        }

        // Sizes come from the central directory and are untrusted until the
        // data is known to fit inside the archive.
        let data_offset = self.parser.data_offset(entry).await?;
        let in_bounds = data_offset
            .checked_add(entry.compressed_size)
            .is_some_and(|end| end <= self.parser.reader().size());
        if !in_bounds {
            return Err(corrupt(
                entry,
                "compressed data extends past end of archive".to_string(),
            ));
        }

        let mut raw = vec![0u8; usize_len(entry, entry.compressed_size)?];
        self.parser
            .reader()
            .read_exact_at(data_offset, &mut raw)
            .await?;

        let content = match entry.compression {
            CompressionMethod::Stored => raw,
            CompressionMethod::Deflate => {
                // One byte past the declared size is enough for `verify` to
                // see a mismatch without inflating an unbounded stream.
                let mut out = Vec::new();
                DeflateDecoder::new(raw.as_slice())
                    .take(entry.uncompressed_size.saturating_add(1))
                    .read_to_end(&mut out)
                    .map_err(|e| corrupt(entry, format!("inflate failed: {e}")))?;
                out
            }
            CompressionMethod::Other(method) => {
                return Err(ArchiveError::Unsupported {
                    name: entry.name.clone(),
                    reason: format!("compression method {method} is not supported"),
                });
            }
        };

        verify(entry, &content)?;
        Ok(Cursor::new(content))
    }
}

fn verify(entry: &ArchiveEntry, content: &[u8]) -> Result<(), ArchiveError> {
    if content.len() as u64 != entry.uncompressed_size {
        return Err(corrupt(
            entry,
            format!(
                "size mismatch: expected {} bytes, got {}",
                entry.uncompressed_size,
                content.len()
            ),
        ));
    }

    let mut crc = Crc::new();
    crc.update(content);
    if crc.sum() != entry.crc32 {
        return Err(corrupt(
            entry,
            format!("CRC-32 mismatch: expected {:08x}, got {:08x}", entry.crc32, crc.sum()),
        ));
    }
    Ok(())
}

fn corrupt(entry: &ArchiveEntry, reason: String) -> ArchiveError {
    ArchiveError::Corrupt {
        name: entry.name.clone(),
        reason,
    }
}

fn usize_len(entry: &ArchiveEntry, len: u64) -> Result<usize, ArchiveError> {
    usize::try_from(len).map_err(|_| ArchiveError::Unsupported {
        name: entry.name.clone(),
        reason: "entry too large for this platform".to_string(),
    })
}
