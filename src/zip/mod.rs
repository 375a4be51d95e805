//! ZIP archive reading.
//!
//! - `structures`: fixed-size records (EOCD, ZIP64 locator and record)
//! - `parser`: central directory parsing over a [`ReadAt`](crate::io::ReadAt) source
//! - `entry`: [`ArchiveEntry`], one logical item of the archive
//! - `archive`: [`Archive`], which opens entry content as a stream
//!
//! Supports STORED and DEFLATE entries and ZIP64 directories. Encrypted and
//! multi-disk archives are rejected.

mod archive;
mod entry;
mod parser;
mod structures;

pub use archive::{Archive, EntryReader};
pub use entry::ArchiveEntry;
pub use structures::CompressionMethod;
