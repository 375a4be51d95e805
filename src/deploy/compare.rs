//! Pluggable "is the destination already current?" checks.

use std::path::Path;

use async_trait::async_trait;
use clap::ValueEnum;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{DeployError, read_err};
use crate::zip::ArchiveEntry;

use super::hasher;

const CHUNK: usize = 64 * 1024;

/// Decides whether an existing destination file already holds an entry's content.
#[async_trait]
pub trait ChangeDetector: Send + Sync {
    /// `content` is the entry's uncompressed stream; it is read at most once.
    async fn is_current(
        &self,
        entry: &ArchiveEntry,
        content: &mut (dyn AsyncRead + Unpin + Send),
        destination: &Path,
    ) -> Result<bool, DeployError>;
}

/// Compare MD5 digests of both sides.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContentHashDetector;

#[async_trait]
impl ChangeDetector for ContentHashDetector {
    async fn is_current(
        &self,
        entry: &ArchiveEntry,
        content: &mut (dyn AsyncRead + Unpin + Send),
        destination: &Path,
    ) -> Result<bool, DeployError> {
        let archived = hasher::digest_reader(content, entry.name()).await?;
        let on_disk = hasher::digest_file(destination).await?;
        Ok(archived == on_disk)
    }
}

/// Compare sizes, then the bytes themselves.
#[derive(Debug, Default, Clone, Copy)]
pub struct ByteCompareDetector;

#[async_trait]
impl ChangeDetector for ByteCompareDetector {
    async fn is_current(
        &self,
        entry: &ArchiveEntry,
        content: &mut (dyn AsyncRead + Unpin + Send),
        destination: &Path,
    ) -> Result<bool, DeployError> {
        let subject = destination.display().to_string();
        let mut file = tokio::fs::File::open(destination)
            .await
            .map_err(|e| read_err(&subject, e))?;
        let len = file
            .metadata()
            .await
            .map_err(|e| read_err(&subject, e))?
            .len();
        if len != entry.uncompressed_size() {
            return Ok(false);
        }

        let mut left = vec![0u8; CHUNK];
        let mut right = vec![0u8; CHUNK];
        loop {
            let a = fill(&mut *content, &mut left)
                .await
                .map_err(|e| read_err(entry.name(), e))?;
            let b = fill(&mut file, &mut right)
                .await
                .map_err(|e| read_err(&subject, e))?;
            if a != b || left[..a] != right[..b] {
                return Ok(false);
            }
            if a == 0 {
                return Ok(true);
            }
        }
    }
}

/// Read until `buf` is full or the stream ends.
async fn fill<R>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

/// Change detection strategy, selectable from the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum CompareStrategy {
    /// MD5 digest of archive entry and destination file
    #[default]
    Hash,
    /// Size check followed by a full byte comparison
    Bytes,
}

impl CompareStrategy {
    pub fn detector(self) -> Box<dyn ChangeDetector> {
        match self {
            CompareStrategy::Hash => Box::new(ContentHashDetector),
            CompareStrategy::Bytes => Box::new(ByteCompareDetector),
        }
    }
}
