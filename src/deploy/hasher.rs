//! Content digests for change detection.
//!
//! MD5 is enough here: equal digests are taken as equal content for
//! deployment purposes, there is no adversary choosing inputs.

use std::fmt;
use std::path::Path;

use md5::{Digest as _, Md5};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{DeployError, read_err};

const BUF_SIZE: usize = 64 * 1024;

/// Fixed-length content digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest([u8; 16]);

impl Digest {
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Digest a stream, consuming it to end of input.
///
/// `subject` names the stream in the error if it cannot be read fully.
pub async fn digest_reader<R>(reader: &mut R, subject: &str) -> Result<Digest, DeployError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut hasher = Md5::new();
    let mut buf = vec![0u8; BUF_SIZE];
    loop {
        let n = reader
            .read(&mut buf)
            .await
            .map_err(|e| read_err(subject, e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    let mut out = [0u8; 16];
    out.copy_from_slice(&hasher.finalize());
    Ok(Digest(out))
}

/// Digest a file on disk.
pub async fn digest_file(path: &Path) -> Result<Digest, DeployError> {
    let subject = path.display().to_string();
    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(|e| read_err(&subject, e))?;
    digest_reader(&mut file, &subject).await
}
