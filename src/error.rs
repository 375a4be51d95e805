//! Error types for archive reading and deployment runs.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the ZIP reader.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The bytes do not form a ZIP structure we can parse.
    #[error("malformed archive: {0}")]
    Malformed(&'static str),

    #[error("{name}: {reason}")]
    Unsupported { name: String, reason: String },

    /// Decompressed content does not match the size or CRC-32 in the directory.
    #[error("{name}: {reason}")]
    Corrupt { name: String, reason: String },

    /// The entry name would resolve outside the extraction root.
    #[error("unsafe entry path: {0}")]
    UnsafePath(String),
}

/// Coarse classification of a failed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad arguments or an unusable archive; nothing was touched.
    Input,
    /// Content could not be read while planning; nothing was touched.
    Read,
    /// Staging failed; the destination is unchanged.
    Extract,
    /// The overlay onto the destination failed part way.
    Merge,
}

impl ErrorKind {
    /// Process exit code reported by the CLI.
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::Input => 2,
            ErrorKind::Read => 3,
            ErrorKind::Extract => 4,
            ErrorKind::Merge => 5,
        }
    }
}

/// All errors that can end a deployment run.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("No files specified")]
    NoSource,

    #[error("Source does not exist")]
    SourceNotFound(PathBuf),

    #[error("cannot open archive {source_name}: {source}")]
    OpenArchive {
        source_name: String,
        #[source]
        source: ArchiveError,
    },

    #[error("cannot prepare destination {path}: {source}")]
    Destination {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The entry cannot be mapped onto the destination.
    #[error(transparent)]
    InvalidEntry(ArchiveError),

    /// A directory entry collides with an existing file or vice versa.
    #[error("{entry}: destination {path} has the wrong type")]
    Conflict { entry: String, path: PathBuf },

    #[error("cannot read {subject}: {source}")]
    Read {
        subject: String,
        #[source]
        source: ArchiveError,
    },

    #[error("cannot create staging directory: {source}")]
    Staging {
        #[source]
        source: io::Error,
    },

    #[error("cannot extract {entry}: {source}")]
    Extract {
        entry: String,
        #[source]
        source: ArchiveError,
    },

    #[error("cannot merge into {path}: {source}")]
    Merge {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl DeployError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DeployError::NoSource
            | DeployError::SourceNotFound(_)
            | DeployError::OpenArchive { .. }
            | DeployError::Destination { .. }
            | DeployError::InvalidEntry(_)
            | DeployError::Conflict { .. } => ErrorKind::Input,
            DeployError::Read { .. } => ErrorKind::Read,
            DeployError::Staging { .. } | DeployError::Extract { .. } => ErrorKind::Extract,
            DeployError::Merge { .. } => ErrorKind::Merge,
        }
    }
}

/// Convenience constructor for [`DeployError::Read`].
pub(crate) fn read_err(
    subject: impl std::fmt::Display,
    source: impl Into<ArchiveError>,
) -> DeployError {
    DeployError::Read {
        subject: subject.to_string(),
        source: source.into(),
    }
}

/// Convenience constructor for [`DeployError::Merge`].
pub(crate) fn merge_err(path: impl Into<PathBuf>, source: io::Error) -> DeployError {
    DeployError::Merge {
        path: path.into(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_messages_match_contract() {
        assert_eq!(DeployError::NoSource.to_string(), "No files specified");
        assert_eq!(
            DeployError::SourceNotFound(PathBuf::from("x.zip")).to_string(),
            "Source does not exist"
        );
    }

    #[test]
    fn kinds_map_to_distinct_exit_codes() {
        let merge = merge_err("a", io::Error::other("boom"));
        assert_eq!(merge.kind(), ErrorKind::Merge);
        assert_eq!(merge.kind().exit_code(), 5);

        let read = read_err("a.txt", io::Error::other("boom"));
        assert_eq!(read.kind(), ErrorKind::Read);
        assert_ne!(read.kind().exit_code(), ErrorKind::Extract.exit_code());
    }
}
