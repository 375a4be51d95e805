//! One-directional overlay of the staging tree onto the destination.
//!
//! Files in the staging tree overwrite their destination counterparts;
//! destination content without a staged counterpart is never touched.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use crate::error::{DeployError, merge_err};

/// Counts from a completed overlay.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MergeStats {
    pub files_copied: usize,
    pub directories_created: usize,
}

/// Copy the tree under `source` onto `target`.
///
/// Directories are walked depth-first from an explicit worklist; each level
/// creates its subdirectories before copying its files.
pub async fn merge_tree(source: &Path, target: &Path) -> Result<MergeStats, DeployError> {
    let mut stats = MergeStats::default();
    let mut pending: Vec<(PathBuf, PathBuf)> = vec![(source.to_path_buf(), target.to_path_buf())];

    while let Some((src_dir, dst_dir)) = pending.pop() {
        let mut dirs = Vec::new();
        let mut files = Vec::new();

        let mut read_dir = fs::read_dir(&src_dir)
            .await
            .map_err(|e| merge_err(&src_dir, e))?;
        while let Some(item) = read_dir
            .next_entry()
            .await
            .map_err(|e| merge_err(&src_dir, e))?
        {
            let file_type = item.file_type().await.map_err(|e| merge_err(item.path(), e))?;
            if file_type.is_dir() {
                dirs.push(item.file_name());
            } else {
                files.push(item.file_name());
            }
        }

        for name in dirs {
            let dst = dst_dir.join(&name);
            if ensure_dir(&dst).await? {
                stats.directories_created += 1;
            }
            pending.push((src_dir.join(&name), dst));
        }

        for name in files {
            let dst = dst_dir.join(&name);
            fs::copy(src_dir.join(&name), &dst)
                .await
                .map_err(|e| merge_err(&dst, e))?;
            stats.files_copied += 1;
        }
    }

    debug!(
        "merged {} files, created {} directories",
        stats.files_copied, stats.directories_created
    );
    Ok(stats)
}

/// Create `path` if absent. Returns whether it was created.
///
/// An existing directory is fine; an existing non-directory is an error.
async fn ensure_dir(path: &Path) -> Result<bool, DeployError> {
    match fs::create_dir(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            let meta = fs::metadata(path).await.map_err(|e| merge_err(path, e))?;
            if meta.is_dir() {
                Ok(false)
            } else {
                Err(merge_err(
                    path,
                    io::Error::new(io::ErrorKind::AlreadyExists, "not a directory"),
                ))
            }
        }
        Err(e) => Err(merge_err(path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as stdfs;

    #[tokio::test]
    async fn overlays_without_deleting() {
        let staged = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();

        stdfs::create_dir_all(staged.path().join("lib/nested")).unwrap();
        stdfs::write(staged.path().join("lib/nested/a.txt"), b"new a").unwrap();
        stdfs::write(staged.path().join("top.txt"), b"new top").unwrap();

        stdfs::create_dir_all(dest.path().join("lib")).unwrap();
        stdfs::write(dest.path().join("top.txt"), b"old top").unwrap();
        stdfs::write(dest.path().join("lib/keep.txt"), b"keep").unwrap();

        let stats = merge_tree(staged.path(), dest.path()).await.unwrap();

        assert_eq!(
            stats,
            MergeStats {
                files_copied: 2,
                directories_created: 1,
            }
        );
        assert_eq!(stdfs::read(dest.path().join("top.txt")).unwrap(), b"new top");
        assert_eq!(
            stdfs::read(dest.path().join("lib/nested/a.txt")).unwrap(),
            b"new a"
        );
        assert_eq!(stdfs::read(dest.path().join("lib/keep.txt")).unwrap(), b"keep");
    }

    #[tokio::test]
    async fn file_blocking_directory_is_merge_error() {
        let staged = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();

        stdfs::create_dir_all(staged.path().join("conf")).unwrap();
        stdfs::write(staged.path().join("conf/app.toml"), b"x").unwrap();
        stdfs::write(dest.path().join("conf"), b"i am a file").unwrap();

        let err = merge_tree(staged.path(), dest.path()).await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Merge);
        assert_eq!(stdfs::read(dest.path().join("conf")).unwrap(), b"i am a file");
    }
}
