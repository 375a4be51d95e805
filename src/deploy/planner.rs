//! Decide, per archive entry, whether the destination is already current.

use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{DeployError, read_err};
use crate::io::ReadAt;
use crate::zip::{Archive, ArchiveEntry};

use super::compare::ChangeDetector;

/// An entry selected for extraction, with its validated relative path.
#[derive(Debug, Clone)]
pub struct PlannedEntry {
    pub entry: ArchiveEntry,
    pub relative_path: PathBuf,
}

/// Entries to extract, in archive order.
#[derive(Debug, Default)]
pub struct ChangeSet {
    entries: Vec<PlannedEntry>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlannedEntry> {
        self.entries.iter()
    }

    /// Stored names of the selected entries.
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|p| p.entry.name().to_string()).collect()
    }
}

/// What exists at an entry's destination path.
enum Existing {
    Nothing,
    Directory,
    File,
    /// A non-directory occupies one of the path's ancestors.
    Blocked,
}

async fn probe(path: &Path) -> Result<Existing, DeployError> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_dir() => Ok(Existing::Directory),
        Ok(_) => Ok(Existing::File),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Existing::Nothing),
        Err(e) if e.kind() == io::ErrorKind::NotADirectory => Ok(Existing::Blocked),
        Err(e) => Err(read_err(path.display(), e)),
    }
}

/// Walk every entry of `archive` and collect those the destination lacks or
/// holds with different content.
///
/// A directory entry over an existing file, or a file entry over an existing
/// directory, fails the plan with [`DeployError::Conflict`]. So does an entry
/// nested under a path the destination holds as a file.
pub async fn plan<R: ReadAt>(
    archive: &Archive<R>,
    destination: &Path,
    detector: &dyn ChangeDetector,
) -> Result<ChangeSet, DeployError> {
    let mut change_set = ChangeSet::default();

    for entry in archive.entries() {
        let relative_path = entry.relative_path().map_err(DeployError::InvalidEntry)?;
        if relative_path.as_os_str().is_empty() {
            debug!("skip {}: destination root", entry.name());
            continue;
        }
        let target = destination.join(&relative_path);

        let extract = match (entry.is_dir(), probe(&target).await?) {
            (true, Existing::Directory) => {
                debug!("skip {}: directory exists", entry.name());
                false
            }
            (true, Existing::File) | (false, Existing::Directory) | (_, Existing::Blocked) => {
                return Err(DeployError::Conflict {
                    entry: entry.name().to_string(),
                    path: target,
                });
            }
            (_, Existing::Nothing) => {
                debug!("extract {}: not in destination", entry.name());
                true
            }
            (false, Existing::File) => {
                let mut content = archive
                    .open_entry(entry)
                    .await
                    .map_err(|e| read_err(entry.name(), e))?;
                if detector.is_current(entry, &mut content, &target).await? {
                    debug!("skip {}: content unchanged", entry.name());
                    false
                } else {
                    debug!("extract {}: content differs", entry.name());
                    true
                }
            }
        };

        if extract {
            change_set.entries.push(PlannedEntry {
                entry: entry.clone(),
                relative_path,
            });
        }
    }

    Ok(change_set)
}
