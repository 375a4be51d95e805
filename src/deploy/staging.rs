//! Materialize a change set under a private, per-run directory.

use std::io;
use std::path::Path;

use tempfile::TempDir;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{ArchiveError, DeployError};
use crate::io::ReadAt;
use crate::zip::Archive;

use super::planner::{ChangeSet, PlannedEntry};

const PREFIX: &str = ".zipdeploy-";

/// Randomly named staging directory owned by one run.
#[derive(Debug)]
pub struct StagingRoot {
    dir: TempDir,
}

impl StagingRoot {
    /// Create a fresh directory under `parent`, or the system temp directory.
    pub fn create(parent: Option<&Path>) -> Result<Self, DeployError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(PREFIX);
        let dir = match parent {
            Some(parent) => builder.tempdir_in(parent),
            None => builder.tempdir(),
        }
        .map_err(|source| DeployError::Staging { source })?;

        debug!("staging root {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Delete the directory tree, reporting failure instead of ignoring it.
    ///
    /// The removal runs on the blocking pool.
    pub async fn remove(self) -> io::Result<()> {
        let dir = self.dir;
        tokio::task::spawn_blocking(move || dir.close())
            .await
            .map_err(io::Error::other)?
    }
}

/// Write every change set member under `root`, preserving relative paths.
pub async fn extract<R: ReadAt>(
    archive: &Archive<R>,
    change_set: &ChangeSet,
    root: &Path,
) -> Result<(), DeployError> {
    for planned in change_set.iter() {
        stage_entry(archive, planned, root)
            .await
            .map_err(|source| DeployError::Extract {
                entry: planned.entry.name().to_string(),
                source,
            })?;
    }
    Ok(())
}

async fn stage_entry<R: ReadAt>(
    archive: &Archive<R>,
    planned: &PlannedEntry,
    root: &Path,
) -> Result<(), ArchiveError> {
    let target = root.join(&planned.relative_path);

    if planned.entry.is_dir() {
        fs::create_dir_all(&target).await?;
        return Ok(());
    }

    info!("Extracting: {}", planned.entry.name());

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).await?;
    }

    let mut content = archive.open_entry(&planned.entry).await?;
    let mut file = fs::File::create(&target).await?;
    tokio::io::copy(&mut content, &mut file).await?;
    file.flush().await?;
    Ok(())
}
