//! Sequencing of one deployment run: plan, stage, merge, clean up.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::DeployOptions;
use crate::error::DeployError;
use crate::io::{LocalFileReader, ReadAt};
use crate::zip::Archive;

use super::merge::merge_tree;
use super::planner::plan;
use super::staging::{self, StagingRoot};

/// Outcome of a successful run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeployReport {
    /// Stored names of the entries that were extracted, in archive order.
    pub extracted: Vec<String>,
    pub files_copied: usize,
    pub directories_created: usize,
}

impl DeployReport {
    /// True when the destination already matched the archive.
    pub fn is_up_to_date(&self) -> bool {
        self.extracted.is_empty()
    }
}

/// Deploy the archive at `archive_path` onto the configured destination.
pub async fn deploy_file(
    archive_path: &Path,
    options: &DeployOptions,
) -> Result<DeployReport, DeployError> {
    if !archive_path.is_file() {
        return Err(DeployError::SourceNotFound(archive_path.to_path_buf()));
    }
    prepare_destination(options.destination()).await?;

    let source_name = archive_path.display().to_string();
    let reader = LocalFileReader::open(archive_path).map_err(|e| DeployError::OpenArchive {
        source_name: source_name.clone(),
        source: e.into(),
    })?;
    run(&source_name, Arc::new(reader), options).await
}

/// Deploy an archive read from an already opened source.
pub async fn deploy<R: ReadAt>(
    source_name: &str,
    reader: Arc<R>,
    options: &DeployOptions,
) -> Result<DeployReport, DeployError> {
    prepare_destination(options.destination()).await?;
    run(source_name, reader, options).await
}

async fn prepare_destination(destination: &Path) -> Result<(), DeployError> {
    tokio::fs::create_dir_all(destination)
        .await
        .map_err(|source| DeployError::Destination {
            path: destination.to_path_buf(),
            source,
        })
}

async fn run<R: ReadAt>(
    source_name: &str,
    reader: Arc<R>,
    options: &DeployOptions,
) -> Result<DeployReport, DeployError> {
    let archive = Archive::open(reader)
        .await
        .map_err(|source| DeployError::OpenArchive {
            source_name: source_name.to_string(),
            source,
        })?;
    debug!("{}: {} entries", source_name, archive.entries().len());

    let detector = options.compare_strategy().detector();
    let change_set = plan(&archive, options.destination(), detector.as_ref()).await?;
    if change_set.is_empty() {
        debug!("destination is up to date");
        return Ok(DeployReport::default());
    }

    let root = StagingRoot::create(options.staging_parent_dir())?;
    if let Err(e) = staging::extract(&archive, &change_set, root.path()).await {
        cleanup(root).await;
        return Err(e);
    }
    drop(archive);

    info!("Copying from temp dir to destination...");
    let merged = merge_tree(root.path(), options.destination()).await;
    cleanup(root).await;
    let stats = merged?;

    info!("Done.");
    Ok(DeployReport {
        extracted: change_set.names(),
        files_copied: stats.files_copied,
        directories_created: stats.directories_created,
    })
}

/// Best effort: a failure here is logged and never replaces the run's outcome.
async fn cleanup(root: StagingRoot) {
    let path = root.path().to_path_buf();
    if let Err(e) = root.remove().await {
        warn!(
            "failed to remove staging directory {}: {}",
            path.display(),
            e
        );
    }
}
